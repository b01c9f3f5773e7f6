mod encoder;
mod vits;

pub use encoder::*;
pub use vits::*;
