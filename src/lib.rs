//! Synthesizes PAL, PAL-M and NTSC composite signals, sampled at four times the subcarrier, from
//! still frames, and writes them as raw TBC files. Test signals, LaserDisc VBI frame numbers and
//! VITC timecode can be inserted in the vertical interval.

pub mod biphase;
pub mod burst;
pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
pub mod filter;
pub mod frame_buffer;
pub mod line;
pub mod manchester;
pub mod metadata;
pub mod ntsc;
pub mod pal;
pub mod params;
pub mod project;
pub mod source;
pub mod standard;
pub mod tbc;
pub mod timecode;
pub mod types;
pub mod vbi;
pub mod vitc;
pub mod vits;

pub use config::ProjectConfig;
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use field::{Field, Frame};
pub use frame_buffer::{FrameBuffer, PixelFormat};
pub use line::EncoderOptions;
pub use params::{VideoParameters, VideoSystem};
pub use project::{EncodeSummary, ProjectRunner};
