//! Error types for the encoder.

use thiserror::Error;

use crate::frame_buffer::PixelFormat;

/// Result type for encoder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or encoding a signal.
#[derive(Error, Debug)]
pub enum Error {
    /// The source frame is not laid out the way the line encoders read it.
    #[error("unsupported pixel format {found:?}, expected {expected:?}")]
    UnsupportedPixelFormat {
        /// The format of the frame buffer that was supplied.
        found: PixelFormat,
        /// The format the encoder requires.
        expected: PixelFormat,
    },

    /// The source frame dimensions don't match its data, or are empty.
    #[error("invalid frame size {width}x{height}: {message}")]
    FrameSize {
        width: usize,
        height: usize,
        message: String,
    },

    /// A numeric input outside the range the encoding can represent.
    #[error("{what} out of range: {value}")]
    OutOfRange {
        /// What the value is (chapter, picture number, ...).
        what: &'static str,
        value: i64,
    },

    /// A timecode string that could not be parsed.
    #[error("invalid timecode '{0}', expected HH:MM:SS:FF")]
    InvalidTimecode(String),

    /// A project configuration that is well-formed TOML but makes no sense.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure decoding a source image.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Failure reading the project file or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure parsing the project file.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Failure writing the metadata database.
    #[error("metadata database error: {0}")]
    Metadata(#[from] rusqlite::Error),
}

impl Error {
    /// Create an out-of-range error.
    pub fn out_of_range(what: &'static str, value: i64) -> Self {
        Self::OutOfRange { what, value }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a frame size error.
    pub fn frame_size(width: usize, height: usize, message: impl Into<String>) -> Self {
        Self::FrameSize {
            width,
            height,
            message: message.into(),
        }
    }
}
