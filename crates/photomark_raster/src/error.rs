use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Pixel buffer does not match canvas size {width}x{height}")]
    BufferMismatch { width: u32, height: u32 },

    #[error("Failed to parse font: {0}")]
    InvalidFont(String),

    #[error("Failed to read font file: {0}")]
    FontIo(#[from] std::io::Error),

    #[error("No usable font found")]
    NoFont,
}

pub type Result<T> = std::result::Result<T, RasterError>;
