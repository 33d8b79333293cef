use crate::{compression, DecodeOptions, DecompressError};
use image::RgbaImage;
use thiserror::Error;

mod assemble;
mod header;

pub use assemble::decode_raw;
pub use header::{
    HeaderError, SizeMismatch, TextureFormat, TextureInfo, TextureType, DEFAULT_MAGIC, HEADER_SIZE,
};

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to decompress texture")]
    Decompress(#[from] DecompressError),
    #[error("Invalid texture info")]
    Format(#[from] HeaderError),
    #[error(transparent)]
    SizeMismatch(#[from] SizeMismatch),
    #[error("Unsupported texture format {0:#x}")]
    UnsupportedFormat(u32),
    #[error("Texture dimensions {width}x{height} do not form a valid ETC1 tile grid")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Texture data holds {actual} bytes, {expected} needed")]
    InsufficientData { expected: usize, actual: usize },
}

/// A decoded archive entry.
#[derive(Debug, Clone)]
pub struct DecodedTexture {
    pub info: TextureInfo,
    pub image: RgbaImage,
    /// Set when the declared data size was off and the entry was decoded anyway.
    pub size_mismatch: Option<SizeMismatch>,
}

impl DecodedTexture {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decompress and decode one compressed archive entry.
pub fn decode_entry(
    payload: &[u8],
    options: &DecodeOptions,
) -> Result<DecodedTexture, TextureError> {
    let data = compression::decompress(payload)?;
    decode_texture(&data, options)
}

/// Decompress headerless block data, then decode it like [`decode_raw`].
pub fn decode_raw_compressed(
    payload: &[u8],
    width: u32,
    height: u32,
    has_alpha: bool,
) -> Result<RgbaImage, TextureError> {
    let data = compression::decompress(payload)?;
    decode_raw(&data, width, height, has_alpha)
}

/// Decode an already decompressed entry, texture info followed by block data.
pub fn decode_texture(
    data: &[u8],
    options: &DecodeOptions,
) -> Result<DecodedTexture, TextureError> {
    let info = TextureInfo::parse(data, options.expected_magic())?;

    let size_mismatch = match info.check_data_size(data.len()) {
        Ok(()) => None,
        Err(mismatch) if options.strict_size => return Err(mismatch.into()),
        Err(mismatch) => {
            log::warn!("{}, decoding anyway", mismatch);
            Some(mismatch)
        }
    };

    let has_alpha = match info.format {
        TextureFormat::Etc1 => false,
        TextureFormat::Etc1A4 => true,
        TextureFormat::Unsupported(code) => return Err(TextureError::UnsupportedFormat(code)),
    };

    log::debug!(
        "Decoding {:?} texture {}x{} ({} bytes)",
        info.format,
        info.width,
        info.height,
        data.len() - HEADER_SIZE
    );

    let image = decode_raw(
        &data[HEADER_SIZE..],
        info.width.into(),
        info.height.into(),
        has_alpha,
    )?;

    Ok(DecodedTexture {
        info,
        image,
        size_mismatch,
    })
}
