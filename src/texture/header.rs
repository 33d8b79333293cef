use std::fmt;
use thiserror::Error;

/// Size of the texture info record in front of every texture.
pub const HEADER_SIZE: usize = 36;

/// Tag found in the first four bytes of the texture info.
pub const DEFAULT_MAGIC: [u8; 4] = *b"CTPK";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Texture info is {0} bytes long, expected at least {min}", min = HEADER_SIZE)]
    Truncated(usize),
    #[error("Texture info has magic {found:02x?}, expected {expected:02x?}")]
    InvalidMagic { found: [u8; 4], expected: [u8; 4] },
}

/// Declared texture data size does not match the bytes following the header.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Texture info declares {declared} bytes of texture data, payload holds {actual}")]
pub struct SizeMismatch {
    pub declared: usize,
    pub actual: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Etc1,
    Etc1A4,
    Unsupported(u32),
}

impl TextureFormat {
    pub const fn from_code(code: u32) -> Self {
        match code {
            0x0c => Self::Etc1,
            0x0d => Self::Etc1A4,
            code => Self::Unsupported(code),
        }
    }

    pub const fn code(&self) -> u32 {
        match self {
            Self::Etc1 => 0x0c,
            Self::Etc1A4 => 0x0d,
            Self::Unsupported(code) => *code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureType {
    CubeMap,
    OneD,
    TwoD,
    Unknown(u8),
}

impl TextureType {
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::CubeMap,
            1 => Self::OneD,
            2 => Self::TwoD,
            code => Self::Unknown(code),
        }
    }
}

/// Texture info entry, laid out like the CTPK one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub magic: [u8; 4],
    pub file_path_offset: u32,
    pub texture_data_size: u32,
    pub texture_data_offset: u32,
    pub format: TextureFormat,
    pub width: u16,
    pub height: u16,
    pub mip_level: u8,
    pub texture_type: TextureType,
    pub cube_map_related: u16,
    pub bitmap_size_array_offset: u32,
    pub unix_timestamp: u32,
}

struct FieldReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> FieldReader<'a> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0; N];
        bytes.copy_from_slice(&self.data[self.position..self.position + N]);
        self.position += N;
        bytes
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }
}

impl TextureInfo {
    /// Parse the texture info at the start of `data`.
    ///
    /// `expected_magic` of `None` accepts any tag.
    pub fn parse(data: &[u8], expected_magic: Option<[u8; 4]>) -> Result<Self, HeaderError> {
        if data.len() < HEADER_SIZE {
            return Err(HeaderError::Truncated(data.len()));
        }

        let mut reader = FieldReader {
            data: &data[..HEADER_SIZE],
            position: 0,
        };

        let magic = reader.take();
        if let Some(expected) = expected_magic {
            if magic != expected {
                return Err(HeaderError::InvalidMagic {
                    found: magic,
                    expected,
                });
            }
        }

        Ok(Self {
            magic,
            file_path_offset: reader.u32(),
            texture_data_size: reader.u32(),
            texture_data_offset: reader.u32(),
            format: TextureFormat::from_code(reader.u32()),
            width: reader.u16(),
            height: reader.u16(),
            mip_level: reader.u8(),
            texture_type: TextureType::from_code(reader.u8()),
            cube_map_related: reader.u16(),
            bitmap_size_array_offset: reader.u32(),
            unix_timestamp: reader.u32(),
        })
    }

    /// Compare the declared data size with the bytes that follow the header.
    pub fn check_data_size(&self, payload_len: usize) -> Result<(), SizeMismatch> {
        let declared = self.texture_data_size as usize;
        let actual = payload_len.saturating_sub(HEADER_SIZE);

        if declared == actual {
            Ok(())
        } else {
            Err(SizeMismatch { declared, actual })
        }
    }
}

impl fmt::Display for TextureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Magic: {}", String::from_utf8_lossy(&self.magic))?;
        writeln!(f, "FilePathOffset: {:#x}", self.file_path_offset)?;
        writeln!(f, "TextureDataSize: {}", self.texture_data_size)?;
        writeln!(f, "TextureDataOffset: {:#x}", self.texture_data_offset)?;
        writeln!(
            f,
            "TextureFormat: {:?} ({:#x})",
            self.format,
            self.format.code()
        )?;
        writeln!(f, "Width: {}", self.width)?;
        writeln!(f, "Height: {}", self.height)?;
        writeln!(f, "MipLevel: {}", self.mip_level)?;
        writeln!(f, "Type: {:?}", self.texture_type)?;
        writeln!(f, "CubeMapRelated: {}", self.cube_map_related)?;
        writeln!(
            f,
            "BitmapSizeArrayOffset: {:#x}",
            self.bitmap_size_array_offset
        )?;
        write!(f, "UnixTimestamp: {}", self.unix_timestamp)
    }
}
