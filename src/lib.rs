pub mod archive;
pub use archive::{Archive, ArchiveEntry, ArchiveError};

mod compression;
pub use compression::{decompress, DecompressError, Decompressor, Operation};

mod config;
pub use config::{Config, DecodeOptions, Magic, UnpackOptions};

pub mod etc1;

mod scramble;
pub use scramble::ScrambleTable;

mod texture;
pub use texture::{
    decode_entry, decode_raw, decode_raw_compressed, decode_texture, DecodedTexture, HeaderError, SizeMismatch,
    TextureError, TextureFormat, TextureInfo, TextureType, HEADER_SIZE,
};

pub mod unpack;
pub use unpack::{UnpackError, UnpackReport};
