mod decompress;
pub use decompress::{decompress, DecompressError, Decompressor};

/// A single decoded instruction of the marker-escape stream.
///
/// The first byte of every stream is the marker. Any later occurrence of the
/// marker either escapes a literal marker byte (when doubled) or starts a
/// back-reference into the bytes already written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Plain byte, copied as-is.
    Literal(u8),
    /// `M M`, emits a single marker byte.
    EscapedMarker,
    /// `M offset count`, copies `count` bytes starting `back` bytes behind the
    /// end of the output.
    Backref { back: usize, count: usize },
}
