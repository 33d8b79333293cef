use super::Operation;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Decompressor<'a> {
    src: &'a [u8],
    dst: Vec<u8>,

    marker: u8,
    /// index to read from
    read_index: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompressError {
    #[error("Stream ended unexpectedly at byte {position}")]
    UnexpectedEnd { position: usize },
    #[error(
        "Back-reference at byte {position} reaches {back} bytes behind an output of {output_len} bytes"
    )]
    OutOfBounds {
        position: usize,
        back: usize,
        output_len: usize,
    },
}

/// Decompress a whole marker-escape stream.
pub fn decompress(src: &[u8]) -> Result<Vec<u8>, DecompressError> {
    Decompressor::new(src)?.decompress()
}

impl Operation {
    pub fn decode(decompressor: &mut Decompressor) -> Result<Self, DecompressError> {
        let marker = decompressor.marker;

        let value = decompressor.read()?;
        if value != marker {
            return Ok(Self::Literal(value));
        }

        let mut back = decompressor.read()?;
        if back == marker {
            return Ok(Self::EscapedMarker);
        }

        // the marker itself is never used as an offset, so everything above it is shifted by one
        if back > marker {
            back -= 1;
        }
        let count = decompressor.read()?;

        Ok(Self::Backref {
            back: back as usize,
            count: count as usize,
        })
    }
}

impl<'a> Decompressor<'a> {
    pub fn new(src: &'a [u8]) -> Result<Self, DecompressError> {
        let marker = *src
            .first()
            .ok_or(DecompressError::UnexpectedEnd { position: 0 })?;

        Ok(Self {
            src,
            // capacity hint only, escapes shrink the output and backrefs grow it
            dst: Vec::with_capacity(src.len()),

            marker,
            read_index: 1,
        })
    }

    pub fn marker(&self) -> u8 {
        self.marker
    }

    pub fn decompress(mut self) -> Result<Vec<u8>, DecompressError> {
        while self.read_index < self.src.len() {
            let position = self.read_index;
            let operation = Operation::decode(&mut self)?;
            log::trace!("operation at {:#x}: {:?}", position, operation);

            match operation {
                Operation::Literal(value) => self.dst.push(value),
                Operation::EscapedMarker => self.dst.push(self.marker),
                Operation::Backref { back, count } => self.copy_backref(position, back, count)?,
            }
        }

        Ok(self.dst)
    }

    fn read(&mut self) -> Result<u8, DecompressError> {
        let value = *self
            .src
            .get(self.read_index)
            .ok_or(DecompressError::UnexpectedEnd {
                position: self.read_index,
            })?;
        self.read_index += 1;

        Ok(value)
    }

    fn copy_backref(
        &mut self,
        position: usize,
        back: usize,
        count: usize,
    ) -> Result<(), DecompressError> {
        if back == 0 || back > self.dst.len() {
            return Err(DecompressError::OutOfBounds {
                position,
                back,
                output_len: self.dst.len(),
            });
        }

        // byte by byte, the source may overlap what is being written
        let start = self.dst.len() - back;
        for i in start..start + count {
            self.dst.push(self.dst[i]);
        }

        Ok(())
    }
}
