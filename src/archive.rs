use thiserror::Error;

/// Tag at the very start of an archive.
pub const ARCHIVE_MAGIC: &[u8; 11] = b"AML_Arciver";

const ENTRY_COUNT_OFFSET: usize = 0x80;
const ENTRY_NAME_SIZE: usize = 0x40;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("Not an AML_Arciver archive")]
    InvalidMagic,
    #[error("Archive is too short to hold an entry count")]
    MissingEntryCount,
    #[error("Entry {index} of {count} is cut off at byte {offset:#x}")]
    TruncatedEntry {
        index: usize,
        count: usize,
        offset: usize,
    },
}

/// `AML_Arciver` container: a flat list of named, compressed textures.
#[derive(Debug, Clone)]
pub struct Archive<'a> {
    entries: Vec<ArchiveEntry<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct ArchiveEntry<'a> {
    pub raw_name: &'a [u8],
    pub data: &'a [u8],
}

impl<'a> ArchiveEntry<'a> {
    /// The entry name, bytes mapped one to one onto characters.
    pub fn name(&self) -> String {
        self.raw_name.iter().map(|&b| b as char).collect()
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.data.get(self.position..self.position.checked_add(len)?)?;
        self.position += len;
        Some(bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl<'a> Archive<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ArchiveError> {
        if !data.starts_with(ARCHIVE_MAGIC) {
            return Err(ArchiveError::InvalidMagic);
        }

        let mut cursor = Cursor {
            data,
            position: ENTRY_COUNT_OFFSET,
        };
        let count = cursor.u32().ok_or(ArchiveError::MissingEntryCount)? as usize;
        log::debug!("Archive holds {} entries", count);

        let mut entries = Vec::new();
        for index in 0..count {
            let truncated = |offset| ArchiveError::TruncatedEntry {
                index,
                count,
                offset,
            };

            let name = cursor
                .take(ENTRY_NAME_SIZE)
                .ok_or(truncated(cursor.position))?;
            let size = cursor.u32().ok_or(truncated(cursor.position))? as usize;
            let data = cursor.take(size).ok_or(truncated(cursor.position))?;

            let name_len = name.iter().position(|&b| b == 0).unwrap_or(name.len());
            entries.push(ArchiveEntry {
                raw_name: &name[..name_len],
                data,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ArchiveEntry<'a>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
