use crate::texture::DEFAULT_MAGIC;
use serde::{
    de::{self, Visitor},
    Deserialize,
};
use std::fmt;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub decode: DecodeOptions,
    pub unpack: UnpackOptions,
}

impl Config {
    pub fn parse(config: &str) -> Result<Config, toml::de::Error> {
        toml::de::from_str(config)
    }
}

/// How strictly a single entry is validated.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeOptions {
    /// Reject entries whose declared data size does not match the payload
    /// instead of decoding them with a warning.
    pub strict_size: bool,
    pub check_magic: bool,
    pub magic: Magic,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict_size: false,
            check_magic: true,
            magic: Magic(DEFAULT_MAGIC),
        }
    }
}

impl DecodeOptions {
    pub fn expected_magic(&self) -> Option<[u8; 4]> {
        self.check_magic.then_some(self.magic.0)
    }
}

/// Batch behaviour of the unpacker.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnpackOptions {
    /// Stop at the first entry that fails to decode.
    pub fail_fast: bool,
    /// Replace `/` in entry names so every texture lands in the output directory itself.
    pub flatten_paths: bool,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            flatten_paths: true,
        }
    }
}

/// Four byte tag, written as a four character ASCII string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Magic(pub [u8; 4]);

impl<'de> Deserialize<'de> for Magic {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(MagicVisitor)
    }
}

struct MagicVisitor;

impl<'de> Visitor<'de> for MagicVisitor {
    type Value = Magic;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string of four ASCII characters")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if !value.is_ascii() {
            return Err(de::Error::invalid_value(de::Unexpected::Str(value), &self));
        }

        let magic: [u8; 4] = value
            .as_bytes()
            .try_into()
            .map_err(|_| de::Error::invalid_length(value.len(), &self))?;

        Ok(Magic(magic))
    }
}
