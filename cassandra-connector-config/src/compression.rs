//! Frame compression negotiated with the cluster in the STARTUP message. Compressing and
//! decompressing frames is done by the driver; here compression is only a configuration choice.
use derive_more::Display;
use std::str::FromStr;

use crate::error::Error;

pub const LZ4: &str = "lz4";
pub const SNAPPY: &str = "snappy";

/// Enum which represents a type of compression.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Ord, PartialOrd, Hash, Display, Default)]
pub enum Compression {
    /// [lz4](https://code.google.com/p/lz4/) compression
    #[display("LZ4")]
    Lz4,
    /// [snappy](https://code.google.com/p/snappy/) compression
    #[display("SNAPPY")]
    Snappy,
    /// Non compression
    #[default]
    #[display("NONE")]
    None,
}

impl Compression {
    /// Checks if current compression actually compresses data.
    #[inline]
    pub fn is_compressed(self) -> bool {
        self != Compression::None
    }

    /// Lower-case name understood by the driver, or `None` when nothing is compressed.
    pub fn as_str(&self) -> Option<&'static str> {
        match *self {
            Compression::Lz4 => Some(LZ4),
            Compression::Snappy => Some(SNAPPY),
            Compression::None => None,
        }
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            LZ4 => Ok(Compression::Lz4),
            SNAPPY => Ok(Compression::Snappy),
            _ => Err(Error::ConfigValidation(format!(
                "Invalid compression provided: {s}"
            ))),
        }
    }
}
