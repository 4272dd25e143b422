//! Sample encodings and buffer layouts.

use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// Sample encoding exchanged with the host callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u32)]
pub enum SampleFormat {
    /// 32-bit float normalized to [-1, +1].
    F32 = 1,
    /// Signed 16-bit integer.
    I16 = 2,
    /// Unsigned 16-bit integer, offset binary (32768 is silence).
    U16 = 3,
}

impl SampleFormat {
    /// Every format, in ABI order.
    pub const ALL: [Self; 3] = [Self::F32, Self::I16, Self::U16];

    /// Size of one sample in bytes.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::I16 | Self::U16 => 2,
        }
    }

    /// ABI value.
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Parses an ABI value.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::F32),
            2 => Some(Self::I16),
            3 => Some(Self::U16),
            _ => None,
        }
    }

    /// Short lower-case name (`f32`, `i16`, `u16`).
    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::I16 => "i16",
            Self::U16 => "u16",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "f32" | "float32" | "float" => Ok(Self::F32),
            "i16" | "s16" | "int16" => Ok(Self::I16),
            "u16" | "uint16" => Ok(Self::U16),
            other => Err(Error::invalid_arg(format!("unknown sample format '{other}'"))),
        }
    }
}

/// Arrangement of channels within a period buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u32)]
pub enum BufferLayout {
    /// `frames * channels` contiguous samples, `[L0, R0, L1, R1, ...]`.
    Interleaved = 1,
    /// One block of `frames` samples per channel, `[L0, L1, ..., R0, R1, ...]`.
    NonInterleaved = 2,
}

impl BufferLayout {
    /// Both layouts.
    pub const ALL: [Self; 2] = [Self::Interleaved, Self::NonInterleaved];

    /// ABI value.
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Parses an ABI value.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Interleaved),
            2 => Some(Self::NonInterleaved),
            _ => None,
        }
    }

    /// Lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Interleaved => "interleaved",
            Self::NonInterleaved => "non-interleaved",
        }
    }
}

impl fmt::Display for BufferLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BufferLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "interleaved" | "i" => Ok(Self::Interleaved),
            "non-interleaved" | "noninterleaved" | "planar" | "n" => Ok(Self::NonInterleaved),
            other => Err(Error::invalid_arg(format!("unknown buffer layout '{other}'"))),
        }
    }
}
