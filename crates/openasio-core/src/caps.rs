//! Capability mask.
//!
//! A driver instance advertises what it can do as a fixed bit mask. The mask
//! is computed once when a device is opened and never changes afterwards, so
//! [`Capabilities`] deliberately has no mutating methods.

use core::fmt;
use core::ops::BitOr;

/// Immutable capability bit mask.
///
/// Bit values match the ABI: output `1<<0`, input `1<<1`, full duplex `1<<2`,
/// runtime sample-rate change `1<<3`, runtime buffer-size change `1<<4`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u32);

impl Capabilities {
    /// No capabilities.
    pub const NONE: Self = Self(0);
    /// Playback.
    pub const OUTPUT: Self = Self(1 << 0);
    /// Capture.
    pub const INPUT: Self = Self(1 << 1);
    /// Simultaneous capture and playback.
    pub const FULL_DUPLEX: Self = Self(1 << 2);
    /// `set_sample_rate` is supported.
    pub const SET_SAMPLE_RATE: Self = Self(1 << 3);
    /// `set_buffer_frames` is supported.
    pub const SET_BUFFER_FRAMES: Self = Self(1 << 4);

    const KNOWN: u32 = 0x1f;

    const NAMES: [(Self, &'static str); 5] = [
        (Self::OUTPUT, "OUTPUT"),
        (Self::INPUT, "INPUT"),
        (Self::FULL_DUPLEX, "FULL_DUPLEX"),
        (Self::SET_SAMPLE_RATE, "SET_SAMPLE_RATE"),
        (Self::SET_BUFFER_FRAMES, "SET_BUFFER_FRAMES"),
    ];

    /// Builds a mask from raw bits, dropping unknown bits.
    ///
    /// Unknown bits are reserved for additive minor versions and carry no
    /// meaning for this implementation.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::KNOWN)
    }

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bitwise union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Playback supported.
    pub const fn supports_output(self) -> bool {
        self.contains(Self::OUTPUT)
    }

    /// Capture supported.
    pub const fn supports_input(self) -> bool {
        self.contains(Self::INPUT)
    }

    /// Simultaneous capture and playback supported.
    pub const fn supports_full_duplex(self) -> bool {
        self.contains(Self::FULL_DUPLEX)
    }

    /// Runtime sample-rate change supported.
    pub const fn can_set_sample_rate(self) -> bool {
        self.contains(Self::SET_SAMPLE_RATE)
    }

    /// Runtime buffer-size change supported.
    pub const fn can_set_buffer_frames(self) -> bool {
        self.contains(Self::SET_BUFFER_FRAMES)
    }

    /// Iterates the names of the set flags.
    pub fn flag_names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capabilities({:#07b}: {self})", self.0)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        for (i, name) in self.flag_names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}
