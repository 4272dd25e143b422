//! ABI version and the host-side compatibility rule.

use core::fmt;

use crate::error::{Error, Result};

/// Three-part ABI version.
///
/// Minor and patch bumps are additive only. A layout or semantic break bumps
/// the major number, and hosts reject drivers with a major they do not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Incompatible changes.
    pub major: u32,
    /// Additive changes.
    pub minor: u32,
    /// Fixes.
    pub patch: u32,
}

impl Version {
    /// Version implemented by this crate.
    pub const CURRENT: Self = Self::new(1, 0, 0);

    /// Create a version.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether a host at `self` can drive a driver declaring `driver`.
    pub const fn accepts(self, driver: Self) -> bool {
        self.major == driver.major
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Rejects a driver whose major version differs from [`Version::CURRENT`].
pub fn check_driver_version(driver: Version) -> Result<()> {
    if Version::CURRENT.accepts(driver) {
        Ok(())
    } else {
        Err(Error::unsupported(format!(
            "driver declares ABI {driver}, host speaks {}",
            Version::CURRENT
        )))
    }
}
