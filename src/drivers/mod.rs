//! Disk drivers
//!
//! [`DiskDriver`] is the contract the filesystem layer relies on. Backends
//! shipped here:
//!
//! * [`RamDisk`]: heap backed sectors
//! * [`FlashDisk`]: sectors on a NOR flash part with a write-back block cache
//! * [`BlockDisk`]: adapter for block oriented drivers living elsewhere
//!   (SD host controllers, USB mass storage class drivers)

mod blk;
#[cfg(feature = "flash")]
mod flash;
mod manager;
#[cfg(feature = "ram-drive")]
mod ram;

use log::warn;

pub use blk::{BlockDevice, BlockDisk, DevError, DevResult};
#[cfg(feature = "flash")]
pub use flash::{FlashDisk, NorFlash, SimFlash};
pub use manager::DiskManager;
#[cfg(feature = "ram-drive")]
pub use ram::RamDisk;

use crate::error::{DiskError, DiskResult};
use crate::ioctl::{Ioctl, IoctlReply};
use crate::status::DiskStatus;
use crate::Lba;

/// Low level access to one storage medium.
///
/// Every call is synchronous and runs to completion. Transfers are all or
/// nothing: on failure the contents of `buf` past the last good sector are
/// undefined.
pub trait DiskDriver: Send {
    fn name(&self) -> &str;

    /// Bring the device up. Calling it on a ready device is harmless.
    fn initialize(&mut self) -> DiskStatus;

    /// Current readiness, without any recovery attempt.
    fn status(&self) -> DiskStatus;

    /// Read `count` sectors starting at `sector` into `buf`.
    fn read(&mut self, buf: &mut [u8], sector: Lba, count: u16) -> DiskResult;

    /// Write `count` sectors starting at `sector` from `buf`.
    ///
    /// Data may sit in a cache until [`Ioctl::Sync`].
    #[cfg(feature = "write")]
    fn write(&mut self, buf: &[u8], sector: Lba, count: u16) -> DiskResult;

    fn ioctl(&mut self, ctrl: Ioctl) -> DiskResult<IoctlReply>;
}

/// Sector layout of a medium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub sector_size: usize,
    pub sector_count: u32,
}

impl Geometry {
    pub const fn new(sector_size: usize, sector_count: u32) -> Self {
        Self {
            sector_size,
            sector_count,
        }
    }

    pub const fn byte_size(&self) -> u64 {
        self.sector_size as u64 * self.sector_count as u64
    }

    /// Whole medium in bytes, if it fits in the address space.
    pub fn byte_len(&self) -> DiskResult<usize> {
        usize::try_from(self.byte_size()).map_err(|_| {
            warn!("{} byte medium does not fit in memory", self.byte_size());
            DiskError::ParamError
        })
    }

    /// Validate a transfer and return its length in bytes.
    ///
    /// The byte offset on the medium is left to the backend: it can exceed
    /// `usize` on 32-bit targets.
    pub fn check_transfer(&self, buf_len: usize, sector: Lba, count: u16) -> DiskResult<usize> {
        if count == 0 {
            warn!("zero sector transfer at {}", sector);
            return Err(DiskError::ParamError);
        }
        let end = sector.checked_add(count as u32).ok_or(DiskError::ParamError)?;
        if end > self.sector_count {
            warn!(
                "transfer {}..{} beyond the last sector {}",
                sector, end, self.sector_count
            );
            return Err(DiskError::ParamError);
        }
        let len = count as usize * self.sector_size;
        if buf_len < len {
            warn!("buffer of {} bytes for a {} byte transfer", buf_len, len);
            return Err(DiskError::ParamError);
        }
        Ok(len)
    }

    /// Validate an inclusive erase range.
    pub fn check_erase(&self, start: Lba, end: Lba) -> DiskResult {
        if start > end || end >= self.sector_count {
            warn!("bad erase range {}..={}", start, end);
            return Err(DiskError::ParamError);
        }
        Ok(())
    }

    pub fn sector_size_u16(&self) -> DiskResult<u16> {
        u16::try_from(self.sector_size).map_err(|_| DiskError::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEO: Geometry = Geometry::new(512, 16);

    #[test]
    fn accepts_in_range_transfers() {
        assert_eq!(GEO.check_transfer(512, 0, 1), Ok(512));
        assert_eq!(GEO.check_transfer(4096, 15, 1), Ok(512));
        assert_eq!(GEO.check_transfer(16 * 512, 0, 16), Ok(16 * 512));
    }

    #[test]
    fn sectors_past_4gib() {
        // 16 GB card
        let card = Geometry::new(512, 31_250_000);
        assert_eq!(card.check_transfer(1024, 10_000_000, 2), Ok(1024));
        assert_eq!(card.check_transfer(512, 31_249_999, 1), Ok(512));
    }

    #[test]
    fn byte_len() {
        assert_eq!(GEO.byte_len(), Ok(8192));
        let huge = Geometry::new(4096, u32::MAX);
        if usize::BITS < 64 {
            assert_eq!(huge.byte_len(), Err(DiskError::ParamError));
        } else {
            assert_eq!(huge.byte_len().map(|n| n as u64), Ok(huge.byte_size()));
        }
    }

    #[test]
    fn rejects_bad_transfers() {
        assert_eq!(GEO.check_transfer(512, 0, 0), Err(DiskError::ParamError));
        assert_eq!(GEO.check_transfer(512, 16, 1), Err(DiskError::ParamError));
        assert_eq!(GEO.check_transfer(1024, 15, 2), Err(DiskError::ParamError));
        assert_eq!(GEO.check_transfer(511, 0, 1), Err(DiskError::ParamError));
        assert_eq!(
            GEO.check_transfer(512, u32::MAX, 1),
            Err(DiskError::ParamError)
        );
    }

    #[test]
    fn erase_ranges() {
        assert_eq!(GEO.check_erase(0, 15), Ok(()));
        assert_eq!(GEO.check_erase(3, 3), Ok(()));
        assert_eq!(GEO.check_erase(4, 3), Err(DiskError::ParamError));
        assert_eq!(GEO.check_erase(0, 16), Err(DiskError::ParamError));
    }

    #[test]
    fn byte_size() {
        assert_eq!(GEO.byte_size(), 8192);
        assert_eq!(Geometry::new(4096, u32::MAX).byte_size(), 4096 * u32::MAX as u64);
    }
}
