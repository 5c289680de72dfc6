//! Out-of-band disk control
//!
//! The command codes are shared with the filesystem middleware and must
//! never be renumbered. Each command travels as a typed [`Ioctl`] request
//! and answers with an [`IoctlReply`], so an argument can never be read as
//! the wrong type.

use crate::error::{DiskError, DiskResult};
use crate::Lba;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IoctlCmd {
    /// Flush write-back caches. Required before relying on prior writes.
    CtrlSync = 0,
    /// Number of addressable sectors. Required by format.
    GetSectorCount = 1,
    /// Sector size in bytes.
    GetSectorSize = 2,
    /// Erase block size in sectors. Required by format.
    GetBlockSize = 3,
    /// Erase an inclusive sector range ahead of writing it.
    CtrlEraseSector = 4,
}

impl TryFrom<u8> for IoctlCmd {
    type Error = DiskError;

    fn try_from(code: u8) -> DiskResult<Self> {
        match code {
            0 => Ok(Self::CtrlSync),
            1 => Ok(Self::GetSectorCount),
            2 => Ok(Self::GetSectorSize),
            3 => Ok(Self::GetBlockSize),
            4 => Ok(Self::CtrlEraseSector),
            _ => Err(DiskError::ParamError),
        }
    }
}

/// A control request with its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ioctl {
    Sync,
    GetSectorCount,
    GetSectorSize,
    GetBlockSize,
    /// `start..=end`
    EraseSectors { start: Lba, end: Lba },
}

/// Answer to an [`Ioctl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoctlReply {
    None,
    SectorCount(u32),
    SectorSize(u16),
    BlockSize(u32),
}

impl IoctlReply {
    pub fn sector_count(self) -> DiskResult<u32> {
        match self {
            Self::SectorCount(n) => Ok(n),
            _ => Err(DiskError::Error),
        }
    }

    pub fn sector_size(self) -> DiskResult<u16> {
        match self {
            Self::SectorSize(n) => Ok(n),
            _ => Err(DiskError::Error),
        }
    }

    pub fn block_size(self) -> DiskResult<u32> {
        match self {
            Self::BlockSize(n) => Ok(n),
            _ => Err(DiskError::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_codes_are_stable() {
        assert_eq!(IoctlCmd::CtrlSync as u8, 0);
        assert_eq!(IoctlCmd::GetSectorCount as u8, 1);
        assert_eq!(IoctlCmd::GetSectorSize as u8, 2);
        assert_eq!(IoctlCmd::GetBlockSize as u8, 3);
        assert_eq!(IoctlCmd::CtrlEraseSector as u8, 4);
        for code in 0..=4u8 {
            assert_eq!(IoctlCmd::try_from(code).map(|c| c as u8), Ok(code));
        }
    }

    #[test]
    fn unknown_command_is_param_error() {
        assert_eq!(IoctlCmd::try_from(5), Err(DiskError::ParamError));
        assert_eq!(IoctlCmd::try_from(0xff), Err(DiskError::ParamError));
    }

    #[test]
    fn reply_accessors_reject_other_kinds() {
        assert_eq!(IoctlReply::SectorCount(8).sector_count(), Ok(8));
        assert_eq!(IoctlReply::SectorSize(512).sector_size(), Ok(512));
        assert_eq!(IoctlReply::BlockSize(16).block_size(), Ok(16));
        assert_eq!(IoctlReply::None.sector_count(), Err(DiskError::Error));
        assert_eq!(IoctlReply::BlockSize(16).sector_size(), Err(DiskError::Error));
    }
}
