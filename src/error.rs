//! Disk result codes

use core::fmt;

/// Failure reported by a disk call.
///
/// The discriminants are the `DRESULT` codes the filesystem middleware
/// expects; success is [`DResult::Ok`] (0) and never appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DiskError {
    /// Unrecovered read/write fault.
    Error = 1,
    /// The medium (or the addressed range) is write protected.
    WriteProtected = 2,
    /// Device missing or not initialized.
    NotReady = 3,
    /// Invalid parameter: bad media id, range, buffer or command.
    ParamError = 4,
}

pub type DiskResult<T = ()> = Result<T, DiskError>;

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Error => "read/write error",
            Self::WriteProtected => "write protected",
            Self::NotReady => "not ready",
            Self::ParamError => "invalid parameter",
        };
        f.write_str(msg)
    }
}

/// Raw `DRESULT` as seen across the C boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub enum DResult {
    Ok = 0,
    Error = 1,
    WrPrt = 2,
    NotRdy = 3,
    ParErr = 4,
}

impl From<DiskError> for DResult {
    fn from(err: DiskError) -> Self {
        match err {
            DiskError::Error => Self::Error,
            DiskError::WriteProtected => Self::WrPrt,
            DiskError::NotReady => Self::NotRdy,
            DiskError::ParamError => Self::ParErr,
        }
    }
}

impl<T> From<DiskResult<T>> for DResult {
    fn from(res: DiskResult<T>) -> Self {
        match res {
            Ok(_) => Self::Ok,
            Err(e) => e.into(),
        }
    }
}
