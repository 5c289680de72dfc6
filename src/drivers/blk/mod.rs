//! Block device general traits
//!
//! Drivers for removable media (SD host controllers, USB mass storage class
//! drivers) are written against [`BlockDevice`] and plugged into the disk
//! layer through [`BlockDisk`].

mod dev;

pub use dev::BlockDisk;

use core::fmt::Debug;

use crate::error::DiskError;

/// General Device Operations
/// Adapted from ArceOS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevError {
    /// An entity already exists.
    AlreadyExists,
    /// Try again, for non-blocking APIs.
    Again,
    /// Bad internal state.
    BadState,
    /// Invalid parameter/argument.
    InvalidParam,
    /// Input/output error.
    IO,
    /// Not enough space/cannot allocate memory (DMA).
    NoMemory,
    /// The medium refuses writes.
    ReadOnly,
    /// Device or resource is busy.
    ResourceBusy,
    /// This operation is unsupported or unimplemented.
    Unsupported,
}

pub type DevResult<T = ()> = Result<T, DevError>;

pub trait BlockDevice: Send + Debug {
    fn name(&self) -> &str;

    /// Power up and probe the medium. Called again after a card swap.
    fn init(&mut self) -> DevResult;

    /// Card detect. Fixed media always report present.
    fn is_present(&self) -> bool {
        true
    }

    /// Write protect switch
    fn is_write_protected(&self) -> bool {
        false
    }

    fn num_blocks(&self) -> u64;
    fn block_size(&self) -> usize;

    fn read_block(&mut self, block_id: u64, buf: &mut [u8]) -> DevResult;
    fn write_block(&mut self, block_id: u64, buf: &[u8]) -> DevResult;
    fn flush(&mut self) -> DevResult;

    /// Erase granularity in blocks
    fn erase_block_size(&self) -> u32 {
        1
    }

    /// Erase `count` blocks starting at `block_id`.
    fn erase_blocks(&mut self, _block_id: u64, _count: u64) -> DevResult {
        Err(DevError::Unsupported)
    }
}

/// Device error mappings
pub const fn as_disk_err(e: DevError) -> DiskError {
    use DevError::*;
    match e {
        Again | ResourceBusy => DiskError::NotReady,
        InvalidParam => DiskError::ParamError,
        ReadOnly => DiskError::WriteProtected,
        AlreadyExists | BadState | IO | NoMemory | Unsupported => DiskError::Error,
    }
}

/// Errors worth another attempt on the same block
pub const fn is_transient(e: DevError) -> bool {
    matches!(e, DevError::Again | DevError::ResourceBusy | DevError::IO)
}
