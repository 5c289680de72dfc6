//! Low level disk interface for FAT filesystem middleware
//!
//! The filesystem layer talks to storage through five calls (initialize,
//! status, read, write, ioctl) plus a time source used to stamp file
//! metadata. This crate provides that seam:
//!
//! * [`DiskMedia`]: the media compiled into this build, selected by cargo
//!   features (`flash`, `sd-card`, `usb-key`, `ram-drive`).
//! * [`DiskDriver`]: the contract each backend implements.
//! * [`DiskManager`]: a registry keyed by media id that serializes calls per
//!   device and hands out the packed FAT time.
//! * [`ffi`]: the same calls with the original C signatures.
//!
//! ```rust,ignore
//! let disks = DiskManager::new();
//! disks.register(DiskMedia::RamDisk, Box::new(RamDisk::new(128)?));
//! let id = DiskMedia::RamDisk.id();
//! assert!(disks.initialize(id).is_ready());
//! let mut sector = [0u8; 512];
//! disks.read(id, &mut sector, 0, 1)?;
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[cfg(not(any(
    feature = "flash",
    feature = "sd-card",
    feature = "usb-key",
    feature = "ram-drive"
)))]
compile_error!("at least one disk media feature must be enabled");

pub mod consts;
pub mod disk;
pub mod drivers;
pub mod error;
pub mod ffi;
pub mod ioctl;
pub mod logging;
pub mod media;
pub mod status;
pub mod timer;

/// Media relative, zero based logical block address
pub type Lba = u32;

pub use disk::Disk;
pub use drivers::{BlockDevice, BlockDisk, DevError, DevResult, DiskDriver, DiskManager, Geometry};
pub use error::{DResult, DiskError, DiskResult};
pub use ioctl::{Ioctl, IoctlCmd, IoctlReply};
pub use media::{DiskMedia, NUMBER_OF_DISK};
pub use status::DiskStatus;
pub use timer::{FatTimestamp, FixedTimeSource, TimeSource};

#[cfg(feature = "flash")]
pub use drivers::{FlashDisk, NorFlash, SimFlash};
#[cfg(feature = "ram-drive")]
pub use drivers::RamDisk;
