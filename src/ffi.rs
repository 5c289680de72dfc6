//! C calling convention for the disk interface
//!
//! The `raw_*` helpers decode pointer arguments against any
//! [`DiskManager`]. With the `c-abi` feature the classic entry points
//! (`disk_initialize`, `disk_status`, `disk_read`, `disk_write`,
//! `disk_ioctl`, `get_fattime`) are exported unmangled and served by the
//! global [`DISKS`] manager.
//!
//! ioctl argument types per command: `GET_SECTOR_COUNT` and `GET_BLOCK_SIZE`
//! write a `u32`, `GET_SECTOR_SIZE` writes a `u16`, `CTRL_ERASE_SECTOR`
//! reads a `[u32; 2]` inclusive range, `CTRL_SYNC` ignores the pointer.

use core::ffi::c_void;

use log::warn;

use crate::drivers::DiskManager;
use crate::error::DResult;
use crate::ioctl::{Ioctl, IoctlCmd, IoctlReply};
use crate::Lba;

/// # Safety
///
/// `buff` must be valid for writes of `count` sectors of the drive's
/// sector size.
pub unsafe fn raw_read(
    disks: &DiskManager,
    pdrv: u8,
    buff: *mut u8,
    sector: Lba,
    count: u16,
) -> DResult {
    if buff.is_null() {
        warn!("disk_read: null buffer");
        return DResult::ParErr;
    }
    let sector_size = match disks.sector_size(pdrv) {
        Ok(size) => size,
        Err(e) => return e.into(),
    };
    let buf = core::slice::from_raw_parts_mut(buff, sector_size * count as usize);
    disks.read(pdrv, buf, sector, count).into()
}

/// # Safety
///
/// `buff` must be valid for reads of `count` sectors of the drive's
/// sector size.
#[cfg(feature = "write")]
pub unsafe fn raw_write(
    disks: &DiskManager,
    pdrv: u8,
    buff: *const u8,
    sector: Lba,
    count: u16,
) -> DResult {
    if buff.is_null() {
        warn!("disk_write: null buffer");
        return DResult::ParErr;
    }
    let sector_size = match disks.sector_size(pdrv) {
        Ok(size) => size,
        Err(e) => return e.into(),
    };
    let buf = core::slice::from_raw_parts(buff, sector_size * count as usize);
    disks.write(pdrv, buf, sector, count).into()
}

/// # Safety
///
/// `buff` must point to the argument type of `cmd` (see the module docs),
/// or may be null for `CTRL_SYNC`.
pub unsafe fn raw_ioctl(disks: &DiskManager, pdrv: u8, cmd: u8, buff: *mut c_void) -> DResult {
    let cmd = match IoctlCmd::try_from(cmd) {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!("disk_ioctl: unknown command {}", cmd);
            return e.into();
        }
    };
    if buff.is_null() && cmd != IoctlCmd::CtrlSync {
        warn!("disk_ioctl: {:?} without an argument", cmd);
        return DResult::ParErr;
    }
    let request = match cmd {
        IoctlCmd::CtrlSync => Ioctl::Sync,
        IoctlCmd::GetSectorCount => Ioctl::GetSectorCount,
        IoctlCmd::GetSectorSize => Ioctl::GetSectorSize,
        IoctlCmd::GetBlockSize => Ioctl::GetBlockSize,
        IoctlCmd::CtrlEraseSector => {
            let [start, end] = (buff as *const [u32; 2]).read_unaligned();
            Ioctl::EraseSectors { start, end }
        }
    };
    match disks.ioctl(pdrv, request) {
        Ok(IoctlReply::None) => DResult::Ok,
        Ok(IoctlReply::SectorCount(n)) | Ok(IoctlReply::BlockSize(n)) => {
            (buff as *mut u32).write_unaligned(n);
            DResult::Ok
        }
        Ok(IoctlReply::SectorSize(n)) => {
            (buff as *mut u16).write_unaligned(n);
            DResult::Ok
        }
        Err(e) => e.into(),
    }
}

#[cfg(feature = "c-abi")]
mod exports {
    use lazy_static::lazy_static;

    use super::*;

    lazy_static! {
        /// Drives behind the exported C functions
        pub static ref DISKS: DiskManager = DiskManager::new();
    }

    #[no_mangle]
    pub extern "C" fn disk_initialize(pdrv: u8) -> u8 {
        DISKS.initialize(pdrv).bits()
    }

    #[no_mangle]
    pub extern "C" fn disk_status(pdrv: u8) -> u8 {
        DISKS.status(pdrv).bits()
    }

    /// # Safety
    ///
    /// See [`raw_read`].
    #[no_mangle]
    pub unsafe extern "C" fn disk_read(
        pdrv: u8,
        buff: *mut u8,
        sector: u32,
        count: u16,
    ) -> DResult {
        raw_read(&DISKS, pdrv, buff, sector, count)
    }

    /// # Safety
    ///
    /// See [`raw_write`].
    #[cfg(feature = "write")]
    #[no_mangle]
    pub unsafe extern "C" fn disk_write(
        pdrv: u8,
        buff: *const u8,
        sector: u32,
        count: u16,
    ) -> DResult {
        raw_write(&DISKS, pdrv, buff, sector, count)
    }

    /// # Safety
    ///
    /// See [`raw_ioctl`].
    #[no_mangle]
    pub unsafe extern "C" fn disk_ioctl(pdrv: u8, cmd: u8, buff: *mut c_void) -> DResult {
        raw_ioctl(&DISKS, pdrv, cmd, buff)
    }

    #[no_mangle]
    pub extern "C" fn get_fattime() -> u32 {
        DISKS.get_fattime()
    }
}

#[cfg(feature = "c-abi")]
pub use exports::*;
