use core::cell::Cell;
use core::fmt::Debug;

use log::{debug, trace, warn};

use super::{as_disk_err, is_transient, BlockDevice, DevError, DevResult};
use crate::consts::{is_valid_sector_size, TRANSFER_RETRIES};
use crate::drivers::{DiskDriver, Geometry};
use crate::error::{DiskError, DiskResult};
use crate::ioctl::{Ioctl, IoctlReply};
use crate::status::DiskStatus;
use crate::Lba;

/// Disk driver over a [`BlockDevice`]
///
/// Tracks the initialized state the block driver does not expose, checks
/// every request against the device geometry, and retries transient block
/// failures a bounded number of times. Pulling the card drops the device
/// back to not-initialized until the next `initialize`, even when the
/// removal was only seen by a status poll.
pub struct BlockDisk<D: BlockDevice> {
    dev: D,
    initialized: Cell<bool>,
}

impl<D: BlockDevice> Debug for BlockDisk<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockDisk")
            .field("dev", &self.dev)
            .field("initialized", &self.initialized.get())
            .finish()
    }
}

impl<D: BlockDevice> BlockDisk<D> {
    pub fn new(dev: D) -> Self {
        Self {
            dev,
            initialized: Cell::new(false),
        }
    }

    pub fn device(&self) -> &D {
        &self.dev
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.dev
    }

    pub fn into_inner(self) -> D {
        self.dev
    }

    fn geometry(&self) -> Geometry {
        // Media past 2 TiB are truncated to what a 32-bit LBA reaches
        let count = u32::try_from(self.dev.num_blocks()).unwrap_or(u32::MAX);
        Geometry::new(self.dev.block_size(), count)
    }

    /// Card detect. A missing medium forgets the initialization.
    fn check_present(&self) -> bool {
        if self.dev.is_present() {
            return true;
        }
        if self.initialized.replace(false) {
            warn!("{}: medium removed", self.dev.name());
        }
        false
    }

    fn ensure_ready(&self) -> DiskResult {
        if self.check_present() && self.initialized.get() {
            Ok(())
        } else {
            Err(DiskError::NotReady)
        }
    }
}

fn with_retry(block_id: u64, mut op: impl FnMut() -> DevResult) -> DiskResult {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(()) => return Ok(()),
            Err(e) if is_transient(e) && attempt < TRANSFER_RETRIES => {
                attempt += 1;
                warn!(
                    "block {} failed with {:?}, retry {}/{}",
                    block_id, e, attempt, TRANSFER_RETRIES
                );
            }
            Err(e) => return Err(as_disk_err(e)),
        }
    }
}

impl<D: BlockDevice> DiskDriver for BlockDisk<D> {
    fn name(&self) -> &str {
        self.dev.name()
    }

    fn initialize(&mut self) -> DiskStatus {
        if !self.check_present() {
            warn!("{}: no medium", self.dev.name());
            return self.status();
        }
        if !self.initialized.get() {
            match self.dev.init() {
                Ok(()) if is_valid_sector_size(self.dev.block_size()) => {
                    self.initialized.set(true);
                    debug!(
                        "{}: {} blocks of {} bytes",
                        self.dev.name(),
                        self.dev.num_blocks(),
                        self.dev.block_size()
                    );
                }
                Ok(()) => warn!(
                    "{}: unsupported block size {}",
                    self.dev.name(),
                    self.dev.block_size()
                ),
                Err(e) => warn!("{}: init failed: {:?}", self.dev.name(), e),
            }
        }
        self.status()
    }

    fn status(&self) -> DiskStatus {
        if !self.check_present() {
            return DiskStatus::NOINIT | DiskStatus::NODISK;
        }
        let mut status = DiskStatus::empty();
        if !self.initialized.get() {
            status |= DiskStatus::NOINIT;
        }
        if self.dev.is_write_protected() {
            status |= DiskStatus::PROTECT;
        }
        status
    }

    fn read(&mut self, buf: &mut [u8], sector: Lba, count: u16) -> DiskResult {
        self.ensure_ready()?;
        let geo = self.geometry();
        let len = geo.check_transfer(buf.len(), sector, count)?;
        trace!("{}: read {} x{}", self.dev.name(), sector, count);
        let dev = &mut self.dev;
        for (i, chunk) in buf[..len]
            .chunks_exact_mut(geo.sector_size)
            .enumerate()
        {
            let block_id = sector as u64 + i as u64;
            with_retry(block_id, || dev.read_block(block_id, &mut chunk[..]))?;
        }
        Ok(())
    }

    #[cfg(feature = "write")]
    fn write(&mut self, buf: &[u8], sector: Lba, count: u16) -> DiskResult {
        self.ensure_ready()?;
        if !self.status().is_writable() {
            return Err(DiskError::WriteProtected);
        }
        let geo = self.geometry();
        let len = geo.check_transfer(buf.len(), sector, count)?;
        trace!("{}: write {} x{}", self.dev.name(), sector, count);
        let dev = &mut self.dev;
        for (i, chunk) in buf[..len].chunks_exact(geo.sector_size).enumerate() {
            let block_id = sector as u64 + i as u64;
            with_retry(block_id, || dev.write_block(block_id, chunk))?;
        }
        Ok(())
    }

    fn ioctl(&mut self, ctrl: Ioctl) -> DiskResult<IoctlReply> {
        self.ensure_ready()?;
        let geo = self.geometry();
        match ctrl {
            Ioctl::Sync => {
                self.dev.flush().map_err(as_disk_err)?;
                Ok(IoctlReply::None)
            }
            Ioctl::GetSectorCount => Ok(IoctlReply::SectorCount(geo.sector_count)),
            Ioctl::GetSectorSize => Ok(IoctlReply::SectorSize(geo.sector_size_u16()?)),
            Ioctl::GetBlockSize => Ok(IoctlReply::BlockSize(self.dev.erase_block_size())),
            Ioctl::EraseSectors { start, end } => {
                geo.check_erase(start, end)?;
                if self.dev.is_write_protected() {
                    return Err(DiskError::WriteProtected);
                }
                match self.dev.erase_blocks(start as u64, (end - start) as u64 + 1) {
                    Ok(()) => Ok(IoctlReply::None),
                    // Erase is only a hint for media that rewrite in place
                    Err(DevError::Unsupported) => {
                        debug!("{}: erase not supported, ignored", self.dev.name());
                        Ok(IoctlReply::None)
                    }
                    Err(e) => Err(as_disk_err(e)),
                }
            }
        }
    }
}
