//! NOR flash drive
//!
//! Flash can only be programmed from 1 to 0 and only erased a whole erase
//! block at a time, so sectors are staged in a one-block write-back cache:
//! the first write to a block loads it, later writes patch the cache, and
//! the block is erased and reprogrammed when the cache moves to another
//! block or on `CTRL_SYNC`. Writes that were not synced are lost with the
//! driver, the same as on power loss.

mod sim;

pub use sim::SimFlash;

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use log::{debug, trace, warn};

use super::blk::as_disk_err;
use super::{DevResult, DiskDriver, Geometry};
use crate::consts::{is_valid_sector_size, FLASH_ERASED_BYTE};
use crate::error::{DiskError, DiskResult};
use crate::ioctl::{Ioctl, IoctlReply};
use crate::status::DiskStatus;
use crate::Lba;

/// Raw access to a NOR flash part, byte addressed.
pub trait NorFlash: Send + Debug {
    fn name(&self) -> &str;

    /// Controller bring-up
    fn init(&mut self) -> DevResult {
        Ok(())
    }

    fn capacity(&self) -> usize;
    fn erase_size(&self) -> usize;

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> DevResult;
    /// Clear bits; programming never sets a bit back to 1.
    fn program(&mut self, offset: usize, data: &[u8]) -> DevResult;
    /// Erase the block starting at `offset` back to all ones.
    fn erase(&mut self, offset: usize) -> DevResult;
}

pub struct FlashDisk<F: NorFlash> {
    flash: F,
    geometry: Geometry,
    sectors_per_block: u32,
    cache: Vec<u8>,
    cached_block: Option<u32>,
    dirty: bool,
    initialized: bool,
}

impl<F: NorFlash> Debug for FlashDisk<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlashDisk")
            .field("flash", &self.flash)
            .field("geometry", &self.geometry)
            .field("cached_block", &self.cached_block)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl<F: NorFlash> FlashDisk<F> {
    /// Split `flash` into `sector_size` sectors. The erase size must be a
    /// whole number of sectors.
    pub fn new(flash: F, sector_size: usize) -> DiskResult<Self> {
        let erase_size = flash.erase_size();
        if !is_valid_sector_size(sector_size)
            || erase_size == 0
            || erase_size % sector_size != 0
            || flash.capacity() % erase_size != 0
        {
            warn!(
                "{}: cannot map {} byte sectors on {} byte erase blocks",
                flash.name(),
                sector_size,
                erase_size
            );
            return Err(DiskError::ParamError);
        }
        let sector_count =
            u32::try_from(flash.capacity() / sector_size).map_err(|_| DiskError::ParamError)?;
        Ok(Self {
            geometry: Geometry::new(sector_size, sector_count),
            sectors_per_block: (erase_size / sector_size) as u32,
            cache: vec![FLASH_ERASED_BYTE; erase_size],
            cached_block: None,
            dirty: false,
            initialized: false,
            flash,
        })
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Write back the cache and hand the part back.
    pub fn into_inner(mut self) -> DiskResult<F> {
        self.flush()?;
        Ok(self.flash)
    }

    fn ensure_ready(&self) -> DiskResult {
        if self.initialized {
            Ok(())
        } else {
            Err(DiskError::NotReady)
        }
    }

    fn block_offset(&self, block: u32) -> usize {
        block as usize * self.cache.len()
    }

    fn flush(&mut self) -> DiskResult {
        if let (Some(block), true) = (self.cached_block, self.dirty) {
            let offset = self.block_offset(block);
            debug!("{}: write back erase block {}", self.flash.name(), block);
            self.flash.erase(offset).map_err(as_disk_err)?;
            self.flash.program(offset, &self.cache).map_err(as_disk_err)?;
            self.dirty = false;
        }
        Ok(())
    }

    fn load_block(&mut self, block: u32) -> DiskResult {
        if self.cached_block == Some(block) {
            return Ok(());
        }
        self.flush()?;
        self.cached_block = None;
        let offset = self.block_offset(block);
        self.flash.read(offset, &mut self.cache).map_err(as_disk_err)?;
        self.cached_block = Some(block);
        Ok(())
    }

    /// Byte range of `lba` inside its erase block
    fn offset_in_block(&self, lba: Lba) -> core::ops::Range<usize> {
        let size = self.geometry.sector_size;
        let start = (lba % self.sectors_per_block) as usize * size;
        start..start + size
    }

    fn erase_range(&mut self, start: Lba, end: Lba) -> DiskResult {
        let spb = self.sectors_per_block;
        let size = self.geometry.sector_size;
        let mut sector = start;
        loop {
            let block = sector / spb;
            let first = block * spb;
            let last = first + spb - 1;
            if sector == first && end >= last {
                if self.cached_block == Some(block) {
                    self.cached_block = None;
                    self.dirty = false;
                }
                self.flash
                    .erase(self.block_offset(block))
                    .map_err(as_disk_err)?;
            } else {
                // Partial block, blank the sectors through the cache
                self.load_block(block)?;
                let from = (sector - first) as usize * size;
                let to = (end.min(last) - first + 1) as usize * size;
                self.cache[from..to].fill(FLASH_ERASED_BYTE);
                self.dirty = true;
            }
            if last >= end {
                return Ok(());
            }
            sector = last + 1;
        }
    }
}

impl<F: NorFlash> DiskDriver for FlashDisk<F> {
    fn name(&self) -> &str {
        self.flash.name()
    }

    fn initialize(&mut self) -> DiskStatus {
        if !self.initialized {
            match self.flash.init() {
                Ok(()) => {
                    self.initialized = true;
                    debug!(
                        "{}: {} sectors, {} per erase block",
                        self.flash.name(),
                        self.geometry.sector_count,
                        self.sectors_per_block
                    );
                }
                Err(e) => warn!("{}: init failed: {:?}", self.flash.name(), e),
            }
        }
        self.status()
    }

    fn status(&self) -> DiskStatus {
        if self.initialized {
            DiskStatus::READY
        } else {
            DiskStatus::NOINIT
        }
    }

    fn read(&mut self, buf: &mut [u8], sector: Lba, count: u16) -> DiskResult {
        self.ensure_ready()?;
        let len = self.geometry.check_transfer(buf.len(), sector, count)?;
        trace!("{}: read {} x{}", self.flash.name(), sector, count);
        let size = self.geometry.sector_size;
        for (i, chunk) in buf[..len].chunks_exact_mut(size).enumerate() {
            let lba = sector + i as u32;
            if self.cached_block == Some(lba / self.sectors_per_block) {
                chunk.copy_from_slice(&self.cache[self.offset_in_block(lba)]);
            } else {
                self.flash
                    .read(lba as usize * size, chunk)
                    .map_err(as_disk_err)?;
            }
        }
        Ok(())
    }

    #[cfg(feature = "write")]
    fn write(&mut self, buf: &[u8], sector: Lba, count: u16) -> DiskResult {
        self.ensure_ready()?;
        let len = self.geometry.check_transfer(buf.len(), sector, count)?;
        trace!("{}: write {} x{}", self.flash.name(), sector, count);
        let size = self.geometry.sector_size;
        for (i, chunk) in buf[..len].chunks_exact(size).enumerate() {
            let lba = sector + i as u32;
            self.load_block(lba / self.sectors_per_block)?;
            let at = self.offset_in_block(lba);
            self.cache[at].copy_from_slice(chunk);
            self.dirty = true;
        }
        Ok(())
    }

    fn ioctl(&mut self, ctrl: Ioctl) -> DiskResult<IoctlReply> {
        self.ensure_ready()?;
        match ctrl {
            Ioctl::Sync => {
                self.flush()?;
                Ok(IoctlReply::None)
            }
            Ioctl::GetSectorCount => Ok(IoctlReply::SectorCount(self.geometry.sector_count)),
            Ioctl::GetSectorSize => Ok(IoctlReply::SectorSize(self.geometry.sector_size_u16()?)),
            Ioctl::GetBlockSize => Ok(IoctlReply::BlockSize(self.sectors_per_block)),
            Ioctl::EraseSectors { start, end } => {
                self.geometry.check_erase(start, end)?;
                self.erase_range(start, end)?;
                Ok(IoctlReply::None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 4 KiB erase blocks, 8 sectors each, 4 blocks
    fn ready() -> FlashDisk<SimFlash> {
        let mut disk = FlashDisk::new(SimFlash::new(4096, 4), 512).unwrap();
        assert_eq!(disk.initialize(), DiskStatus::READY);
        disk
    }

    #[test]
    fn geometry() {
        let mut disk = ready();
        assert_eq!(disk.ioctl(Ioctl::GetSectorCount), Ok(IoctlReply::SectorCount(32)));
        assert_eq!(disk.ioctl(Ioctl::GetSectorSize), Ok(IoctlReply::SectorSize(512)));
        assert_eq!(disk.ioctl(Ioctl::GetBlockSize), Ok(IoctlReply::BlockSize(8)));
    }

    #[test]
    fn rejects_misaligned_sectors() {
        assert!(FlashDisk::new(SimFlash::new(4096, 4), 8192).is_err());
        assert!(FlashDisk::new(SimFlash::new(1536, 4), 1024).is_err());
    }

    #[test]
    fn blank_flash_reads_erased() {
        let mut disk = ready();
        let mut buf = [0u8; 512];
        disk.read(&mut buf, 31, 1).unwrap();
        assert!(buf.iter().all(|&b| b == FLASH_ERASED_BYTE));
    }

    #[cfg(feature = "write")]
    #[test]
    fn writes_are_cached_until_sync() {
        let mut disk = ready();
        let data = [0x11u8; 512];
        disk.write(&data, 3, 1).unwrap();

        // Not on the part yet, but reads see it
        assert!(disk.flash().contents()[3 * 512..4 * 512]
            .iter()
            .all(|&b| b == FLASH_ERASED_BYTE));
        let mut back = [0u8; 512];
        disk.read(&mut back, 3, 1).unwrap();
        assert_eq!(back, data);

        disk.ioctl(Ioctl::Sync).unwrap();
        assert_eq!(&disk.flash().contents()[3 * 512..4 * 512], &data[..]);
        assert_eq!(disk.flash().erase_cycles(0), 1);

        // A clean cache is not written back again
        disk.ioctl(Ioctl::Sync).unwrap();
        assert_eq!(disk.flash().erase_cycles(0), 1);
    }

    #[cfg(feature = "write")]
    #[test]
    fn moving_to_another_block_writes_back() {
        let mut disk = ready();
        disk.write(&[0x22u8; 512], 0, 1).unwrap();
        disk.write(&[0x33u8; 512], 8, 1).unwrap();
        assert!(disk.flash().contents()[..512].iter().all(|&b| b == 0x22));
        assert_eq!(disk.flash().erase_cycles(4096), 0);

        let flash = disk.into_inner().unwrap();
        assert!(flash.contents()[4096..4096 + 512].iter().all(|&b| b == 0x33));
    }

    #[cfg(feature = "write")]
    #[test]
    fn rewrite_sets_bits_back() {
        let mut disk = ready();
        disk.write(&[0x00u8; 512], 5, 1).unwrap();
        disk.ioctl(Ioctl::Sync).unwrap();
        disk.write(&[0xF0u8; 512], 5, 1).unwrap();
        disk.ioctl(Ioctl::Sync).unwrap();
        let mut back = [0u8; 512];
        disk.read(&mut back, 5, 1).unwrap();
        assert!(back.iter().all(|&b| b == 0xF0));
    }

    #[cfg(feature = "write")]
    #[test]
    fn spanning_write() {
        let mut disk = ready();
        let data: Vec<u8> = (0..4 * 512).map(|i| (i / 512) as u8).collect();
        disk.write(&data, 6, 4).unwrap();
        disk.ioctl(Ioctl::Sync).unwrap();
        let mut back = vec![0u8; 4 * 512];
        disk.read(&mut back, 6, 4).unwrap();
        assert_eq!(back, data);
    }

    #[cfg(feature = "write")]
    #[test]
    fn erase_whole_and_partial_blocks() {
        let mut disk = ready();
        let zeros = vec![0u8; 32 * 512];
        disk.write(&zeros, 0, 32).unwrap();
        disk.ioctl(Ioctl::Sync).unwrap();

        // Sectors 4..=19: half of block 0, all of block 1, half of block 2
        disk.ioctl(Ioctl::EraseSectors { start: 4, end: 19 }).unwrap();
        disk.ioctl(Ioctl::Sync).unwrap();

        let contents = disk.flash().contents();
        assert!(contents[..4 * 512].iter().all(|&b| b == 0));
        assert!(contents[4 * 512..20 * 512].iter().all(|&b| b == FLASH_ERASED_BYTE));
        assert!(contents[20 * 512..].iter().all(|&b| b == 0));
    }

    #[test]
    fn bad_erase_range() {
        let mut disk = ready();
        assert_eq!(
            disk.ioctl(Ioctl::EraseSectors { start: 8, end: 32 }),
            Err(DiskError::ParamError)
        );
    }

    #[test]
    fn not_ready_before_initialize() {
        let mut disk = FlashDisk::new(SimFlash::new(4096, 1), 512).unwrap();
        assert_eq!(disk.status(), DiskStatus::NOINIT);
        assert_eq!(disk.ioctl(Ioctl::Sync), Err(DiskError::NotReady));
    }
}
