//! RAM drive

use alloc::vec;
use alloc::vec::Vec;

use log::{debug, trace, warn};

use super::{DiskDriver, Geometry};
use crate::consts::{is_valid_sector_size, DEFAULT_SECTOR_SIZE};
use crate::error::{DiskError, DiskResult};
use crate::ioctl::{Ioctl, IoctlReply};
use crate::status::DiskStatus;
use crate::Lba;

/// Sectors kept in heap memory. Contents are lost with the value.
#[derive(Debug)]
pub struct RamDisk {
    data: Vec<u8>,
    geometry: Geometry,
    initialized: bool,
    write_protected: bool,
}

impl RamDisk {
    /// A zeroed disk of `sector_count` default sized sectors.
    pub fn new(sector_count: u32) -> DiskResult<Self> {
        Self::with_sector_size(DEFAULT_SECTOR_SIZE, sector_count)
    }

    pub fn with_sector_size(sector_size: usize, sector_count: u32) -> DiskResult<Self> {
        if !is_valid_sector_size(sector_size) {
            warn!("ram disk: bad sector size {}", sector_size);
            return Err(DiskError::ParamError);
        }
        let geometry = Geometry::new(sector_size, sector_count);
        Ok(Self {
            data: vec![0; geometry.byte_len()?],
            geometry,
            initialized: false,
            write_protected: false,
        })
    }

    /// Wrap an existing image, e.g. a prebuilt FAT volume.
    pub fn from_image(image: Vec<u8>, sector_size: usize) -> DiskResult<Self> {
        if !is_valid_sector_size(sector_size) || image.len() % sector_size != 0 {
            warn!(
                "ram disk: image of {} bytes does not split into {} byte sectors",
                image.len(),
                sector_size
            );
            return Err(DiskError::ParamError);
        }
        let sector_count =
            u32::try_from(image.len() / sector_size).map_err(|_| DiskError::ParamError)?;
        Ok(Self {
            data: image,
            geometry: Geometry::new(sector_size, sector_count),
            initialized: false,
            write_protected: false,
        })
    }

    /// Refuse writes and erases from now on.
    pub fn write_protected(mut self, protected: bool) -> Self {
        self.write_protected = protected;
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_image(self) -> Vec<u8> {
        self.data
    }

    /// Byte offset of a sector already checked against the geometry. The
    /// whole image is addressable, so this cannot overflow.
    fn offset(&self, sector: Lba) -> usize {
        sector as usize * self.geometry.sector_size
    }

    fn ensure_ready(&self) -> DiskResult {
        if self.initialized {
            Ok(())
        } else {
            Err(DiskError::NotReady)
        }
    }
}

impl DiskDriver for RamDisk {
    fn name(&self) -> &str {
        "ram-disk"
    }

    fn initialize(&mut self) -> DiskStatus {
        if !self.initialized {
            debug!(
                "ram disk: {} sectors of {} bytes",
                self.geometry.sector_count, self.geometry.sector_size
            );
        }
        self.initialized = true;
        self.status()
    }

    fn status(&self) -> DiskStatus {
        let mut status = DiskStatus::empty();
        if !self.initialized {
            status |= DiskStatus::NOINIT;
        }
        if self.write_protected {
            status |= DiskStatus::PROTECT;
        }
        status
    }

    fn read(&mut self, buf: &mut [u8], sector: Lba, count: u16) -> DiskResult {
        self.ensure_ready()?;
        let len = self.geometry.check_transfer(buf.len(), sector, count)?;
        trace!("ram disk: read {} x{}", sector, count);
        let start = self.offset(sector);
        buf[..len].copy_from_slice(&self.data[start..start + len]);
        Ok(())
    }

    #[cfg(feature = "write")]
    fn write(&mut self, buf: &[u8], sector: Lba, count: u16) -> DiskResult {
        self.ensure_ready()?;
        if !self.status().is_writable() {
            return Err(DiskError::WriteProtected);
        }
        let len = self.geometry.check_transfer(buf.len(), sector, count)?;
        trace!("ram disk: write {} x{}", sector, count);
        let start = self.offset(sector);
        self.data[start..start + len].copy_from_slice(&buf[..len]);
        Ok(())
    }

    fn ioctl(&mut self, ctrl: Ioctl) -> DiskResult<IoctlReply> {
        self.ensure_ready()?;
        match ctrl {
            // Nothing is cached
            Ioctl::Sync => Ok(IoctlReply::None),
            Ioctl::GetSectorCount => Ok(IoctlReply::SectorCount(self.geometry.sector_count)),
            Ioctl::GetSectorSize => Ok(IoctlReply::SectorSize(self.geometry.sector_size_u16()?)),
            Ioctl::GetBlockSize => Ok(IoctlReply::BlockSize(1)),
            Ioctl::EraseSectors { start, end } => {
                self.geometry.check_erase(start, end)?;
                if self.write_protected {
                    return Err(DiskError::WriteProtected);
                }
                let from = self.offset(start);
                let to = self.offset(end) + self.geometry.sector_size;
                self.data[from..to].fill(0);
                Ok(IoctlReply::None)
            }
        }
    }
}
