use core::cell::Cell;
use core::fmt::Debug;

use crate::consts::MAX_SECTOR_SIZE;
use crate::drivers::DiskManager;
use crate::error::{DiskError, DiskResult};
use crate::ioctl::Ioctl;
use crate::Lba;

/// Byte addressed view of one registered drive.
///
/// Keeps a cursor and turns byte reads and writes into whole sector
/// transfers, with read-modify-write for partial sectors. This is the shape
/// filesystem libraries that want `Read + Write + Seek` expect.
pub struct Disk<'a> {
    disks: &'a DiskManager,
    pdrv: u8,
    sector_size: usize,
    sector_count: u32,
    sector: Cell<Lba>,
    offset: Cell<usize>,
}

impl Debug for Disk<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Disk")
            .field("pdrv", &self.pdrv)
            .field("sector", &self.sector.get())
            .field("offset", &self.offset.get())
            .finish()
    }
}

impl<'a> Disk<'a> {
    /// Open an initialized drive.
    pub fn open(disks: &'a DiskManager, pdrv: u8) -> DiskResult<Self> {
        let sector_size = disks.sector_size(pdrv)?;
        if sector_size > MAX_SECTOR_SIZE {
            return Err(DiskError::Error);
        }
        Ok(Self {
            disks,
            pdrv,
            sector_size,
            sector_count: disks.sector_count(pdrv)?,
            sector: Cell::new(0),
            offset: Cell::new(0),
        })
    }

    /// Get the size of the disk.
    pub fn size(&self) -> u64 {
        self.sector_count as u64 * self.sector_size as u64
    }

    /// Get the position of the cursor.
    pub fn position(&self) -> u64 {
        self.sector.get() as u64 * self.sector_size as u64 + self.offset.get() as u64
    }

    /// Set the position of the cursor. Positions past the end read as EOF.
    pub fn set_position(&self, pos: u64) {
        let sector = pos / self.sector_size as u64;
        self.sector.set(Lba::try_from(sector).unwrap_or(Lba::MAX));
        self.offset.set((pos % self.sector_size as u64) as usize);
    }

    fn at_end(&self) -> bool {
        self.sector.get() >= self.sector_count
    }

    fn advance(&self, count: usize) {
        self.offset.set(self.offset.get() + count);
        if self.offset.get() >= self.sector_size {
            self.sector.set(self.sector.get() + 1);
            self.offset.set(self.offset.get() - self.sector_size);
        }
    }

    /// Read within one sector, returns the number of bytes read.
    pub fn read_one(&self, buf: &mut [u8]) -> DiskResult<usize> {
        if self.at_end() || buf.is_empty() {
            return Ok(0);
        }
        let size = self.sector_size;
        let read_size = if self.offset.get() == 0 && buf.len() >= size {
            // whole sector
            self.disks.read(self.pdrv, &mut buf[..size], self.sector.get(), 1)?;
            size
        } else {
            // partial sector
            let mut data = [0u8; MAX_SECTOR_SIZE];
            let start = self.offset.get();
            let count = buf.len().min(size - start);

            self.disks.read(self.pdrv, &mut data[..size], self.sector.get(), 1)?;
            buf[..count].copy_from_slice(&data[start..start + count]);
            count
        };
        self.advance(read_size);
        Ok(read_size)
    }

    /// Write within one sector, returns the number of bytes written.
    #[cfg(feature = "write")]
    pub fn write_one(&self, buf: &[u8]) -> DiskResult<usize> {
        if self.at_end() || buf.is_empty() {
            return Ok(0);
        }
        let size = self.sector_size;
        let write_size = if self.offset.get() == 0 && buf.len() >= size {
            // whole sector
            self.disks.write(self.pdrv, &buf[..size], self.sector.get(), 1)?;
            size
        } else {
            // partial sector
            let mut data = [0u8; MAX_SECTOR_SIZE];
            let start = self.offset.get();
            let count = buf.len().min(size - start);

            self.disks.read(self.pdrv, &mut data[..size], self.sector.get(), 1)?;
            data[start..start + count].copy_from_slice(&buf[..count]);
            self.disks.write(self.pdrv, &data[..size], self.sector.get(), 1)?;
            count
        };
        self.advance(write_size);
        Ok(write_size)
    }

    /// Fill `buf` from the cursor, stopping early only at the end of the disk.
    pub fn read(&self, mut buf: &mut [u8]) -> DiskResult<usize> {
        let mut read_len = 0;
        while !buf.is_empty() {
            match self.read_one(buf)? {
                0 => break,
                n => {
                    let tmp = buf;
                    buf = &mut tmp[n..];
                    read_len += n;
                }
            }
        }
        Ok(read_len)
    }

    #[cfg(feature = "write")]
    pub fn write(&self, mut buf: &[u8]) -> DiskResult<usize> {
        let mut write_len = 0;
        while !buf.is_empty() {
            match self.write_one(buf)? {
                0 => break,
                n => {
                    buf = &buf[n..];
                    write_len += n;
                }
            }
        }
        Ok(write_len)
    }

    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> DiskResult<usize> {
        self.set_position(offset);
        self.read(buf)
    }

    #[cfg(feature = "write")]
    pub fn write_at(&self, offset: u64, buf: &[u8]) -> DiskResult<usize> {
        self.set_position(offset);
        self.write(buf)
    }

    /// Push cached writes to the medium.
    pub fn flush(&self) -> DiskResult {
        self.disks.ioctl(self.pdrv, Ioctl::Sync).map(|_| ())
    }
}
