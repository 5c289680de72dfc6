//! Disk manager
//!
//! One slot per media variant of the build, each behind its own lock: calls
//! on different media run independently, calls on the same media are
//! serialized.

use alloc::boxed::Box;

use humansize::{SizeFormatter, BINARY};
use log::{debug, info, trace, warn};
use spin::{Mutex, RwLock};

use super::DiskDriver;
use crate::error::{DiskError, DiskResult};
use crate::ioctl::{Ioctl, IoctlReply};
use crate::media::{DiskMedia, NUMBER_OF_DISK};
use crate::status::DiskStatus;
use crate::timer::{FixedTimeSource, TimeSource};
use crate::Lba;

type Slot = Mutex<Option<Box<dyn DiskDriver>>>;

pub struct DiskManager {
    disks: [Slot; NUMBER_OF_DISK],
    clock: RwLock<Box<dyn TimeSource>>,
}

impl Default for DiskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskManager {
    /// No disks, clock stuck at the no-RTC date.
    pub fn new() -> Self {
        Self {
            disks: array_init::array_init(|_| Mutex::new(None)),
            clock: RwLock::new(Box::new(FixedTimeSource::epoch())),
        }
    }

    /// Attach `driver` to `media`, returning the driver it replaces.
    pub fn register(
        &self,
        media: DiskMedia,
        driver: Box<dyn DiskDriver>,
    ) -> Option<Box<dyn DiskDriver>> {
        info!("{}: attached {}", media, driver.name());
        self.disks[media.index()].lock().replace(driver)
    }

    pub fn unregister(&self, media: DiskMedia) -> Option<Box<dyn DiskDriver>> {
        self.disks[media.index()].lock().take()
    }

    pub fn is_registered(&self, media: DiskMedia) -> bool {
        self.disks[media.index()].lock().is_some()
    }

    pub fn set_time_source(&self, clock: Box<dyn TimeSource>) {
        *self.clock.write() = clock;
    }

    fn with_disk<R>(
        &self,
        pdrv: u8,
        f: impl FnOnce(&mut Box<dyn DiskDriver>) -> DiskResult<R>,
    ) -> DiskResult<R> {
        let media = DiskMedia::try_from(pdrv).map_err(|e| {
            warn!("no media with id {}", pdrv);
            e
        })?;
        let mut slot = self.disks[media.index()].lock();
        match slot.as_mut() {
            Some(disk) => f(disk),
            None => {
                warn!("{}: no driver attached", media);
                Err(DiskError::ParamError)
            }
        }
    }

    /// Bring up drive `pdrv`. Unknown drives report `NOINIT`.
    pub fn initialize(&self, pdrv: u8) -> DiskStatus {
        self.with_disk(pdrv, |disk| {
            let status = disk.initialize();
            if status.is_ready() {
                let capacity = disk
                    .ioctl(Ioctl::GetSectorCount)
                    .and_then(IoctlReply::sector_count)
                    .and_then(|count| {
                        let size = disk.ioctl(Ioctl::GetSectorSize)?.sector_size()?;
                        Ok(count as u64 * size as u64)
                    });
                if let Ok(bytes) = capacity {
                    info!(
                        "disk {}: {} ready, {}",
                        pdrv,
                        disk.name(),
                        SizeFormatter::new(bytes, BINARY)
                    );
                }
                let erase = disk.ioctl(Ioctl::GetBlockSize).and_then(IoctlReply::block_size);
                if let Ok(sectors) = erase {
                    debug!("disk {}: erase block of {} sectors", pdrv, sectors);
                }
            } else {
                warn!("disk {}: {} not ready: {:?}", pdrv, disk.name(), status);
            }
            Ok(status)
        })
        .unwrap_or(DiskStatus::NOINIT)
    }

    /// Status of drive `pdrv`. Unknown drives report `NOINIT`.
    pub fn status(&self, pdrv: u8) -> DiskStatus {
        self.with_disk(pdrv, |disk| Ok(disk.status()))
            .unwrap_or(DiskStatus::NOINIT)
    }

    pub fn read(&self, pdrv: u8, buf: &mut [u8], sector: Lba, count: u16) -> DiskResult {
        trace!("disk {}: read {} x{}", pdrv, sector, count);
        self.with_disk(pdrv, |disk| disk.read(buf, sector, count))
    }

    #[cfg(feature = "write")]
    pub fn write(&self, pdrv: u8, buf: &[u8], sector: Lba, count: u16) -> DiskResult {
        trace!("disk {}: write {} x{}", pdrv, sector, count);
        self.with_disk(pdrv, |disk| disk.write(buf, sector, count))
    }

    pub fn ioctl(&self, pdrv: u8, ctrl: Ioctl) -> DiskResult<IoctlReply> {
        trace!("disk {}: {:?}", pdrv, ctrl);
        self.with_disk(pdrv, |disk| disk.ioctl(ctrl))
    }

    pub fn sector_size(&self, pdrv: u8) -> DiskResult<usize> {
        Ok(self.ioctl(pdrv, Ioctl::GetSectorSize)?.sector_size()? as usize)
    }

    pub fn sector_count(&self, pdrv: u8) -> DiskResult<u32> {
        self.ioctl(pdrv, Ioctl::GetSectorCount)?.sector_count()
    }

    /// Current time in the packed FAT layout
    pub fn get_fattime(&self) -> u32 {
        self.clock.read().now().bits()
    }
}

#[cfg(all(test, feature = "ram-drive"))]
mod tests {
    use super::*;
    use crate::drivers::RamDisk;
    use crate::timer::FatTimestamp;

    fn manager() -> DiskManager {
        let disks = DiskManager::new();
        assert!(disks.register(DiskMedia::RamDisk, Box::new(RamDisk::new(16).unwrap())).is_none());
        disks
    }

    const RAM: u8 = DiskMedia::RamDisk.id();

    #[test]
    fn unknown_ids() {
        let disks = manager();
        let bad = NUMBER_OF_DISK as u8;
        let mut buf = [0u8; 512];
        assert_eq!(disks.initialize(bad), DiskStatus::NOINIT);
        assert_eq!(disks.status(bad), DiskStatus::NOINIT);
        assert_eq!(disks.read(bad, &mut buf, 0, 1), Err(DiskError::ParamError));
        assert_eq!(disks.ioctl(bad, Ioctl::Sync), Err(DiskError::ParamError));
    }

    #[test]
    fn unregistered_media() {
        let disks = DiskManager::new();
        let mut buf = [0u8; 512];
        assert_eq!(disks.status(RAM), DiskStatus::NOINIT);
        assert_eq!(disks.read(RAM, &mut buf, 0, 1), Err(DiskError::ParamError));
    }

    #[test]
    fn initialize_then_ready() {
        let disks = manager();
        assert_eq!(disks.status(RAM), DiskStatus::NOINIT);
        assert!(disks.initialize(RAM).is_ready());
        assert!(disks.status(RAM).is_ready());
        assert_eq!(disks.sector_count(RAM), Ok(16));
        assert_eq!(disks.sector_size(RAM), Ok(512));
    }

    #[test]
    fn replace_and_unregister() {
        let disks = manager();
        disks.initialize(RAM);
        let old = disks.register(DiskMedia::RamDisk, Box::new(RamDisk::new(4).unwrap()));
        assert_eq!(old.map(|d| d.status()), Some(DiskStatus::READY));
        assert_eq!(disks.status(RAM), DiskStatus::NOINIT);
        assert!(disks.unregister(DiskMedia::RamDisk).is_some());
        assert!(!disks.is_registered(DiskMedia::RamDisk));
    }

    #[test]
    fn fattime_follows_clock() {
        let disks = DiskManager::new();
        assert_eq!(disks.get_fattime(), FixedTimeSource::epoch().now().bits());
        let ts = FatTimestamp::new(2031, 12, 24, 18, 0, 0).unwrap();
        disks.set_time_source(Box::new(move || ts));
        assert_eq!(disks.get_fattime(), ts.bits());
    }

    #[test]
    fn manager_is_shareable() {
        fn assert_sync<T: Sync + Send>() {}
        assert_sync::<DiskManager>();
    }
}
