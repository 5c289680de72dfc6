//! Physical media a disk call can target
//!
//! The variant set is fixed by cargo features. Like the C enum it replaces,
//! ids are assigned in declaration order over the enabled variants only, so
//! a build with `sd-card` and `ram-drive` numbers them 0 and 1.

use core::fmt;

use crate::error::{DiskError, DiskResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DiskMedia {
    #[cfg(feature = "flash")]
    Flash,
    #[cfg(feature = "sd-card")]
    SdCard,
    #[cfg(feature = "usb-key")]
    UsbKey,
    #[cfg(feature = "ram-drive")]
    RamDisk,
}

/// Count of media compiled into this build.
pub const NUMBER_OF_DISK: usize = cfg!(feature = "flash") as usize
    + cfg!(feature = "sd-card") as usize
    + cfg!(feature = "usb-key") as usize
    + cfg!(feature = "ram-drive") as usize;

impl DiskMedia {
    /// Raw id passed across the disk interface.
    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "flash")]
            Self::Flash => "flash",
            #[cfg(feature = "sd-card")]
            Self::SdCard => "sd-card",
            #[cfg(feature = "usb-key")]
            Self::UsbKey => "usb-key",
            #[cfg(feature = "ram-drive")]
            Self::RamDisk => "ram-drive",
        }
    }

    /// All media of this build, in id order.
    pub fn iter() -> impl Iterator<Item = DiskMedia> {
        (0..NUMBER_OF_DISK as u8).filter_map(|id| Self::try_from(id).ok())
    }
}

impl TryFrom<u8> for DiskMedia {
    type Error = DiskError;

    fn try_from(id: u8) -> DiskResult<Self> {
        #[cfg(feature = "flash")]
        {
            if id == Self::Flash as u8 {
                return Ok(Self::Flash);
            }
        }
        #[cfg(feature = "sd-card")]
        {
            if id == Self::SdCard as u8 {
                return Ok(Self::SdCard);
            }
        }
        #[cfg(feature = "usb-key")]
        {
            if id == Self::UsbKey as u8 {
                return Ok(Self::UsbKey);
            }
        }
        #[cfg(feature = "ram-drive")]
        {
            if id == Self::RamDisk as u8 {
                return Ok(Self::RamDisk);
            }
        }
        Err(DiskError::ParamError)
    }
}

impl From<DiskMedia> for u8 {
    fn from(media: DiskMedia) -> Self {
        media.id()
    }
}

impl fmt::Display for DiskMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense() {
        let ids: alloc::vec::Vec<u8> = DiskMedia::iter().map(DiskMedia::id).collect();
        assert_eq!(ids.len(), NUMBER_OF_DISK);
        for (expected, id) in ids.into_iter().enumerate() {
            assert_eq!(expected as u8, id);
        }
    }

    #[test]
    fn round_trip_through_raw_id() {
        for media in DiskMedia::iter() {
            assert_eq!(DiskMedia::try_from(media.id()), Ok(media));
        }
    }

    #[test]
    fn out_of_range_id_is_param_error() {
        assert_eq!(
            DiskMedia::try_from(NUMBER_OF_DISK as u8),
            Err(DiskError::ParamError)
        );
        assert_eq!(DiskMedia::try_from(u8::MAX), Err(DiskError::ParamError));
    }

    #[cfg(all(feature = "flash", feature = "sd-card", feature = "usb-key", feature = "ram-drive"))]
    #[test]
    fn full_build_order() {
        assert_eq!(DiskMedia::Flash.id(), 0);
        assert_eq!(DiskMedia::SdCard.id(), 1);
        assert_eq!(DiskMedia::UsbKey.id(), 2);
        assert_eq!(DiskMedia::RamDisk.id(), 3);
        assert_eq!(NUMBER_OF_DISK, 4);
    }
}
