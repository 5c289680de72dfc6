//! Build-time constants of the disk layer

/// Smallest sector size the filesystem middleware accepts.
pub const MIN_SECTOR_SIZE: usize = 512;
/// Largest sector size the filesystem middleware accepts.
pub const MAX_SECTOR_SIZE: usize = 4096;

pub const DEFAULT_SECTOR_SIZE: usize = 1usize << LOG2_DEFAULT_SECTOR_SIZE;
pub const LOG2_DEFAULT_SECTOR_SIZE: usize = 9;

/// Attempts for a block that failed with a transient error, first try excluded.
pub const TRANSFER_RETRIES: usize = 3;

/// Byte value of erased NOR flash.
pub const FLASH_ERASED_BYTE: u8 = 0xFF;

// Date reported when no real-time clock is available
pub const NORTC_YEAR: u16 = 2023;
pub const NORTC_MON: u8 = 1;
pub const NORTC_MDAY: u8 = 1;

/// Sector size check shared by every backend: a power of two inside the
/// accepted range.
pub const fn is_valid_sector_size(size: usize) -> bool {
    size.is_power_of_two() && size >= MIN_SECTOR_SIZE && size <= MAX_SECTOR_SIZE
}
