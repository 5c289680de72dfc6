mod timestamp;

pub use self::timestamp::{FatTimestamp, FAT_EPOCH_YEAR, FAT_MAX_YEAR};

use crate::consts::{NORTC_MDAY, NORTC_MON, NORTC_YEAR};

/// Fixed date reported when the board has no real-time clock
pub const NORTC_TIMESTAMP: FatTimestamp =
    match FatTimestamp::new(NORTC_YEAR, NORTC_MON, NORTC_MDAY, 0, 0, 0) {
        Some(ts) => ts,
        None => panic!("invalid no-RTC date"),
    };

/// Wall clock used to stamp file metadata.
///
/// Never used for control flow; callers must not expect it to be monotonic.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> FatTimestamp;
}

/// Any `Fn() -> FatTimestamp` closure reads as a clock
impl<F> TimeSource for F
where
    F: Fn() -> FatTimestamp + Send + Sync,
{
    fn now(&self) -> FatTimestamp {
        self()
    }
}

/// A clock that always reads the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimeSource(FatTimestamp);

impl FixedTimeSource {
    pub const fn new(ts: FatTimestamp) -> Self {
        Self(ts)
    }

    /// The no-RTC fallback
    pub const fn epoch() -> Self {
        Self(NORTC_TIMESTAMP)
    }
}

impl Default for FixedTimeSource {
    fn default() -> Self {
        Self::epoch()
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> FatTimestamp {
        self.0
    }
}
