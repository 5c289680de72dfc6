// FAT packed date and time, as returned by get_fattime()
//
//  31      25 24   21 20    16 15    11 10      5 4      0
// +----------+-------+--------+--------+---------+--------+
// | year-1980| month |  day   |  hour  | minute  | sec/2  |
// +----------+-------+--------+--------+---------+--------+
//
// The high half is the directory entry date field, the low half the time
// field.

use core::fmt;

pub const FAT_EPOCH_YEAR: u16 = 1980;
pub const FAT_MAX_YEAR: u16 = FAT_EPOCH_YEAR + 127;

const YEAR_SHIFT: u32 = 25;
const YEAR_MASK: u32 = 0x7F;
const MONTH_SHIFT: u32 = 21;
const MONTH_MASK: u32 = 0x0F;
const DAY_SHIFT: u32 = 16;
const DAY_MASK: u32 = 0x1F;
const HOUR_SHIFT: u32 = 11;
const HOUR_MASK: u32 = 0x1F;
const MINUTE_SHIFT: u32 = 5;
const MINUTE_MASK: u32 = 0x3F;
const SECOND2_MASK: u32 = 0x1F;

#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FatTimestamp(u32);

impl FatTimestamp {
    /// Pack a calendar date and time. Seconds are stored with a two second
    /// resolution, odd values round down.
    ///
    /// Returns `None` for anything the encoding cannot hold or that is not a
    /// real date.
    pub const fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Option<Self> {
        if year < FAT_EPOCH_YEAR || year > FAT_MAX_YEAR {
            return None;
        }
        if month == 0 || month > 12 || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        let bits = ((year - FAT_EPOCH_YEAR) as u32) << YEAR_SHIFT
            | (month as u32) << MONTH_SHIFT
            | (day as u32) << DAY_SHIFT
            | (hour as u32) << HOUR_SHIFT
            | (minute as u32) << MINUTE_SHIFT
            | (second as u32 / 2);
        Some(Self(bits))
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn year(self) -> u16 {
        FAT_EPOCH_YEAR + ((self.0 >> YEAR_SHIFT) & YEAR_MASK) as u16
    }

    pub const fn month(self) -> u8 {
        ((self.0 >> MONTH_SHIFT) & MONTH_MASK) as u8
    }

    pub const fn day(self) -> u8 {
        ((self.0 >> DAY_SHIFT) & DAY_MASK) as u8
    }

    pub const fn hour(self) -> u8 {
        ((self.0 >> HOUR_SHIFT) & HOUR_MASK) as u8
    }

    pub const fn minute(self) -> u8 {
        ((self.0 >> MINUTE_SHIFT) & MINUTE_MASK) as u8
    }

    pub const fn second(self) -> u8 {
        ((self.0 & SECOND2_MASK) * 2) as u8
    }

    /// Directory entry date field
    pub const fn date(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Directory entry time field
    pub const fn time(self) -> u16 {
        self.0 as u16
    }
}

const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

impl From<FatTimestamp> for u32 {
    fn from(ts: FatTimestamp) -> Self {
        ts.bits()
    }
}

impl fmt::Debug for FatTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FatTimestamp({} = {:#010x})", self, self.0)
    }
}

impl fmt::Display for FatTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_known_value() {
        // 2019-01-01 00:00:00, the stock FatFs no-RTC date
        let ts = FatTimestamp::new(2019, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(ts.bits(), (39 << 25) | (1 << 21) | (1 << 16));
        assert_eq!(ts.bits(), 0x4E21_0000);
    }

    #[test]
    fn fields_come_back() {
        let ts = FatTimestamp::new(2024, 2, 29, 23, 59, 58).unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 2);
        assert_eq!(ts.day(), 29);
        assert_eq!(ts.hour(), 23);
        assert_eq!(ts.minute(), 59);
        assert_eq!(ts.second(), 58);
        assert_eq!(u32::from(ts.date()) << 16 | u32::from(ts.time()), ts.bits());
    }

    #[test]
    fn odd_seconds_round_down() {
        let ts = FatTimestamp::new(2000, 6, 15, 12, 30, 45).unwrap();
        assert_eq!(ts.second(), 44);
    }

    #[test]
    fn rejects_unrepresentable() {
        assert!(FatTimestamp::new(1979, 12, 31, 0, 0, 0).is_none());
        assert!(FatTimestamp::new(2108, 1, 1, 0, 0, 0).is_none());
        assert!(FatTimestamp::new(2023, 2, 29, 0, 0, 0).is_none());
        assert!(FatTimestamp::new(2023, 13, 1, 0, 0, 0).is_none());
        assert!(FatTimestamp::new(2023, 4, 31, 0, 0, 0).is_none());
        assert!(FatTimestamp::new(2023, 1, 1, 24, 0, 0).is_none());
        assert!(FatTimestamp::new(2023, 1, 1, 0, 60, 0).is_none());
        assert!(FatTimestamp::new(2100, 2, 29, 0, 0, 0).is_none());
        assert!(FatTimestamp::new(2000, 2, 29, 0, 0, 0).is_some());
        assert!(FatTimestamp::new(2107, 12, 31, 23, 59, 59).is_some());
    }

    #[test]
    fn display() {
        let ts = FatTimestamp::new(2023, 7, 4, 9, 5, 3).unwrap();
        assert_eq!(alloc::format!("{}", ts), "2023-07-04 09:05:02");
    }
}
