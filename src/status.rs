use bitflags::bitflags;

bitflags! {
    /// Drive status, the `DSTATUS` byte of the filesystem middleware.
    ///
    /// No flag set means initialized and ready.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DiskStatus: u8 {
        const NOINIT = 1 << 0; // not initialized, read/write refused
        const NODISK = 1 << 1; // no medium in the drive
        const PROTECT = 1 << 2; // medium is write protected
    }
}

impl DiskStatus {
    pub const READY: Self = Self::empty();

    /// Reads and writes may be issued.
    pub const fn is_ready(self) -> bool {
        !self.intersects(Self::NOINIT.union(Self::NODISK))
    }

    pub const fn is_writable(self) -> bool {
        self.is_ready() && !self.contains(Self::PROTECT)
    }
}
