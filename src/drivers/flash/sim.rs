use alloc::vec;
use alloc::vec::Vec;

use super::NorFlash;
use crate::consts::FLASH_ERASED_BYTE;
use crate::drivers::{DevError, DevResult};

/// NOR flash held in memory.
///
/// Programming can only clear bits and erasing works on whole erase
/// blocks, like the real part. Erase cycles are counted per block.
#[derive(Debug, Clone)]
pub struct SimFlash {
    data: Vec<u8>,
    erase_size: usize,
    erase_cycles: Vec<u32>,
}

impl SimFlash {
    /// Blank part of `erase_size * blocks` bytes.
    pub fn new(erase_size: usize, blocks: usize) -> Self {
        Self {
            data: vec![FLASH_ERASED_BYTE; erase_size * blocks],
            erase_size,
            erase_cycles: vec![0; blocks],
        }
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Erase count of the block holding `offset`
    pub fn erase_cycles(&self, offset: usize) -> u32 {
        self.erase_cycles[offset / self.erase_size]
    }

    fn check(&self, offset: usize, len: usize) -> DevResult {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(DevError::InvalidParam),
        }
    }
}

impl NorFlash for SimFlash {
    fn name(&self) -> &str {
        "sim-flash"
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn erase_size(&self) -> usize {
        self.erase_size
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> DevResult {
        self.check(offset, buf.len())?;
        buf.copy_from_slice(&self.data[offset..offset + buf.len()]);
        Ok(())
    }

    fn program(&mut self, offset: usize, data: &[u8]) -> DevResult {
        self.check(offset, data.len())?;
        for (cell, &byte) in self.data[offset..offset + data.len()].iter_mut().zip(data) {
            *cell &= byte;
        }
        Ok(())
    }

    fn erase(&mut self, offset: usize) -> DevResult {
        if offset % self.erase_size != 0 {
            return Err(DevError::InvalidParam);
        }
        self.check(offset, self.erase_size)?;
        self.data[offset..offset + self.erase_size].fill(FLASH_ERASED_BYTE);
        self.erase_cycles[offset / self.erase_size] += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_only_clears_bits() {
        let mut flash = SimFlash::new(64, 2);
        flash.program(0, &[0xF0]).unwrap();
        flash.program(0, &[0x3C]).unwrap();
        assert_eq!(flash.contents()[0], 0x30);
    }

    #[test]
    fn erase_restores_block() {
        let mut flash = SimFlash::new(64, 2);
        flash.program(64, &[0; 64]).unwrap();
        assert_eq!(flash.erase(65), Err(DevError::InvalidParam));
        flash.erase(64).unwrap();
        assert!(flash.contents()[64..].iter().all(|&b| b == FLASH_ERASED_BYTE));
        assert_eq!(flash.erase_cycles(64), 1);
        assert_eq!(flash.erase_cycles(0), 0);
    }

    #[test]
    fn bounds() {
        let mut flash = SimFlash::new(64, 1);
        let mut buf = [0u8; 8];
        assert_eq!(flash.read(60, &mut buf), Err(DevError::InvalidParam));
        assert_eq!(flash.program(usize::MAX, &buf), Err(DevError::InvalidParam));
        assert_eq!(flash.erase(64), Err(DevError::InvalidParam));
    }
}
