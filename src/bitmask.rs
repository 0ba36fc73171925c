//! Auto-growing bitmasks over `DynArray<usize>` blocks.
//!
//! Setting a bit past the current blocks grows the block array with
//! zeroed words; reading past it is simply `false`. Binary-string
//! rendering is most-significant-set-bit first, which is how the masks
//! read in debugging output.

use core::fmt;

use crate::dyn_array::DynArray;
use crate::tagged::AllocError;

/// Bits per storage block.
pub const BLOCK_BITS: usize = usize::BITS as usize;

/// A growable bitmask.
#[derive(Clone, Default)]
pub struct BitMask {
    blocks: DynArray<usize>,
}

/// A binary-string parse failed, or growing the mask did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitMaskParseError {
    /// A character other than `0` or `1`.
    InvalidCharacter(char),
    Alloc(AllocError),
}

impl fmt::Display for BitMaskParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitMaskParseError::InvalidCharacter(c) => {
                write!(f, "invalid bitmask character {:?}", c)
            }
            BitMaskParseError::Alloc(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for BitMaskParseError {}

impl From<AllocError> for BitMaskParseError {
    fn from(e: AllocError) -> Self {
        BitMaskParseError::Alloc(e)
    }
}

impl BitMask {
    /// Empty mask; no bits set, no blocks allocated.
    pub fn new() -> Self {
        Self {
            blocks: DynArray::new(),
        }
    }

    /// Number of storage blocks currently backing the mask.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Set the bit at `offset`, growing with zeroed blocks as needed.
    pub fn set(&mut self, offset: usize) -> Result<(), AllocError> {
        self.set_state(offset, true)
    }

    /// Clear the bit at `offset`. Clearing past the end still grows, so
    /// a later `highest_set` never reports phantom data.
    pub fn reset(&mut self, offset: usize) -> Result<(), AllocError> {
        self.set_state(offset, false)
    }

    pub fn set_state(&mut self, offset: usize, value: bool) -> Result<(), AllocError> {
        let block = offset / BLOCK_BITS;
        if block >= self.blocks.len() {
            self.blocks.resize(block + 1, 0)?;
        }
        let bit = 1usize << (offset % BLOCK_BITS);
        if value {
            self.blocks[block] |= bit;
        } else {
            self.blocks[block] &= !bit;
        }
        Ok(())
    }

    /// Whether the bit at `offset` is set; offsets past the blocks read
    /// as clear.
    pub fn test(&self, offset: usize) -> bool {
        let block = offset / BLOCK_BITS;
        match self.blocks.get(block) {
            Some(&word) => word & (1usize << (offset % BLOCK_BITS)) != 0,
            None => false,
        }
    }

    /// Whether every listed offset is set. Vacuously true for an empty
    /// list.
    pub fn test_all(&self, offsets: &[usize]) -> bool {
        offsets.iter().all(|&o| self.test(o))
    }

    /// Whether any listed offset is set.
    pub fn test_any(&self, offsets: &[usize]) -> bool {
        offsets.iter().any(|&o| self.test(o))
    }

    /// Offset of the highest set bit, if any bit is set at all.
    pub fn highest_set(&self) -> Option<usize> {
        for (i, &word) in self.blocks.iter().enumerate().rev() {
            if word != 0 {
                let top = BLOCK_BITS - 1 - word.leading_zeros() as usize;
                return Some(i * BLOCK_BITS + top);
            }
        }
        None
    }

    /// Render as a binary string from the highest set bit down to bit
    /// zero; an all-clear mask renders as `"0"`.
    pub fn to_binary_string(&self) -> String {
        match self.highest_set() {
            None => "0".to_string(),
            Some(top) => (0..=top).rev().map(|o| if self.test(o) { '1' } else { '0' }).collect(),
        }
    }

    /// Parse a binary string written most-significant-bit first.
    pub fn from_binary_string(s: &str) -> Result<BitMask, BitMaskParseError> {
        let mut mask = BitMask::new();
        let len = s.chars().count();
        for (i, c) in s.chars().enumerate() {
            let offset = len - 1 - i;
            match c {
                '0' => {}
                '1' => mask.set(offset)?,
                other => return Err(BitMaskParseError::InvalidCharacter(other)),
            }
        }
        Ok(mask)
    }
}

impl fmt::Debug for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitMask({})", self.to_binary_string())
    }
}
