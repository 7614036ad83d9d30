// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The Mem represents the CPU's memory
//!
//! Contains some handy utils for reading and writing

use super::Adr;
use crate::error::{Error, Result};
use std::{
    fmt::{Display, Formatter},
    ops::Range,
};

/// Size of the Chip-8 address space, in bytes
pub const MEMORY_SIZE: usize = 0x1000;
/// Mask applied to every indirect address
pub const ADDRESS_MASK: Adr = 0x0fff;

/// The built-in hexadecimal font, 5 bytes per glyph
#[rustfmt::skip]
pub const FONT: [u8; 80] = [
    0xf0, 0x90, 0x90, 0x90, 0xf0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xf0, 0x10, 0xf0, 0x80, 0xf0, // 2
    0xf0, 0x10, 0xf0, 0x10, 0xf0, // 3
    0x90, 0x90, 0xf0, 0x10, 0x10, // 4
    0xf0, 0x80, 0xf0, 0x10, 0xf0, // 5
    0xf0, 0x80, 0xf0, 0x90, 0xf0, // 6
    0xf0, 0x10, 0x20, 0x40, 0x40, // 7
    0xf0, 0x90, 0xf0, 0x90, 0xf0, // 8
    0xf0, 0x90, 0xf0, 0x10, 0xf0, // 9
    0xf0, 0x90, 0xf0, 0x90, 0x90, // A
    0xe0, 0x90, 0xe0, 0x90, 0xe0, // B
    0xf0, 0x80, 0x80, 0x80, 0xf0, // C
    0xe0, 0x90, 0x90, 0x90, 0xe0, // D
    0xf0, 0x80, 0xf0, 0x80, 0xf0, // E
    0xf0, 0x80, 0xf0, 0x80, 0x80, // F
];

/// Represents a named region in memory
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// Character ROM (but writable!)
    Charset,
    /// Program memory
    Program,
    #[doc(hidden)]
    /// Total number of named regions
    Count,
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Charset => "Charset",
                Region::Program => "Program",
                _ => "",
            }
        )
    }
}

/// 4 KiB of memory, with named regions for the font and the program
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mem {
    memory: Vec<u8>,
    region: [Option<Range<usize>>; Region::Count as usize],
}

impl Mem {
    /// Constructs a cleared memory with the font loaded at `font`,
    /// and program memory starting at `program`
    /// # Examples
    /// ```rust
    /// # use chirpnet::cpu::mem::*;
    /// let mem = Mem::new(0x50, 0x200);
    /// assert_eq!(MEMORY_SIZE, mem.len());
    /// assert_eq!(Some(&FONT[..]), mem.get_region(Region::Charset));
    /// ```
    pub fn new(font: Adr, program: Adr) -> Self {
        let font = font as usize & ADDRESS_MASK as usize;
        let program = program as usize & ADDRESS_MASK as usize;
        let mut mem = Mem {
            memory: vec![0; MEMORY_SIZE],
            region: Default::default(),
        };
        mem.add_region(Region::Charset, font..(font + FONT.len()).min(MEMORY_SIZE))
            .add_region(Region::Program, program..MEMORY_SIZE);
        if let Some(charset) = mem.get_region_mut(Region::Charset) {
            charset.copy_from_slice(&FONT[..charset.len()]);
        }
        mem
    }

    /// Gets the length of the backing memory
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if the backing memory contains no elements
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Adds a named range ([Region]) to a [Mem]
    fn add_region(&mut self, name: Region, range: Range<usize>) -> &mut Self {
        if let Some(region) = self.region.get_mut(name as usize) {
            *region = Some(range);
        }
        self
    }

    /// Gets the start address of a named [Region]
    pub fn region_start(&self, name: Region) -> Option<Adr> {
        Some(self.region.get(name as usize)?.as_ref()?.start as Adr)
    }

    /// Loads data into the start of a named [Region]
    ///
    /// Returns [Error::RomTooLarge] if the data doesn't fit.
    /// # Examples
    /// ```rust
    /// # use chirpnet::cpu::mem::*;
    /// let mut mem = Mem::new(0x50, 0x200);
    /// mem.load_region(Region::Program, b"Hello, world!").unwrap();
    /// assert_eq!(b'H', mem.read(0x200));
    /// assert!(mem.load_region(Region::Program, &[0; 0xe01]).is_err());
    /// ```
    pub fn load_region(&mut self, name: Region, data: &[u8]) -> Result<&mut Self> {
        if let Some(region) = self.get_region_mut(name) {
            if data.len() > region.len() {
                return Err(Error::RomTooLarge {
                    len: data.len(),
                    max: region.len(),
                });
            }
            region[..data.len()].copy_from_slice(data);
        }
        Ok(self)
    }

    /// Fills a [Region] with zeroes
    ///
    /// If the region doesn't exist, that's okay.
    pub fn clear_region(&mut self, name: Region) -> &mut Self {
        if let Some(region) = self.get_region_mut(name) {
            region.fill(0)
        }
        self
    }

    /// Gets a slice of a named [Region] of memory
    pub fn get_region(&self, name: Region) -> Option<&[u8]> {
        self.memory.get(self.region.get(name as usize)?.clone()?)
    }

    /// Gets a mutable slice of a named [Region] of memory
    pub fn get_region_mut(&mut self, name: Region) -> Option<&mut [u8]> {
        self.memory.get_mut(self.region.get(name as usize)?.clone()?)
    }

    /// Gets a slice of raw memory, if the whole range is present
    pub fn get(&self, range: Range<usize>) -> Option<&[u8]> {
        self.memory.get(range)
    }

    /// Reads the big-endian instruction word at `addr`, if both bytes are present
    ///
    /// # Examples
    /// ```rust
    /// # use chirpnet::cpu::mem::*;
    /// let mut mem = Mem::new(0x50, 0x200);
    /// mem.load_region(Region::Program, &[0x12, 0x34]).unwrap();
    /// assert_eq!(Some(0x1234), mem.read_word(0x200));
    /// assert_eq!(None, mem.read_word(0xfff));
    /// ```
    pub fn read_word(&self, addr: Adr) -> Option<u16> {
        let addr = addr as usize;
        match self.memory.get(addr..addr + 2)? {
            &[hi, lo] => Some(u16::from_be_bytes([hi, lo])),
            _ => None,
        }
    }

    /// Writes a big-endian word at `addr`, wrapping within the address space
    pub fn write_word(&mut self, addr: Adr, word: u16) {
        let [hi, lo] = word.to_be_bytes();
        self.write(addr, hi);
        self.write(addr.wrapping_add(1), lo);
    }

    /// Reads the byte at `addr & 0xfff`
    #[inline(always)]
    pub fn read(&self, addr: Adr) -> u8 {
        self.memory[(addr & ADDRESS_MASK) as usize]
    }

    /// Writes the byte at `addr & 0xfff`
    #[inline(always)]
    pub fn write(&mut self, addr: Adr, value: u8) {
        self.memory[(addr & ADDRESS_MASK) as usize] = value;
    }
}

impl Default for Mem {
    /// Memory with the font at `0x050` and the program at `0x200`
    fn default() -> Self {
        Mem::new(0x50, 0x200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_at_base() {
        let mem = Mem::new(0x80, 0x200);
        assert_eq!(Some(0x80), mem.region_start(Region::Charset));
        assert_eq!(mem.get(0x80..0xd0), Some(&FONT[..]));
        assert!(mem.get(0x50..0x80).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn eti660_program() {
        let mut mem = Mem::new(0x50, 0x600);
        mem.load_region(Region::Program, &[0xa, 0xb]).unwrap();
        assert_eq!(Some(0x600), mem.region_start(Region::Program));
        assert_eq!(Some(0x0a0b), mem.read_word(0x600));
        mem.clear_region(Region::Program);
        assert_eq!(Some(0), mem.read_word(0x600));
        // clearing the program leaves the font alone
        assert_eq!(Some(&FONT[..]), mem.get_region(Region::Charset));
    }

    #[test]
    fn rom_too_large() {
        let mut mem = Mem::default();
        match mem.load_region(Region::Program, &[0xff; MEMORY_SIZE - 0x1ff]) {
            Err(Error::RomTooLarge { len, max }) => {
                assert_eq!(MEMORY_SIZE - 0x1ff, len);
                assert_eq!(MEMORY_SIZE - 0x200, max);
            }
            other => unreachable!("{other:?}"),
        }
    }

    #[test]
    fn masked_access() {
        let mut mem = Mem::default();
        mem.write(0x1234, 0x56);
        assert_eq!(0x56, mem.read(0x234));
        mem.write_word(0xfff, 0xabcd);
        assert_eq!(0xab, mem.read(0xfff));
        assert_eq!(0xcd, mem.read(0x000));
    }

    #[test]
    fn region_display() {
        assert_eq!("Charset", Region::Charset.to_string());
        assert_eq!("Program", Region::Program.to_string());
    }
}
