// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Stores and displays the Chip-8's screen memory

use std::fmt::{Display, Formatter, Result};

/// Width of the Chip-8 display, in pixels
pub const WIDTH: usize = 64;
/// Height of the Chip-8 display, in pixels
pub const HEIGHT: usize = 32;

/// A monochrome bit plane, one byte per pixel
///
/// Pixels are addressed `(x, y)` from the top-left corner.
/// Every access is bounds-checked: reads outside the plane are 0,
/// and writes outside the plane are dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Screen {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
}

impl Screen {
    /// Constructs a blank screen of the given dimensions
    ///
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let screen = Screen::new(64, 32);
    /// assert_eq!(screen, Screen::default());
    /// ```
    pub fn new(width: usize, height: usize) -> Screen {
        Screen {
            pixels: vec![0; width * height],
            width,
            height,
        }
    }

    /// Gets the width of the screen, in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Gets the height of the screen, in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Gets the raw pixel plane, row-major
    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    /// Gets the value of the pixel at `(x, y)`, or 0 if it's off-screen
    ///
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let mut screen = Screen::default();
    /// screen.xor(3, 4);
    /// assert_eq!(1, screen.pixel(3, 4));
    /// assert_eq!(0, screen.pixel(64, 4));
    /// ```
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.index(x, y).map_or(0, |idx| self.pixels[idx])
    }

    /// Flips the pixel at `(x, y)`.
    ///
    /// Returns `None` if the pixel is off-screen, otherwise whether
    /// the pixel went from set to unset (a collision).
    ///
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let mut screen = Screen::default();
    /// assert_eq!(Some(false), screen.xor(0, 0));
    /// assert_eq!(Some(true), screen.xor(0, 0));
    /// assert_eq!(None, screen.xor(0, 32));
    /// ```
    pub fn xor(&mut self, x: usize, y: usize) -> Option<bool> {
        let idx = self.index(x, y)?;
        let was_set = self.pixels[idx] != 0;
        self.pixels[idx] ^= 1;
        Some(was_set)
    }

    /// Turns every pixel off
    pub fn clear(&mut self) {
        self.pixels.fill(0)
    }

    /// Packs the screen into `width * height / 8` bytes (rounded up), row-major, most significant bit first
    ///
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let mut screen = Screen::default();
    /// screen.xor(0, 0);
    /// screen.xor(9, 0);
    /// let packed = screen.pack();
    /// assert_eq!(64 * 32 / 8, packed.len());
    /// assert_eq!(&[0x80, 0x40], &packed[0..2]);
    /// ```
    pub fn pack(&self) -> Vec<u8> {
        let mut packed = vec![0u8; self.pixels.len().div_ceil(8)];
        for (idx, &pixel) in self.pixels.iter().enumerate() {
            packed[idx / 8] |= (pixel & 1) << (7 - idx % 8);
        }
        packed
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

impl Default for Screen {
    fn default() -> Self {
        Screen::new(WIDTH, HEIGHT)
    }
}

impl Display for Screen {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for row in self.pixels.chunks(self.width.max(1)) {
            for &pixel in row {
                write!(f, "{}", if pixel == 0 { "░░" } else { "██" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
