//! Represents flags that aid in implementation but aren't a part of the Chip-8 architecture

use super::quirks::Quirks;

/// Represents flags that aid in operation, but aren't inherent to the CPU
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Flags {
    /// Set when debug (live disassembly) mode enabled
    pub debug: bool,
    /// Set when a jump-to-self should flush the peripherals and halt
    pub end_on_infinite_loop: bool,
    /// Set when a jump-to-self should restart the program.
    /// [Flags::end_on_infinite_loop] takes precedence.
    pub restart_on_infinite_loop: bool,
    /// Represents the set of emulator [Quirks] to enable
    pub quirks: Quirks,
}

impl Flags {
    /// Toggles debug mode
    ///
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(false, cpu.flags.debug);
    /// // Toggle debug mode
    /// cpu.flags.debug();
    /// assert_eq!(true, cpu.flags.debug);
    /// ```
    pub fn debug(&mut self) {
        self.debug = !self.debug
    }
}

impl Default for Flags {
    /// Ends on infinite loops, with ROM compatibility quirks
    fn default() -> Self {
        Flags {
            debug: false,
            end_on_infinite_loop: true,
            restart_on_infinite_loop: false,
            quirks: Quirks::default(),
        }
    }
}
