// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! This crate implements a Chip-8 interpreter as if it were a real CPU architecture,
//! with the screen, sound, and keypad living in another process, and reached over UDP.
//!
//! The [Chip8] runs the [CPU] against a [Screen] on the calling thread,
//! while a [Timer](timer::Timer) and a [KeyListener](io::KeyListener) run alongside it,
//! sharing state through [Peripherals](io::Peripherals).

pub mod cpu;
pub mod error;
pub mod io;
pub mod screen;
pub mod timer;

// Common imports for Chirpnet
pub use cpu::{
    flags::Flags,
    instruction::disassembler::{Dis, Disassembler},
    mem::Mem,
    quirks::Quirks,
    Step, CPU,
};
pub use error::{Error, Result};
pub use io::{IoConfig, IoState, Peripherals};
pub use screen::Screen;

use std::{
    sync::Arc,
    thread::JoinHandle,
    time::{Duration, Instant},
};

/// Holds the state of a Chip-8
#[derive(Debug)]
pub struct Chip8 {
    /// Contains the registers, flags, and memory of the Chip-8
    pub cpu: CPU,
    /// Contains the pixels of the Chip-8's display
    pub screen: Screen,
    /// Connects the Chip-8 to the outside world
    pub io: Arc<Peripherals>,
}

impl Chip8 {
    /// Builds a Chip-8 from a loaded [CPU] and its [Peripherals]
    pub fn new(cpu: CPU, io: Arc<Peripherals>) -> Self {
        Chip8 {
            cpu,
            screen: Screen::default(),
            io,
        }
    }

    /// Shows the (blank) screen, and starts the timer thread
    pub fn start(&self) -> Result<JoinHandle<()>> {
        self.io.update_screen(&self.screen);
        Ok(timer::Timer::spawn(self.io.clone())?)
    }

    /// Runs a single instruction
    pub fn step(&mut self) -> Result<Step> {
        self.cpu.tick(&mut self.screen, &self.io)
    }

    /// Runs instructions, one per `cycle`, until the program halts or fails
    pub fn run(&mut self, cycle: Duration) -> Result<()> {
        let mut ft = Instant::now();
        loop {
            if let Step::Halt = self.step()? {
                return Ok(());
            }
            std::thread::sleep(cycle.saturating_sub(ft.elapsed()));
            ft += cycle;
        }
    }
}
