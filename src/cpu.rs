// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Decodes and runs instructions


pub mod behavior;
pub mod flags;
pub mod instruction;
pub mod mem;
pub mod quirks;
pub mod stack;

use self::{
    flags::Flags,
    instruction::{
        disassembler::{Dis, Disassembler},
        Insn,
    },
    mem::{Mem, Region::*},
    stack::Stack,
};
use crate::{
    error::{Error, Result},
    io::Peripherals,
    screen::Screen,
};
use imperative_rs::InstructionSet;
use std::fmt::Debug;

type Reg = usize;
type Adr = u16;
type Nib = u8;

/// The outcome of a single [CPU::tick]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// The instruction ran to completion
    Continue,
    /// `Fx0A` found no key held, and rewound the program counter to try again
    KeyWait,
    /// The program jumped to itself, and the peripherals have been shut down
    Halt,
}

/// Represents the internal state of the CPU interpreter
#[derive(Clone, PartialEq)]
pub struct CPU {
    /// Flags that control how the CPU behaves, but which aren't inherent to the
    /// chip-8. Includes [Quirks](quirks::Quirks), infinite loop handling, etc.
    pub flags: Flags,
    // memory
    mem: Mem,
    font: Adr,
    start: Adr,
    stack: Stack,
    rom: Vec<u8>,
    // registers
    pc: Adr,
    i: Adr,
    v: [u8; 16],
    // Execution data
    cycle: usize,
    disassembler: Dis,
}

// public interface
impl CPU {
    /// Constructs a new CPU, taking all configurable parameters
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let cpu = CPU::new(
    ///     0x50,   // font location
    ///     0x600,  // start of program
    ///     Flags::default()
    /// );
    /// assert_eq!(0x600, cpu.pc());
    /// ```
    pub fn new(font: Adr, pc: Adr, flags: Flags) -> Self {
        CPU {
            mem: Mem::new(font, pc),
            font,
            start: pc,
            pc,
            flags,
            ..Default::default()
        }
    }

    /// Loads a program into the CPU's program space
    pub fn load_program(&mut self, rom: impl AsRef<std::path::Path>) -> Result<&mut Self> {
        self.load_program_bytes(&std::fs::read(rom)?)
    }

    /// Loads bytes into the CPU's program space
    ///
    /// Returns [Error::RomTooLarge] if the program runs off the end of memory.
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[0x00, 0xe0]).unwrap();
    /// assert!(cpu.load_program_bytes(&[0; 0x1000]).is_err());
    /// ```
    pub fn load_program_bytes(&mut self, rom: &[u8]) -> Result<&mut Self> {
        self.mem.clear_region(Program);
        self.mem.load_region(Program, rom)?;
        self.rom = rom.to_vec();
        Ok(self)
    }

    /// Sets a general purpose register in the CPU.
    /// If the register doesn't exist, returns [Error::InvalidRegister]
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// // Create a new CPU, and set v4 to 0x41
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x4, 0x41).unwrap();
    /// assert!(cpu.set_v(0x10, 0).is_err());
    /// ```
    pub fn set_v(&mut self, reg: Reg, value: u8) -> Result<()> {
        if let Some(gpr) = self.v.get_mut(reg) {
            *gpr = value;
            Ok(())
        } else {
            Err(Error::InvalidRegister { reg })
        }
    }

    /// Gets a slice of the entire general purpose registers
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x0, 0x41).unwrap();
    /// assert_eq!(
    ///     cpu.v(),
    ///     [0x41, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    /// )
    /// ```
    pub fn v(&self) -> &[u8] {
        self.v.as_slice()
    }

    /// Gets the program counter
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let cpu = CPU::default();
    /// assert_eq!(0x200, cpu.pc());
    /// ```
    pub fn pc(&self) -> Adr {
        self.pc
    }

    /// Gets the I register
    pub fn i(&self) -> Adr {
        self.i
    }

    /// Gets the return addresses on the call stack, oldest first
    pub fn stack(&self) -> &[Adr] {
        self.stack.as_slice()
    }

    /// Gets the CPU's memory
    pub fn mem(&self) -> &Mem {
        &self.mem
    }

    /// Gets the number of cycles the CPU has executed
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let cpu = CPU::default();
    /// assert_eq!(0x0, cpu.cycle());
    /// ```
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Resets the CPU to the state it was in when the program was loaded.
    ///
    /// Touches the stack, pc, registers, cycle count, and program memory,
    /// which gets a fresh copy of the last loaded program.
    ///
    /// Does not touch [Flags], or the timers in [Peripherals].
    pub fn reset(&mut self) {
        self.mem.clear_region(Program);
        if let Err(e) = self.mem.load_region(Program, &self.rom) {
            log::warn!("{e}");
        }
        self.stack.clear();
        self.pc = self.start;
        self.i = 0;
        self.v = [0; 16];
        self.cycle = 0;
    }

    /// Executes a single instruction
    ///
    /// Returns [Error::OutOfBoundsFetch] if `pc` doesn't point at a whole instruction,
    /// and [Error::MachineCodeUnsupported] if the program calls a machine code routine.
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// # use chirpnet::io::Peripherals;
    /// # let io = Peripherals::new(std::net::UdpSocket::bind("127.0.0.1:0").unwrap());
    /// let mut cpu = CPU::default();
    /// let mut screen = Screen::default();
    /// cpu.load_program_bytes(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// assert_eq!(Step::Continue, cpu.tick(&mut screen, &io).unwrap());
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(Step::Halt, cpu.tick(&mut screen, &io).unwrap());
    /// ```
    pub fn tick(&mut self, screen: &mut Screen, io: &Peripherals) -> Result<Step> {
        let addr = self.pc;
        let word = self
            .mem
            .read_word(addr)
            .ok_or(Error::OutOfBoundsFetch { addr })?;
        self.cycle += 1;

        // Print opcode disassembly, except for jumps to self
        if self.flags.debug && word != 0x1000 | addr {
            self.disassembler.jump_from_v0 = self.flags.quirks.jump_from_v0();
            std::println!("{}", self.disassembler.trace(self.cycle, addr, word));
        }

        self.pc = self.pc.wrapping_add(2);
        match Insn::decode(&word.to_be_bytes()) {
            Ok((_, insn)) => Ok(self.execute(screen, io, insn)),
            Err(_) if word >> 12 == 0 => Err(Error::MachineCodeUnsupported { word, addr }),
            Err(_) => {
                log::trace!("ignoring unknown instruction {word:04x} at {addr:03x}");
                Ok(Step::Continue)
            }
        }
    }

    /// Dumps the current state of all CPU registers, and the cycle count
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let cpu = CPU::default();
    /// cpu.dump();
    /// ```
    /// outputs
    /// ```text
    /// PC: 0200, SP: 0, I: 0000
    /// v0: 00 v1: 00 v2: 00 v3: 00
    /// v4: 00 v5: 00 v6: 00 v7: 00
    /// v8: 00 v9: 00 vA: 00 vB: 00
    /// vC: 00 vD: 00 vE: 00 vF: 00
    /// CYC:      0
    /// ```
    pub fn dump(&self) {
        std::println!(
            "PC: {:04x}, SP: {}, I: {:04x}\n{}CYC: {:6}",
            self.pc,
            self.stack.len(),
            self.i,
            self.v
                .into_iter()
                .enumerate()
                .map(|(i, gpr)| {
                    format!(
                        "v{i:X}: {gpr:02x} {}",
                        match i % 4 {
                            3 => "\n",
                            _ => "",
                        }
                    )
                })
                .collect::<String>(),
            self.cycle,
        );
    }
}

impl Debug for CPU {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CPU")
            .field("flags", &self.flags)
            .field("font", &self.font)
            .field("stack", &self.stack)
            .field("pc", &self.pc)
            .field("i", &self.i)
            .field("v", &self.v)
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}

impl Default for CPU {
    /// Constructs a new CPU with sane defaults
    ///
    /// | value  | default | description
    /// |--------|---------|------------
    /// | font   |`0x0050` | Location of font memory.
    /// | pc     |`0x0200` | Start location. Generally 0x200 or 0x600.
    ///
    /// # Examples
    /// ```rust
    /// use chirpnet::*;
    /// let mut cpu = CPU::default();
    /// ```
    fn default() -> Self {
        CPU {
            flags: Flags::default(),
            mem: Mem::default(),
            font: 0x050,
            start: 0x200,
            stack: Stack::default(),
            rom: Vec::new(),
            pc: 0x200,
            i: 0,
            v: [0; 16],
            cycle: 0,
            disassembler: Dis::default(),
        }
    }
}
