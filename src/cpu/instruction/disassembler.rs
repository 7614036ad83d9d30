// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! A disassembler for Chip-8 opcodes, used by the live debug trace
use super::Insn;
use imperative_rs::InstructionSet;
use owo_colors::{OwoColorize, Style};

/// Disassembles Chip-8 instructions
pub trait Disassembler {
    /// Disassemble a single instruction
    fn once(&self, insn: u16) -> String;

    /// Formats one line of the live trace: cycle count, address, disassembly, raw word
    fn trace(&self, cycle: usize, addr: u16, insn: u16) -> String {
        format!(
            "{:3} {addr:03x}: {:<36} {}",
            cycle.bright_black(),
            self.once(insn),
            format_args!("{insn:04x}").bright_black(),
        )
    }
}

/// Disassembles Chip-8 instructions, printing them in the provided [owo_colors::Style]s
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dis {
    /// Styles words that aren't instructions (machine code calls, data)
    pub invalid: Style,
    /// Styles valid instruction
    pub normal: Style,
    /// Set when `Bxnn` offsets by v0 rather than vX
    pub jump_from_v0: bool,
}

impl Default for Dis {
    fn default() -> Self {
        Self {
            invalid: Style::new().bold().red(),
            normal: Style::new().green(),
            jump_from_v0: true,
        }
    }
}

impl Disassembler for Dis {
    fn once(&self, insn: u16) -> String {
        match Insn::decode(&insn.to_be_bytes()) {
            Ok((_, Insn::jmpr { A })) if !self.jump_from_v0 => format!(
                "{}",
                format_args!("jmp    ${A:03x}+v{:X}", A >> 8).style(self.normal)
            ),
            Ok((_, insn)) => format!("{}", insn.style(self.normal)),
            Err(_) => format!("{}", format_args!("inval  {insn:04x}").style(self.invalid)),
        }
    }
}
