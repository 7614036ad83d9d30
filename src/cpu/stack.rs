// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! A fixed-depth stack of subroutine return addresses

use super::Adr;
use crate::error::{Error, Result};

/// Nesting depth of the original RCA 1802 interpreter
pub const STACK_DEPTH: usize = 12;

/// A fixed-capacity stack of return addresses, with an explicit top-of-stack cursor
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Stack {
    slots: [Adr; STACK_DEPTH],
    top: usize,
}

impl Stack {
    /// Pushes a return address.
    ///
    /// Returns [Error::StackOverflow] if every level is in use;
    /// the stack is left untouched.
    /// # Examples
    /// ```rust
    /// # use chirpnet::cpu::stack::*;
    /// let mut stack = Stack::default();
    /// for addr in 0..STACK_DEPTH as u16 {
    ///     stack.push(addr).unwrap();
    /// }
    /// assert!(stack.push(0x200).is_err());
    /// assert_eq!(STACK_DEPTH, stack.len());
    /// ```
    pub fn push(&mut self, addr: Adr) -> Result<()> {
        let slot = self.slots.get_mut(self.top).ok_or(Error::StackOverflow {
            addr,
            depth: STACK_DEPTH,
        })?;
        *slot = addr;
        self.top += 1;
        Ok(())
    }

    /// Pops the most recent return address.
    ///
    /// Returns [Error::StackUnderflow] if the stack is empty.
    /// # Examples
    /// ```rust
    /// # use chirpnet::cpu::stack::*;
    /// let mut stack = Stack::default();
    /// stack.push(0x234).unwrap();
    /// assert_eq!(0x234, stack.pop().unwrap());
    /// assert!(stack.pop().is_err());
    /// ```
    pub fn pop(&mut self) -> Result<Adr> {
        self.top = self.top.checked_sub(1).ok_or(Error::StackUnderflow)?;
        Ok(self.slots[self.top])
    }

    /// Gets the number of return addresses on the stack
    pub fn len(&self) -> usize {
        self.top
    }

    /// Returns true if there is nothing to return to
    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Drops every return address
    pub fn clear(&mut self) {
        self.top = 0;
    }

    /// Gets the live part of the stack, oldest first
    pub fn as_slice(&self) -> &[Adr] {
        &self.slots[..self.top]
    }
}

impl Default for Stack {
    fn default() -> Self {
        Stack {
            slots: [0; STACK_DEPTH],
            top: 0,
        }
    }
}
