// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Error type for Chirpnet

use thiserror::Error;

/// Result type, equivalent to [std::result::Result]<T, [enum@Error]>
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Chirpnet.
#[derive(Debug, Error)]
pub enum Error {
    /// Tried to push a return address onto a full stack
    #[error("stack overflow: could not push {addr:03x}, all {depth} levels in use")]
    StackOverflow {
        /// The return address that was dropped
        addr: u16,
        /// The capacity of the stack
        depth: usize,
    },
    /// Tried to pop a return address off an empty stack
    #[error("stack underflow: no return address to pop")]
    StackUnderflow,
    /// The program tried to call a native (COSMAC machine code) routine
    #[error("machine code routine {word:04x} at {addr:03x} is not supported")]
    MachineCodeUnsupported {
        /// The offending word
        word: u16,
        /// The address of the offending word
        addr: u16,
    },
    /// Tried to fetch an instruction from outside of memory
    #[error("instruction fetch at {addr:04x} is out of bounds")]
    OutOfBoundsFetch {
        /// The value of the program counter
        addr: u16,
    },
    /// The program does not fit in memory at its load address
    #[error("rom of {len} bytes does not fit in the {max} bytes of program memory")]
    RomTooLarge {
        /// The length of the program
        len: usize,
        /// The available program memory
        max: usize,
    },
    /// Tried to press a key that doesn't exist
    #[error("tried to press key {key:X} which does not exist")]
    InvalidKey {
        /// The offending key
        key: usize,
    },
    /// Tried to get/set an out-of-bounds register
    #[error("tried to access register v{reg:X} which does not exist")]
    InvalidRegister {
        /// The offending register
        reg: usize,
    },
    /// A key state datagram was not exactly two bytes long
    #[error("illegal key state datagram of {len} bytes (expected 2 bytes)")]
    MalformedKeyDatagram {
        /// The length of the offending datagram
        len: usize,
    },
    /// Sending state to the peripheral failed
    #[error("could not update peripheral state (is the screen application running?): {0}")]
    PeripheralTransport(#[source] std::io::Error),
    /// Error originated in [rmp_serde]
    #[error(transparent)]
    Encode(#[from] rmp_serde::encode::Error),
    /// Error originated in [std::io]
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
