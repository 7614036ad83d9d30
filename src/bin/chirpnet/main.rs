// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Chirpnet: A chip-8 interpreter in Rust, with a screen on the other end of a socket

use chirpnet::{error::Result, io::KeyListener, *};
use gumdrop::*;
use owo_colors::OwoColorize;
use std::{net::Ipv4Addr, path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

pub fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = Arguments::parse_args_default_or_exit();
    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.bold().red());
            ExitCode::FAILURE
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Load a ROM to run on Chirpnet.", required, free)]
    pub file: PathBuf,
    #[options(help = "Print this help message.")]
    help: bool,
    #[options(help = "Print each instruction as it runs.")]
    pub debug: bool,

    #[options(
        short = "c",
        help = "Use strict COSMAC VIP behavior for shifts, Fx1E, and DMA."
    )]
    pub cosmac: bool,
    #[options(
        short = "n",
        help = "Disable the ROM compatibility quirks for indexed jumps and DMA."
    )]
    pub no_compat: bool,
    #[options(short = "x", help = "Keep running when the program jumps to itself.")]
    pub no_halt: bool,
    #[options(help = "Restart the program when it jumps to itself (implies --no-halt).")]
    pub restart: bool,
    #[options(short = "e", help = "Load the ROM at 0x600, for the ETI-660.")]
    pub eti660: bool,

    #[options(
        short = "t",
        help = "Set the time each instruction takes.",
        default = "3000",
        meta = "MICROS"
    )]
    pub cycle: u64,

    #[options(
        short = "s",
        help = "Send screen and sound state to this address.",
        default = "127.0.0.1:9999",
        meta = "ADDR"
    )]
    pub screen_address: String,
    #[options(
        short = "k",
        help = "Receive key state on this port.",
        default = "9998",
        meta = "PORT"
    )]
    pub keystate_port: u16,
    #[options(
        short = "m",
        help = "Join a multicast group (the keypad uses 230.0.0.0) for key state.",
        meta = "GROUP"
    )]
    pub multicast: Option<Ipv4Addr>,
}

impl Arguments {
    fn flags(&self) -> Flags {
        Flags {
            debug: self.debug,
            end_on_infinite_loop: !(self.no_halt || self.restart),
            restart_on_infinite_loop: self.restart,
            quirks: Quirks {
                strict_cosmac: self.cosmac,
                rom_compatibility: !self.no_compat,
            },
        }
    }
    fn io_config(&self) -> IoConfig {
        IoConfig {
            screen_address: self.screen_address.clone(),
            keystate_port: self.keystate_port,
            multicast: self.multicast,
        }
    }
}

fn run(options: Arguments) -> Result<()> {
    let flags = options.flags();
    let config = options.io_config();
    log::info!("{flags:?}");

    let start = if options.eti660 { 0x600 } else { 0x200 };
    let mut cpu = CPU::new(0x50, start, flags);
    cpu.load_program(&options.file)?;
    log::info!("loaded {} at {start:03x}", options.file.display());

    let io = Arc::new(Peripherals::connect(&config.screen_address)?);
    KeyListener::bind(config.keystate_port, config.multicast)?.spawn(io.clone())?;

    let mut ch8 = Chip8::new(cpu, io);
    let timer = ch8.start()?;
    if let Err(e) = ch8.run(Duration::from_micros(options.cycle)) {
        ch8.io.shutdown();
        return Err(e);
    }
    if timer.join().is_err() {
        log::warn!("timer thread panicked");
    }
    Ok(())
}
