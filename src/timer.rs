// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Counts the delay and sound timers down at 60Hz, on their own thread

use crate::io::Peripherals;
use std::{
    sync::Arc,
    thread::JoinHandle,
    time::{Duration, Instant},
};

/// How often the timers count down
pub const TIMER_RATE: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Drives the delay and sound timers
#[derive(Debug)]
pub struct Timer {
    io: Arc<Peripherals>,
    ft: Instant,
}

impl Timer {
    /// Creates a timer for the given peripherals, without starting it
    pub fn new(io: Arc<Peripherals>) -> Self {
        Timer {
            io,
            ft: Instant::now(),
        }
    }

    /// Starts counting down on a new thread, until the peripherals shut down
    pub fn spawn(io: Arc<Peripherals>) -> std::io::Result<JoinHandle<()>> {
        let mut timer = Self::new(io);
        std::thread::Builder::new()
            .name("timer".into())
            .spawn(move || timer.run())
    }

    /// Ticks the timers at [TIMER_RATE] while the emulator is running
    pub fn run(&mut self) {
        log::info!("timer started at {:?} per tick", TIMER_RATE);
        self.ft = Instant::now();
        while self.io.state().is_running() {
            self.wait_for_next_frame();
            self.tick();
        }
        log::info!("timer stopped");
    }

    /// Counts each timer down by one, and silences the peripheral when
    /// the sound timer runs out
    ///
    /// # Examples
    /// ```rust
    /// # use chirpnet::{io::Peripherals, timer::Timer};
    /// # use std::sync::Arc;
    /// # let io = Arc::new(Peripherals::new(std::net::UdpSocket::bind("127.0.0.1:0").unwrap()));
    /// let timer = Timer::new(io.clone());
    /// io.state().set_delay_timer(2);
    /// timer.tick();
    /// assert_eq!(1, io.state().delay_timer());
    /// ```
    pub fn tick(&self) {
        let state = self.io.state();
        state.count_down_delay();
        if state.count_down_sound() {
            self.io.update_sound(false);
        }
    }

    /// Sleeps until the next deadline, so oversleeping doesn't add up
    fn wait_for_next_frame(&mut self) {
        std::thread::sleep(TIMER_RATE.saturating_sub(self.ft.elapsed()));
        self.ft += TIMER_RATE;
    }
}
