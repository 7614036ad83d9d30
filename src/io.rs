// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Talks to the peripheral: the external process that renders the screen,
//! plays sound, and reads the keypad.
//!
//! State flows out as [Message]s pushed over a [Transport] whenever the
//! screen or sound changes, and key state flows in from a [KeyListener].
//! The scalars the threads share live in [IoState], one atomic apiece.

use crate::{
    error::{Error, Result},
    screen::Screen,
};
use serde::{Deserialize, Serialize};
use std::{
    net::{Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    sync::{
        atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering::Relaxed},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::JoinHandle,
};

/// Scalar state shared between the CPU, the timer, and the key listener.
///
/// Every field is updated on its own; readers may see a value one tick stale.
#[derive(Debug)]
pub struct IoState {
    keys: AtomicU16,
    sound: AtomicBool,
    delay_timer: AtomicU8,
    sound_timer: AtomicU8,
    running: AtomicBool,
}

impl IoState {
    /// Gets the key bitmask, one bit per key `0..=F`
    pub fn keys(&self) -> u16 {
        self.keys.load(Relaxed)
    }
    /// Overwrites the key bitmask
    pub fn set_keys(&self, keys: u16) {
        self.keys.store(keys, Relaxed)
    }
    /// Presses a key.
    /// If key is outside range `0..=0xF`, returns [Error::InvalidKey].
    ///
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let state = IoState::default();
    /// state.press(0x7).unwrap();
    /// assert!(state.is_pressed(0x7));
    /// assert!(state.press(0x10).is_err());
    /// ```
    pub fn press(&self, key: usize) -> Result<()> {
        let bit = Self::bit(key)?;
        self.keys.fetch_or(bit, Relaxed);
        Ok(())
    }
    /// Releases a key.
    /// If key is outside range `0..=0xF`, returns [Error::InvalidKey].
    pub fn release(&self, key: usize) -> Result<()> {
        let bit = Self::bit(key)?;
        self.keys.fetch_and(!bit, Relaxed);
        Ok(())
    }
    /// Reports whether `key` is held. Keys past `F` are never held.
    pub fn is_pressed(&self, key: u8) -> bool {
        u16::checked_shr(self.keys(), key as u32).map_or(false, |keys| keys & 1 == 1)
    }
    /// Gets the lowest-numbered key that is held, if any
    ///
    /// # Examples
    /// ```rust
    /// # use chirpnet::*;
    /// let state = IoState::default();
    /// assert_eq!(None, state.pressed_key());
    /// state.set_keys(0b1010_0000);
    /// assert_eq!(Some(5), state.pressed_key());
    /// ```
    pub fn pressed_key(&self) -> Option<u8> {
        match self.keys() {
            0 => None,
            keys => Some(keys.trailing_zeros() as u8),
        }
    }

    /// Gets the last sound state pushed to the peripheral
    pub fn sound(&self) -> bool {
        self.sound.load(Relaxed)
    }
    /// Stores a new sound state, returning the previous one
    fn swap_sound(&self, sound: bool) -> bool {
        self.sound.swap(sound, Relaxed)
    }

    /// Gets the value in the Delay Timer register
    pub fn delay_timer(&self) -> u8 {
        self.delay_timer.load(Relaxed)
    }
    /// Sets the Delay Timer register
    pub fn set_delay_timer(&self, value: u8) {
        self.delay_timer.store(value, Relaxed)
    }
    /// Gets the value in the Sound Timer register
    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.load(Relaxed)
    }
    /// Sets the Sound Timer register
    pub fn set_sound_timer(&self, value: u8) {
        self.sound_timer.store(value, Relaxed)
    }
    /// Counts the Delay Timer down by one, stopping at zero
    pub(crate) fn count_down_delay(&self) {
        self.delay_timer
            .fetch_update(Relaxed, Relaxed, |t| t.checked_sub(1))
            .ok();
    }
    /// Counts the Sound Timer down by one, stopping at zero.
    ///
    /// Returns true if this count reached zero.
    pub(crate) fn count_down_sound(&self) -> bool {
        self.sound_timer
            .fetch_update(Relaxed, Relaxed, |t| t.checked_sub(1))
            .map_or(false, |previous| previous == 1)
    }

    /// Reports whether the emulator is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Relaxed)
    }
    /// Asks the helper threads to wind down
    pub fn stop(&self) {
        self.running.store(false, Relaxed)
    }

    fn bit(key: usize) -> Result<u16> {
        match key {
            0..=0xf => Ok(1 << key),
            _ => Err(Error::InvalidKey { key }),
        }
    }
}

impl Default for IoState {
    fn default() -> Self {
        IoState {
            keys: AtomicU16::new(0),
            sound: AtomicBool::new(false),
            delay_timer: AtomicU8::new(0),
            sound_timer: AtomicU8::new(0),
            running: AtomicBool::new(true),
        }
    }
}

/// The state snapshot sent to the peripheral, as a MessagePack map
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Whether the buzzer is on
    pub sound: bool,
    /// The key bitmask, echoed back
    pub keys: u16,
    /// The bit-packed screen, or `nil` when only sound and keys changed
    #[serde(with = "serde_bytes")]
    pub screen: Option<Vec<u8>>,
    /// Width of the screen, in pixels
    pub screen_width: u8,
    /// Height of the screen, in pixels
    pub screen_height: u8,
}

impl Message {
    /// Serializes the message for the wire
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }
    /// Deserializes a message off the wire
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}

/// Carries encoded [Message]s to the peripheral.
///
/// Delivery is best-effort: nothing is acknowledged or retried.
pub trait Transport: Send + Sync {
    /// Sends one datagram
    fn send(&self, payload: &[u8]) -> std::io::Result<usize>;
}

impl Transport for UdpSocket {
    fn send(&self, payload: &[u8]) -> std::io::Result<usize> {
        UdpSocket::send(self, payload)
    }
}

/// A [Transport] that keeps every message instead of sending it
///
/// Clones share one record, so a clone can be handed to [Peripherals]
/// while the original is inspected.
#[derive(Clone, Debug, Default)]
pub struct Recorder(Arc<Mutex<Vec<Vec<u8>>>>);

impl Transport for Recorder {
    fn send(&self, payload: &[u8]) -> std::io::Result<usize> {
        self.payloads().push(payload.to_vec());
        Ok(payload.len())
    }
}

impl Recorder {
    /// Decodes every message recorded so far, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.payloads()
            .iter()
            .filter_map(|bytes| Message::decode(bytes).ok())
            .collect()
    }

    fn payloads(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Where the peripheral lives
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IoConfig {
    /// Address of the screen application
    pub screen_address: String,
    /// Port to receive key state on
    pub keystate_port: u16,
    /// Multicast group to join for key state, if any
    pub multicast: Option<Ipv4Addr>,
}

impl Default for IoConfig {
    fn default() -> Self {
        IoConfig {
            screen_address: "127.0.0.1:9999".into(),
            keystate_port: 9998,
            multicast: None,
        }
    }
}

/// The outbound half of the peripheral channel, plus the shared [IoState]
pub struct Peripherals {
    state: IoState,
    transport: Box<dyn Transport>,
    dimensions: (u8, u8),
}

impl Peripherals {
    /// Wraps a [Transport] for a screen of the default dimensions
    pub fn new(transport: impl Transport + 'static) -> Self {
        let screen = Screen::default();
        Peripherals {
            state: IoState::default(),
            transport: Box::new(transport),
            dimensions: (screen.width() as u8, screen.height() as u8),
        }
    }

    /// Opens a UDP socket connected to the screen application at `addr`
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(addr)?;
        log::info!("pushing peripheral state to {}", socket.peer_addr()?);
        Ok(Self::new(socket))
    }

    /// Gets the shared scalar state
    pub fn state(&self) -> &IoState {
        &self.state
    }

    /// Pushes the whole screen, along with the current sound and key state
    ///
    /// Screens wider or taller than 255 pixels can't be described on the wire,
    /// and are dropped with a warning.
    pub fn update_screen(&self, screen: &Screen) {
        let (Ok(width), Ok(height)) = (
            u8::try_from(screen.width()),
            u8::try_from(screen.height()),
        ) else {
            log::warn!(
                "screen of {}x{} is too large to send",
                screen.width(),
                screen.height()
            );
            return;
        };
        let mut message = self.snapshot();
        message.screen = Some(screen.pack());
        message.screen_width = width;
        message.screen_height = height;
        self.push(&message);
    }

    /// Records a new sound state, pushing it only if it changed
    pub fn update_sound(&self, sound: bool) {
        if self.state.swap_sound(sound) != sound {
            self.push(&self.snapshot());
        }
    }

    /// Pushes the current sound and key state, without the screen
    pub fn update_sound_and_keys(&self) {
        self.push(&self.snapshot());
    }

    /// Silences the peripheral and releases every key, then stops the helper threads
    pub fn shutdown(&self) {
        self.state.set_keys(0);
        self.state.swap_sound(false);
        self.update_sound_and_keys();
        self.state.stop();
    }

    fn snapshot(&self) -> Message {
        Message {
            sound: self.state.sound(),
            keys: self.state.keys(),
            screen: None,
            screen_width: self.dimensions.0,
            screen_height: self.dimensions.1,
        }
    }

    /// Sends a message. Failures are logged and dropped.
    fn push(&self, message: &Message) {
        if let Err(e) = self.try_push(message) {
            log::warn!("{e}");
        }
    }

    fn try_push(&self, message: &Message) -> Result<()> {
        let payload = message.encode()?;
        self.transport
            .send(&payload)
            .map_err(Error::PeripheralTransport)?;
        Ok(())
    }
}

impl std::fmt::Debug for Peripherals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peripherals")
            .field("state", &self.state)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

/// The inbound half of the peripheral channel: receives key state datagrams
#[derive(Debug)]
pub struct KeyListener {
    socket: UdpSocket,
}

impl KeyListener {
    /// Largest datagram read off the socket. Anything over 2 bytes is rejected anyway.
    const MAX_DATAGRAM: usize = 256;

    /// Binds to `port` on every interface, joining `multicast` if provided
    pub fn bind(port: u16, multicast: Option<Ipv4Addr>) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?;
        if let Some(group) = multicast {
            socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
        }
        Ok(KeyListener { socket })
    }

    /// Gets the address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receives one key state datagram, and stores it in `state`
    ///
    /// Returns [Error::MalformedKeyDatagram] if it isn't exactly two bytes.
    pub fn receive(&self, state: &IoState) -> Result<u16> {
        let mut buffer = [0u8; Self::MAX_DATAGRAM];
        let (len, _) = self.socket.recv_from(&mut buffer)?;
        let keys = parse_keys(&buffer[..len])?;
        state.set_keys(keys);
        Ok(keys)
    }

    /// Receives key state until the emulator stops or something goes wrong
    pub fn listen(self, peripherals: Arc<Peripherals>) -> Result<()> {
        while peripherals.state().is_running() {
            self.receive(peripherals.state())?;
        }
        Ok(())
    }

    /// Moves the listener onto its own thread.
    ///
    /// A malformed datagram ends the thread, not the emulator.
    pub fn spawn(self, peripherals: Arc<Peripherals>) -> Result<JoinHandle<Result<()>>> {
        log::info!("listening for key state on {}", self.local_addr()?);
        Ok(std::thread::Builder::new()
            .name("keypad".into())
            .spawn(move || {
                let result = self.listen(peripherals);
                if let Err(e) = &result {
                    log::error!("key state listener stopped: {e}");
                }
                result
            })?)
    }
}

/// Parses a key state datagram: exactly two bytes, big-endian
///
/// # Examples
/// ```rust
/// # use chirpnet::io::parse_keys;
/// assert_eq!(0x8001, parse_keys(&[0x80, 0x01]).unwrap());
/// assert!(parse_keys(&[0x80]).is_err());
/// ```
pub fn parse_keys(datagram: &[u8]) -> Result<u16> {
    match *datagram {
        [hi, lo] => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err(Error::MalformedKeyDatagram {
            len: datagram.len(),
        }),
    }
}
