// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Contains implementations for each Chip-8 [Insn]

use super::*;
use rand::random;

impl CPU {
    /// Executes a single [Insn]
    #[rustfmt::skip]
    #[inline(always)]
    pub(super) fn execute(&mut self, screen: &mut Screen, io: &Peripherals, instruction: Insn) -> Step {
        match instruction {
            Insn::cls               => self.clear_screen(screen, io),
            Insn::ret               => self.ret(),
            Insn::jmp   {       A } => return self.jump(A, screen, io),
            Insn::call  {       A } => self.call(A),
            Insn::seb   {    x, B } => self.skip_equals_immediate(x, B),
            Insn::sneb  {    x, B } => self.skip_not_equals_immediate(x, B),
            Insn::se    { y, x    } => self.skip_equals(x, y),
            Insn::movb  {    x, B } => self.load_immediate(x, B),
            Insn::addb  {    x, B } => self.add_immediate(x, B),
            Insn::mov   { y, x    } => self.load(x, y),
            Insn::or    { y, x    } => self.or(x, y),
            Insn::and   { y, x    } => self.and(x, y),
            Insn::xor   { y, x    } => self.xor(x, y),
            Insn::add   { y, x    } => self.add(x, y),
            Insn::sub   { y, x    } => self.sub(x, y),
            Insn::shr   { y, x    } => self.shift_right(x, y),
            Insn::bsub  { y, x    } => self.backwards_sub(x, y),
            Insn::shl   { y, x    } => self.shift_left(x, y),
            Insn::sne   { y, x    } => self.skip_not_equals(x, y),
            Insn::movI  {       A } => self.load_i_immediate(A),
            Insn::jmpr  {       A } => self.jump_indexed(A),
            Insn::rand  {    x, B } => self.rand(x, B),
            Insn::draw  { y, x, n } => self.draw(x, y, n, screen, io),
            Insn::sek   {    x    } => self.skip_key_equals(x, io),
            Insn::snek  {    x    } => self.skip_key_not_equals(x, io),
            Insn::getdt {    x    } => self.load_delay_timer(x, io),
            Insn::waitk {    x    } => return self.wait_for_key(x, io),
            Insn::setdt {    x    } => self.store_delay_timer(x, io),
            Insn::movst {    x    } => self.store_sound_timer(x, io),
            Insn::addI  {    x    } => self.add_i(x),
            Insn::font  {    x    } => self.load_sprite(x),
            Insn::bcd   {    x    } => self.bcd_convert(x),
            Insn::dmao  {    x    } => self.store_dma(x),
            Insn::dmai  {    x    } => self.load_dma(x),
        }
        Step::Continue
    }
}

/// |`0aaa`| Issues a "System call" (ML routine). Not supported.
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`00e0`| Clear screen memory to all 0       |
/// |`00ee`| Return from subroutine             |
impl CPU {
    /// |`00e0`| Clears the screen memory to 0, and shows the peripheral
    #[inline(always)]
    pub(super) fn clear_screen(&mut self, screen: &mut Screen, io: &Peripherals) {
        screen.clear();
        io.update_screen(screen);
    }
    /// |`00ee`| Returns from subroutine
    ///
    /// On underflow, carries on with the next instruction.
    #[inline(always)]
    pub(super) fn ret(&mut self) {
        match self.stack.pop() {
            Ok(addr) => self.pc = addr,
            Err(e) => log::warn!("{e} at {:03x}", self.pc.wrapping_sub(2)),
        }
    }
}

/// |`1aaa`| Sets pc to an absolute address
impl CPU {
    /// |`1aaa`| Sets the program counter to an absolute address
    ///
    /// A jump to self is an infinite loop, handled according to [Flags]:
    /// ending shuts the peripherals down and halts, restarting resets the
    /// CPU, timers, sound and screen, and otherwise the program spins.
    #[inline(always)]
    pub(super) fn jump(&mut self, a: Adr, screen: &mut Screen, io: &Peripherals) -> Step {
        if a.wrapping_add(2) != self.pc {
            self.pc = a;
            return Step::Continue;
        }
        if self.flags.end_on_infinite_loop {
            log::info!("infinite loop at {a:03x}, halting");
            io.shutdown();
            return Step::Halt;
        }
        if self.flags.restart_on_infinite_loop {
            log::info!("infinite loop at {a:03x}, restarting");
            self.reset();
            io.state().set_delay_timer(0);
            io.state().set_sound_timer(0);
            io.update_sound(false);
            self.clear_screen(screen, io);
            return Step::Continue;
        }
        self.pc = a;
        Step::Continue
    }
}

/// |`2aaa`| Pushes pc onto the stack, then jumps to a
impl CPU {
    /// |`2aaa`| Pushes pc onto the stack, then jumps to a
    ///
    /// On overflow, the return address is lost, but the jump still happens.
    #[inline(always)]
    pub(super) fn call(&mut self, a: Adr) {
        if let Err(e) = self.stack.push(self.pc) {
            log::warn!("{e}");
        }
        self.pc = a;
    }
}

/// |`3xbb`| Skips next instruction if register X == b
impl CPU {
    /// |`3xbb`| Skips the next instruction if register X == b
    #[inline(always)]
    pub(super) fn skip_equals_immediate(&mut self, x: Reg, b: u8) {
        if self.v[x] == b {
            self.pc = self.pc.wrapping_add(2);
        }
    }
}

/// |`4xbb`| Skips next instruction if register X != b
impl CPU {
    /// |`4xbb`| Skips the next instruction if register X != b
    #[inline(always)]
    pub(super) fn skip_not_equals_immediate(&mut self, x: Reg, b: u8) {
        if self.v[x] != b {
            self.pc = self.pc.wrapping_add(2);
        }
    }
}

/// |`5xyn`| Performs a register-register comparison
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`5XY0`| Skip next instruction if vX == vY  |
impl CPU {
    /// |`5xy0`| Skips the next instruction if register X == register Y
    #[inline(always)]
    pub(super) fn skip_equals(&mut self, x: Reg, y: Reg) {
        if self.v[x] == self.v[y] {
            self.pc = self.pc.wrapping_add(2);
        }
    }
}

/// |`6xbb`| Loads immediate byte b into register vX
impl CPU {
    /// |`6xbb`| Loads immediate byte b into register vX
    #[inline(always)]
    pub(super) fn load_immediate(&mut self, x: Reg, b: u8) {
        self.v[x] = b;
    }
}

/// |`7xbb`| Adds immediate byte b to register vX
impl CPU {
    /// |`7xbb`| Adds immediate byte b to register vX. Does not set vF.
    #[inline(always)]
    pub(super) fn add_immediate(&mut self, x: Reg, b: u8) {
        self.v[x] = self.v[x].wrapping_add(b);
    }
}

/// |`8xyn`| Performs ALU operation
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`8xy0`| X = Y                              |
/// |`8xy1`| X = X | Y                          |
/// |`8xy2`| X = X & Y                          |
/// |`8xy3`| X = X ^ Y                          |
/// |`8xy4`| X = X + Y; Set vF=carry            |
/// |`8xy5`| X = X - Y; Set vF=X>Y              |
/// |`8xy6`| X = X >> 1; Set vF=shifted out     |
/// |`8xy7`| X = Y - X; Set vF=Y>X              |
/// |`8xyE`| X = X << 1; Set vF=shifted out     |
impl CPU {
    /// |`8xy0`| Loads the value of y into x
    #[inline(always)]
    pub(super) fn load(&mut self, x: Reg, y: Reg) {
        self.v[x] = self.v[y];
    }
    /// |`8xy1`| Performs bitwise or of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn or(&mut self, x: Reg, y: Reg) {
        self.v[x] |= self.v[y];
    }
    /// |`8xy2`| Performs bitwise and of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn and(&mut self, x: Reg, y: Reg) {
        self.v[x] &= self.v[y];
    }
    /// |`8xy3`| Performs bitwise xor of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn xor(&mut self, x: Reg, y: Reg) {
        self.v[x] ^= self.v[y];
    }
    /// |`8xy4`| Performs addition of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn add(&mut self, x: Reg, y: Reg) {
        let carry;
        (self.v[x], carry) = self.v[x].overflowing_add(self.v[y]);
        self.v[0xf] = carry.into();
    }
    /// |`8xy5`| Performs subtraction of vX and vY, and stores the result in vX
    ///
    /// vF is set only when vX was strictly greater than vY.
    #[inline(always)]
    pub(super) fn sub(&mut self, x: Reg, y: Reg) {
        let greater = self.v[x] > self.v[y];
        self.v[x] = self.v[x].wrapping_sub(self.v[y]);
        self.v[0xf] = greater.into();
    }
    /// |`8xy6`| Performs bitwise right shift of vX
    ///
    /// # Quirk
    /// On the original chip-8 interpreter, this shifts vY and stores the result in vX
    #[inline(always)]
    pub(super) fn shift_right(&mut self, x: Reg, y: Reg) {
        let src: Reg = if self.flags.quirks.shift_from_vy() { y } else { x };
        let shift_out = self.v[src] & 1;
        self.v[x] = self.v[src] >> 1;
        self.v[0xf] = shift_out;
    }
    /// |`8xy7`| Performs subtraction of vY and vX, and stores the result in vX
    #[inline(always)]
    pub(super) fn backwards_sub(&mut self, x: Reg, y: Reg) {
        let greater = self.v[y] > self.v[x];
        self.v[x] = self.v[y].wrapping_sub(self.v[x]);
        self.v[0xf] = greater.into();
    }
    /// |`8xyE`| Performs bitwise left shift of vX
    ///
    /// # Quirk
    /// On the original chip-8 interpreter, this shifts vY and stores the result in vX
    #[inline(always)]
    pub(super) fn shift_left(&mut self, x: Reg, y: Reg) {
        let src: Reg = if self.flags.quirks.shift_from_vy() { y } else { x };
        let shift_out: u8 = self.v[src] >> 7;
        self.v[x] = self.v[src] << 1;
        self.v[0xf] = shift_out;
    }
}

/// |`9xyn`| Performs a register-register comparison
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`9XY0`| Skip next instruction if vX != vY  |
impl CPU {
    /// |`9xy0`| Skip next instruction if X != y
    #[inline(always)]
    pub(super) fn skip_not_equals(&mut self, x: Reg, y: Reg) {
        if self.v[x] != self.v[y] {
            self.pc = self.pc.wrapping_add(2);
        }
    }
}

/// |`Aaaa`| Load address #a into register I
impl CPU {
    /// |`Aadr`| Load address #adr into register I
    #[inline(always)]
    pub(super) fn load_i_immediate(&mut self, a: Adr) {
        self.i = a;
    }
}

/// |`Baaa`| Jump to &adr + v0
impl CPU {
    /// |`Badr`| Jump to &adr + v0
    ///
    /// # Quirk
    /// Later interpreters read `Bxnn` as a jump to &xnn + vX
    #[inline(always)]
    pub(super) fn jump_indexed(&mut self, a: Adr) {
        let reg = if self.flags.quirks.jump_from_v0() {
            0
        } else {
            (a as usize >> 8) & 0xf
        };
        self.pc = a.wrapping_add(self.v[reg] as Adr);
    }
}

/// |`Cxbb`| Stores a random number & the provided byte into vX
impl CPU {
    /// |`Cxbb`| Stores a random number & the provided byte into vX
    #[inline(always)]
    pub(super) fn rand(&mut self, x: Reg, b: u8) {
        self.v[x] = random::<u8>() & b;
    }
}

/// |`Dxyn`| Draws n-byte sprite to the screen at coordinates (vX, vY)
impl CPU {
    /// |`Dxyn`| Draws n-byte sprite to the screen at coordinates (vX, vY)
    ///
    /// The origin wraps, the sprite itself is clipped at the edges.
    /// Sets vF if any lit pixel was turned off.
    #[inline(always)]
    pub(super) fn draw(&mut self, x: Reg, y: Reg, n: Nib, screen: &mut Screen, io: &Peripherals) {
        let (x, y) = (
            self.v[x] as usize % screen.width(),
            self.v[y] as usize % screen.height(),
        );
        self.v[0xf] = 0;
        for line in 0..n as usize {
            let sprite = self.mem.read(self.i.wrapping_add(line as Adr));
            for bit in (0..8).filter(|bit| sprite & (0x80 >> bit) != 0) {
                if let Some(true) = screen.xor(x + bit, y + line) {
                    self.v[0xf] = 1;
                }
            }
        }
        io.update_screen(screen);
    }
}

/// |`Exbb`| Skips instruction on value of keypress
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`eX9e`| Skip next instruction if key == vX |
/// |`eXa1`| Skip next instruction if key != vX |
impl CPU {
    /// |`Ex9E`| Skip next instruction if key == vX
    #[inline(always)]
    pub(super) fn skip_key_equals(&mut self, x: Reg, io: &Peripherals) {
        if io.state().is_pressed(self.v[x]) {
            self.pc = self.pc.wrapping_add(2);
        }
    }
    /// |`ExaE`| Skip next instruction if key != vX
    #[inline(always)]
    pub(super) fn skip_key_not_equals(&mut self, x: Reg, io: &Peripherals) {
        if !io.state().is_pressed(self.v[x]) {
            self.pc = self.pc.wrapping_add(2);
        }
    }
}

/// |`Fxbb`| Performs IO
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`fX07`| Set vX to value in delay timer     |
/// |`fX0a`| Wait for input, store key in vX    |
/// |`fX15`| Set delay timer to the value in vX |
/// |`fX18`| Set sound timer to the value in vX |
/// |`fX1e`| Add vX to I                        |
/// |`fX29`| Load sprite for character x into I |
/// |`fX33`| BCD convert X into I[0..3]         |
/// |`fX55`| DMA Stor from I to registers 0..=X |
/// |`fX65`| DMA Load from I to registers 0..=X |
impl CPU {
    /// |`Fx07`| Get the current DT, and put it in vX
    /// ```py
    /// vX = DT
    /// ```
    #[inline(always)]
    pub(super) fn load_delay_timer(&mut self, x: Reg, io: &Peripherals) {
        self.v[x] = io.state().delay_timer();
    }
    /// |`Fx0A`| Wait for key, then vX = K
    ///
    /// Rewinds the program counter while no key is held, so the
    /// instruction runs again on the next tick.
    #[inline(always)]
    pub(super) fn wait_for_key(&mut self, x: Reg, io: &Peripherals) -> Step {
        match io.state().pressed_key() {
            Some(key) => {
                self.v[x] = key;
                Step::Continue
            }
            None => {
                self.pc = self.pc.wrapping_sub(2);
                Step::KeyWait
            }
        }
    }
    /// |`Fx15`| Load vX into DT
    /// ```py
    /// DT = vX
    /// ```
    #[inline(always)]
    pub(super) fn store_delay_timer(&mut self, x: Reg, io: &Peripherals) {
        io.state().set_delay_timer(self.v[x]);
    }
    /// |`Fx18`| Load vX into ST
    /// ```py
    /// ST = remap(vX);
    /// ```
    #[inline(always)]
    pub(super) fn store_sound_timer(&mut self, x: Reg, io: &Peripherals) {
        io.update_sound(self.v[x] > 0);
        io.state().set_sound_timer(remap_sound(self.v[x]));
    }
    /// |`Fx1e`| Add vX to I,
    /// ```py
    /// I = (I + vX) & 0xfff;
    /// ```
    /// # Quirk
    /// Sets vF when I runs off the end of memory, except on the COSMAC VIP
    #[inline(always)]
    pub(super) fn add_i(&mut self, x: Reg) {
        let sum = self.i as u32 + self.v[x] as u32;
        self.i = (sum & mem::ADDRESS_MASK as u32) as Adr;
        if self.flags.quirks.index_overflow_flag() {
            self.v[0xf] = (sum > mem::ADDRESS_MASK as u32).into();
        }
    }
    /// |`Fx29`| Load sprite for character x into I
    /// ```py
    /// I = sprite(X);
    /// ```
    #[inline(always)]
    pub(super) fn load_sprite(&mut self, x: Reg) {
        self.i = self.font.wrapping_add(5 * self.v[x] as Adr);
    }
    /// |`Fx33`| BCD convert X into I`[0..3]`
    #[inline(always)]
    pub(super) fn bcd_convert(&mut self, x: Reg) {
        let x = self.v[x];
        self.mem.write(self.i.wrapping_add(2), x % 10);
        self.mem.write(self.i.wrapping_add(1), x / 10 % 10);
        self.mem.write(self.i, x / 100 % 10);
    }
    /// |`Fx55`| DMA Stor from I to registers 0..=X
    ///
    /// # Quirk
    /// The original chip-8 interpreter uses I to directly index memory,
    /// with the side effect of leaving I as I+X+1 after the transfer is done.
    #[inline(always)]
    pub(super) fn store_dma(&mut self, x: Reg) {
        for reg in 0..=x {
            self.mem.write(self.i.wrapping_add(reg as Adr), self.v[reg]);
        }
        if self.flags.quirks.dma_inc() {
            self.i = self.i.wrapping_add(x as Adr + 1);
        }
    }
    /// |`Fx65`| DMA Load from I to registers 0..=X
    ///
    /// # Quirk
    /// The original chip-8 interpreter uses I to directly index memory,
    /// with the side effect of leaving I as I+X+1 after the transfer is done.
    #[inline(always)]
    pub(super) fn load_dma(&mut self, x: Reg) {
        for reg in 0..=x {
            self.v[reg] = self.mem.read(self.i.wrapping_add(reg as Adr));
        }
        if self.flags.quirks.dma_inc() {
            self.i = self.i.wrapping_add(x as Adr + 1);
        }
    }
}

/// Stretches a sound timer value so short beeps stay audible.
///
/// Maps `0` to `0`, and `1..=255` onto `5..=255` along a gentle curve.
/// # Examples
/// ```rust
/// # use chirpnet::cpu::behavior::remap_sound;
/// assert_eq!(0, remap_sound(0));
/// assert_eq!(5, remap_sound(1));
/// assert_eq!(255, remap_sound(255));
/// ```
pub fn remap_sound(value: u8) -> u8 {
    const LOW: f64 = 5.0;
    const HIGH: f64 = 255.0;
    const CURVE: f64 = 0.85;
    match value {
        0 => 0,
        value => {
            let scaled = (value as f64 - 1.0).powf(CURVE) / 254f64.powf(CURVE);
            (scaled * (HIGH - LOW) + LOW).round() as u8
        }
    }
}
