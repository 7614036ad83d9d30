//! Controls the [Quirks] behavior of the CPU on a granular level.

/// Selects which historical behavior the quirky instructions follow.
///
/// Every instruction that disagrees between the COSMAC VIP and later
/// interpreters asks one of the methods here, rather than the raw flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quirks {
    /// COSMAC VIP: shifts source from vY, `Bnnn` indexes by v0,
    /// `Fx1E` leaves vF alone, DMA instructions advance I
    pub strict_cosmac: bool,
    /// Pragmatic defaults most ROMs expect. Overrides `strict_cosmac`
    /// for indexed jumps and DMA.
    pub rom_compatibility: bool,
}

impl Quirks {
    /// `8xy6`/`8xyE`: copy vY into vX before shifting
    #[inline(always)]
    pub fn shift_from_vy(&self) -> bool {
        self.strict_cosmac
    }
    /// `Bnnn`: jump to `nnn + v0` instead of `xnn + vX`
    #[inline(always)]
    pub fn jump_from_v0(&self) -> bool {
        self.strict_cosmac || self.rom_compatibility
    }
    /// `Fx1E`: set vF when I leaves the address space
    #[inline(always)]
    pub fn index_overflow_flag(&self) -> bool {
        !self.strict_cosmac
    }
    /// `Fx55`/`Fx65`: leave I at I + x + 1 after the transfer
    #[inline(always)]
    pub fn dma_inc(&self) -> bool {
        self.strict_cosmac && !self.rom_compatibility
    }
}

impl From<bool> for Quirks {
    /// `true` is strict COSMAC VIP behavior, `false` is the ROM compatibility default
    fn from(value: bool) -> Self {
        Quirks {
            strict_cosmac: value,
            rom_compatibility: !value,
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Self::from(false)
    }
}
