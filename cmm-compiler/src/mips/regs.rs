//! Physical register file and local allocation state.

use bitflags::bitflags;
use cmm_ir::Operand;
use strum::IntoEnumIterator;

/// MIPS-32 register, displayed by canonical alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Reg {
    Zero = 0,
    At,
    V0,
    V1,
    A0,
    A1,
    A2,
    A3,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    T8,
    T9,
    K0,
    K1,
    Gp,
    Sp,
    Fp,
    Ra,
}

impl Reg {
    /// Registers the allocator may hold values in: `$a0` through `$t9`.
    pub fn allocatable() -> impl Iterator<Item = Reg> {
        Reg::iter().skip(Reg::A0 as usize).take(22)
    }

    /// Registers eligible for fresh allocation and eviction: `$t0` through
    /// `$t9` (the argument registers are homes, never victims).
    pub fn candidates() -> impl Iterator<Item = Reg> {
        Reg::iter().skip(Reg::T0 as usize).take(18)
    }

    /// The `i`-th argument register, `$a0` for 0 up to `$a3` for 3.
    pub fn argument(i: usize) -> Reg {
        match i {
            0 => Reg::A0,
            1 => Reg::A1,
            2 => Reg::A2,
            _ => Reg::A3,
        }
    }

    const fn is_allocatable(self) -> bool {
        let index = self as u8;
        index >= Reg::A0 as u8 && index <= Reg::T9 as u8
    }
}

bitflags! {
    /// Allocation state of one register.
    pub struct RegFlags: u8 {
        /// Must not be evicted; permanently set on the reserved registers.
        const LOCKED = 0x01;
        /// Holds a value newer than its stack home.
        const DIRTY = 0x02;
    }
}

#[derive(Debug, Clone)]
struct RegState {
    loaded: Option<Operand>,
    flags: RegFlags,
}

impl Default for RegState {
    fn default() -> Self {
        Self {
            loaded: None,
            flags: RegFlags::empty(),
        }
    }
}

/// Residency and lock/dirty tracking for all 32 registers.
///
/// Reserved registers are permanently locked; only the allocatable window
/// ever holds operands.
#[derive(Debug)]
pub struct RegFile {
    regs: [RegState; 32],
}

impl RegFile {
    /// Fresh file: everything empty, reserved registers locked.
    pub fn new() -> Self {
        let mut file = Self {
            regs: std::array::from_fn(|_| RegState::default()),
        };
        for reg in Reg::iter() {
            if !reg.is_allocatable() {
                file.regs[reg as usize].flags = RegFlags::LOCKED;
            }
        }
        file
    }

    /// The operand a register holds, if any.
    pub fn loaded(&self, reg: Reg) -> Option<&Operand> {
        self.regs[reg as usize].loaded.as_ref()
    }

    /// Whether the register holds nothing.
    pub fn is_empty(&self, reg: Reg) -> bool {
        self.regs[reg as usize].loaded.is_none()
    }

    /// Whether the register's value is newer than its stack home.
    pub fn is_dirty(&self, reg: Reg) -> bool {
        self.regs[reg as usize].flags.contains(RegFlags::DIRTY)
    }

    /// Pin a non-empty register against eviction.
    pub fn lock(&mut self, reg: Reg) {
        if self.regs[reg as usize].loaded.is_some() {
            self.regs[reg as usize].flags.insert(RegFlags::LOCKED);
        }
    }

    /// Release a pin.
    pub fn unlock(&mut self, reg: Reg) {
        self.regs[reg as usize].flags.remove(RegFlags::LOCKED);
    }

    /// Mark a non-empty register dirty.
    pub fn set_dirty(&mut self, reg: Reg) {
        if self.regs[reg as usize].loaded.is_some() {
            self.regs[reg as usize].flags.insert(RegFlags::DIRTY);
        }
    }

    /// Register currently holding the operand, going by location identity
    /// (`Var` and `Addr` with the same id are the same location).
    pub fn find(&self, op: &Operand) -> Option<Reg> {
        Reg::allocatable().find(|&reg| self.loaded(reg) == Some(op))
    }

    /// First empty candidate register.
    pub fn find_empty(&self) -> Option<Reg> {
        Reg::candidates().find(|&reg| self.is_empty(reg))
    }

    /// Best eviction victim by score: a constant (no store needed) beats a
    /// clean value beats a dirty temporary beats a dirty named variable.
    /// Locked and empty registers are never victims.
    pub fn find_victim(&self) -> Option<Reg> {
        let mut best: Option<(Reg, u8)> = None;
        for reg in Reg::candidates() {
            let state = &self.regs[reg as usize];
            let Some(op) = &state.loaded else { continue };
            if state.flags.contains(RegFlags::LOCKED) {
                continue;
            }
            let score = if op.is_const() {
                4
            } else if !state.flags.contains(RegFlags::DIRTY) {
                3
            } else if op.is_temp() {
                2
            } else {
                1
            };
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((reg, score));
            }
        }
        best.map(|(reg, _)| reg)
    }

    /// Bind an operand to a register, clearing its flags.
    pub fn alloc(&mut self, reg: Reg, op: Operand) {
        self.regs[reg as usize] = RegState {
            loaded: Some(op),
            flags: RegFlags::empty(),
        };
    }

    /// Empty a register, returning what it held.
    pub fn free(&mut self, reg: Reg) -> Option<Operand> {
        std::mem::take(&mut self.regs[reg as usize]).loaded
    }
}

impl Default for RegFile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases() {
        assert_eq!(Reg::Zero.to_string(), "zero");
        assert_eq!(Reg::A0.to_string(), "a0");
        assert_eq!(Reg::T9.to_string(), "t9");
        assert_eq!(Reg::Fp.to_string(), "fp");
    }

    #[test]
    fn candidate_window_spans_t0_to_t9() {
        let regs: Vec<Reg> = Reg::candidates().collect();
        assert_eq!(regs.len(), 18);
        assert_eq!(regs.first(), Some(&Reg::T0));
        assert_eq!(regs.last(), Some(&Reg::T9));
        assert!(regs.contains(&Reg::S3));
        assert!(!regs.contains(&Reg::A0));
    }

    #[test]
    fn victim_scoring_prefers_cheapest_eviction() {
        let mut file = RegFile::new();
        // dirty named variable: worst choice
        file.alloc(Reg::T0, Operand::var(1));
        file.set_dirty(Reg::T0);
        assert_eq!(file.find_victim(), Some(Reg::T0));
        // dirty temporary beats it
        file.alloc(
            Reg::T1,
            Operand::Var {
                id: 2,
                temp: true,
            },
        );
        file.set_dirty(Reg::T1);
        assert_eq!(file.find_victim(), Some(Reg::T1));
        // a clean value beats both
        file.alloc(Reg::T2, Operand::var(3));
        assert_eq!(file.find_victim(), Some(Reg::T2));
        // a loaded constant needs no store at all
        file.alloc(Reg::T3, Operand::Const(7));
        assert_eq!(file.find_victim(), Some(Reg::T3));
        // locking removes a register from consideration
        file.lock(Reg::T3);
        assert_eq!(file.find_victim(), Some(Reg::T2));
    }

    #[test]
    fn find_matches_var_and_addr_homes() {
        let mut file = RegFile::new();
        file.alloc(Reg::T4, Operand::var(9));
        assert_eq!(file.find(&Operand::addr(9)), Some(Reg::T4));
        assert_eq!(file.find(&Operand::var(8)), None);
    }
}
