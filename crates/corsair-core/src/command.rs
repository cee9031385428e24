//! Ship command set shared by the player and the AI.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Discrete command bits plus continuous turn and thrust channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    bits: u64,
    turn: f64,
    thrust: f64,
}

impl Command {
    pub const NONE: Command = Command::from_bits(0);
    pub const FORWARD: Command = Command::from_bits(1 << 0);
    pub const REVERSE: Command = Command::from_bits(1 << 1);
    pub const LEFT: Command = Command::from_bits(1 << 2);
    pub const RIGHT: Command = Command::from_bits(1 << 3);
    pub const LAND: Command = Command::from_bits(1 << 4);
    pub const HYPERSPACE: Command = Command::from_bits(1 << 5);
    pub const LAUNCH: Command = Command::from_bits(1 << 6);
    pub const BOARD: Command = Command::from_bits(1 << 7);
    pub const SCAN: Command = Command::from_bits(1 << 8);
    pub const CLOAK: Command = Command::from_bits(1 << 9);
    pub const AFTERBURNER: Command = Command::from_bits(1 << 10);
    pub const PRIMARY: Command = Command::from_bits(1 << 11);
    pub const SECONDARY: Command = Command::from_bits(1 << 12);
    pub const STOP: Command = Command::from_bits(1 << 13);
    pub const WAIT: Command = Command::from_bits(1 << 14);

    const NAMES: [(&'static str, u64); 15] = [
        ("forward", 1 << 0),
        ("reverse", 1 << 1),
        ("left", 1 << 2),
        ("right", 1 << 3),
        ("land", 1 << 4),
        ("hyperspace", 1 << 5),
        ("launch", 1 << 6),
        ("board", 1 << 7),
        ("scan", 1 << 8),
        ("cloak", 1 << 9),
        ("afterburner", 1 << 10),
        ("primary", 1 << 11),
        ("secondary", 1 << 12),
        ("stop", 1 << 13),
        ("wait", 1 << 14),
    ];

    /// First bit used for per-hardpoint fire commands.
    const WEAPON_SHIFT: u32 = 32;

    pub const fn from_bits(bits: u64) -> Self {
        Self {
            bits,
            turn: 0.0,
            thrust: 0.0,
        }
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Fire bit for the hardpoint at `index` (indices above 31 share the
    /// last bit).
    pub fn fire(index: usize) -> Command {
        let index = index.min(31) as u32;
        Command::from_bits(1 << (Self::WEAPON_SHIFT + index))
    }

    /// Whether every bit of `other` is set.
    pub fn has(&self, other: Command) -> bool {
        other.bits != 0 && self.bits & other.bits == other.bits
    }

    pub fn has_any(&self, other: Command) -> bool {
        self.bits & other.bits != 0
    }

    /// Bits of both, for building key sets in constants.
    pub const fn with(self, other: Command) -> Command {
        Command::from_bits(self.bits | other.bits)
    }

    /// Bits set here but not in `other`.
    pub fn without(self, other: Command) -> Command {
        Command::from_bits(self.bits & !other.bits)
    }

    pub fn has_fire(&self, index: usize) -> bool {
        self.has(Command::fire(index))
    }

    pub fn set(&mut self, other: Command) {
        self.bits |= other.bits;
    }

    pub fn clear(&mut self, other: Command) {
        self.bits &= !other.bits;
    }

    /// Clear bits and channels.
    pub fn reset(&mut self) {
        *self = Command::NONE;
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0 && self.turn == 0.0 && self.thrust == 0.0
    }

    /// Turn command in `[-1, 1]`; positive turns clockwise.
    pub fn turn(&self) -> f64 {
        self.turn
    }

    pub fn set_turn(&mut self, turn: f64) {
        self.turn = turn.clamp(-1.0, 1.0);
    }

    /// Thrust command in `[-1, 1]`; negative uses reverse thrust.
    pub fn thrust(&self) -> f64 {
        self.thrust
    }

    pub fn set_thrust(&mut self, thrust: f64) {
        self.thrust = thrust.clamp(-1.0, 1.0);
    }

    /// Overlay another command: bits are merged and non-zero channels of
    /// `other` take precedence.
    pub fn merge(&mut self, other: &Command) {
        self.bits |= other.bits;
        if other.turn != 0.0 {
            self.turn = other.turn;
        }
        if other.thrust != 0.0 {
            self.thrust = other.thrust;
        }
    }
}

impl BitOr for Command {
    type Output = Command;
    fn bitor(self, rhs: Command) -> Command {
        let mut out = self;
        out.merge(&rhs);
        out
    }
}

impl BitOrAssign for Command {
    fn bitor_assign(&mut self, rhs: Command) {
        self.merge(&rhs);
    }
}

impl BitAnd for Command {
    type Output = Command;
    fn bitand(self, rhs: Command) -> Command {
        Command::from_bits(self.bits & rhs.bits)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, bit) in Self::NAMES {
            if self.bits & bit != 0 {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        let weapons = self.bits >> Self::WEAPON_SHIFT;
        if weapons != 0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "fire:{weapons:#x}")?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_and_channels() {
        let mut command = Command::FORWARD | Command::PRIMARY;
        command.set_turn(2.0);
        assert!(command.has(Command::FORWARD));
        assert!(!command.has(Command::LAND));
        assert_eq!(command.turn(), 1.0);
        command.clear(Command::FORWARD);
        assert!(!command.has(Command::FORWARD));
        assert!(command.has(Command::PRIMARY));
    }

    #[test]
    fn test_fire_bits_are_distinct() {
        let mut command = Command::NONE;
        command.set(Command::fire(3));
        assert!(command.has_fire(3));
        assert!(!command.has_fire(2));
        assert!(!command.has(Command::FORWARD));
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::NONE.to_string(), "none");
        assert_eq!((Command::LAND | Command::SCAN).to_string(), "land scan");
    }
}
