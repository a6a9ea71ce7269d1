//! The detected cube configuration and per-slot planner state.

/// Number of slots in a full configuration: 4 bottom sectors plus the 4 top
/// slots directly above them.
pub const SLOT_COUNT: usize = 8;

/// The colors a slot in the configuration can hold.
///
/// `Unknown` means the recognizer has not resolved the slot yet; `None` means
/// the slot was observed empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CubeColor {
    #[default]
    Unknown,
    None,
    Red,
    Yellow,
    Blue,
}

impl CubeColor {
    /// True for an observed cube (not `Unknown`, not an empty slot).
    pub fn is_cube(self) -> bool {
        matches!(self, CubeColor::Red | CubeColor::Yellow | CubeColor::Blue)
    }
}

/// Per-slot placement state derived by the planner.
///
/// A slot stays `Unknown` while its configuration color is unresolved and
/// never reverts once `Placed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CubeState {
    #[default]
    Unknown,
    NotPlaced,
    Placed,
}

/// The positions of cubes and empty spaces on the two-layer turntable.
///
/// Positions 1-4 are the bottom layer, starting at the sector aligned with
/// the turntable's reference mark and continuing counterclockwise. Positions
/// 5-8 are the top-layer slots directly above 1-4.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CubeConfiguration {
    slots: [CubeColor; SLOT_COUNT],
}

impl CubeConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once every slot has been resolved.
    pub fn completed(&self) -> bool {
        self.slots.iter().all(|c| *c != CubeColor::Unknown)
    }

    /// Resets every slot back to `Unknown`.
    pub fn reset(&mut self) {
        self.slots = [CubeColor::Unknown; SLOT_COUNT];
    }

    /// The color at `pos` (1-based). Out-of-range positions read as `Unknown`.
    pub fn color(&self, pos: usize) -> CubeColor {
        if pos < 1 || pos > SLOT_COUNT {
            return CubeColor::Unknown;
        }
        self.slots[pos - 1]
    }

    /// Sets the color at `pos` (1-based). Out-of-range positions are ignored.
    pub fn set_color(&mut self, pos: usize, color: CubeColor) {
        if pos >= 1 && pos <= SLOT_COUNT {
            self.slots[pos - 1] = color;
        }
    }

    pub fn slots(&self) -> [CubeColor; SLOT_COUNT] {
        self.slots
    }

    /// The hardcoded fallback layout built when recognition times out.
    pub fn default_layout() -> Self {
        use CubeColor::{None, Red, Yellow};
        Self {
            slots: [Red, Yellow, None, Red, Red, Yellow, None, Red],
        }
    }
}

impl From<[CubeColor; SLOT_COUNT]> for CubeConfiguration {
    fn from(slots: [CubeColor; SLOT_COUNT]) -> Self {
        Self { slots }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unresolved() {
        let config = CubeConfiguration::new();
        assert!(!config.completed());
        assert_eq!(config.color(1), CubeColor::Unknown);
    }

    #[test]
    fn completed_after_all_slots_set() {
        let mut config = CubeConfiguration::new();
        for pos in 1..=SLOT_COUNT {
            config.set_color(pos, CubeColor::None);
        }
        assert!(config.completed());

        config.reset();
        assert!(!config.completed());
    }

    #[test]
    fn positions_are_one_based() {
        let mut config = CubeConfiguration::new();
        config.set_color(1, CubeColor::Red);
        config.set_color(8, CubeColor::Blue);
        assert_eq!(config.slots()[0], CubeColor::Red);
        assert_eq!(config.slots()[7], CubeColor::Blue);

        // Out-of-range access is a no-op / Unknown.
        config.set_color(0, CubeColor::Yellow);
        config.set_color(9, CubeColor::Yellow);
        assert_eq!(config.color(0), CubeColor::Unknown);
        assert_eq!(config.color(9), CubeColor::Unknown);
        assert!(!config.slots().contains(&CubeColor::Yellow));
    }

    #[test]
    fn default_layout_is_complete() {
        let config = CubeConfiguration::default_layout();
        assert!(config.completed());
        assert_eq!(config.color(1), CubeColor::Red);
        assert_eq!(config.color(3), CubeColor::None);
    }

    #[test]
    fn is_cube() {
        assert!(CubeColor::Red.is_cube());
        assert!(CubeColor::Yellow.is_cube());
        assert!(CubeColor::Blue.is_cube());
        assert!(!CubeColor::None.is_cube());
        assert!(!CubeColor::Unknown.is_cube());
    }
}
