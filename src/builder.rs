//! The build planner.
//!
//! Turns a detected 8-slot cube configuration into the ordered sequence of
//! rotate/place/lift commands that realizes it on the machine. The planner is
//! pure bookkeeping: it appends commands to the outbound queue and never
//! waits for acknowledgments — ordering is guaranteed by the single-flight
//! writer draining that queue.

use crossbeam_channel::Sender;
use log::info;

use crate::cube::{CubeColor, CubeState, SLOT_COUNT};
use crate::protocol::motion::{MoveLift, PlaceCubes, RotateGrid};
use crate::protocol::Command;

/// Number of stationary loading bays the turntable rotates past.
pub const BAY_COUNT: usize = 4;

/// Bay-to-color mapping when the turntable sits in its home orientation.
const BAYS_BASELINE: [CubeColor; BAY_COUNT] = [
    CubeColor::None,
    CubeColor::Red,
    CubeColor::Yellow,
    CubeColor::Blue,
];

// ---------------------------------------------------------------------------
// RotationTracker
// ---------------------------------------------------------------------------

/// Tracks the turntable's rotational state at two granularities.
///
/// `record` counts physical rotations toward the final homing correction;
/// `shift` updates the logical bay mapping. Call sites state which of the two
/// they mean: a full rotation does both, while the placement search in
/// [`Builder::build_config`] shifts per probe step and records once with the
/// accumulated count. Keeping the two apart is what stops the homing counter
/// from double-counting the search steps.
#[derive(Debug, Clone)]
pub struct RotationTracker {
    bays: [CubeColor; BAY_COUNT],
    rotated: i32,
}

impl RotationTracker {
    fn new() -> Self {
        Self {
            bays: BAYS_BASELINE,
            rotated: 0,
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    /// Count a physical rotation of `times` 90° steps toward homing.
    pub fn record(&mut self, times: i32) {
        self.rotated += times.rem_euclid(BAY_COUNT as i32);
    }

    /// Circularly shift the bay mapping by `times` steps; negative steps go
    /// the opposite way. A multiple of 4 is the identity.
    pub fn shift(&mut self, times: i32) {
        let times = times.rem_euclid(BAY_COUNT as i32) as usize;
        self.bays.rotate_left(times);
    }

    pub fn bays(&self) -> [CubeColor; BAY_COUNT] {
        self.bays
    }

    /// Cumulative 90° steps rotated since the last reset.
    pub fn rotated(&self) -> i32 {
        self.rotated
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Plans and queues the commands to build the detected cube configuration.
pub struct Builder {
    queue: Sender<Command>,
    config: [CubeColor; SLOT_COUNT],
    states: [CubeState; SLOT_COUNT],
    grid: RotationTracker,
}

impl Builder {
    pub fn new(queue: Sender<Command>) -> Self {
        Self {
            queue,
            config: [CubeColor::Unknown; SLOT_COUNT],
            states: [CubeState::Unknown; SLOT_COUNT],
            grid: RotationTracker::new(),
        }
    }

    /// Resets the rotational state and placement bookkeeping. The target
    /// configuration is left alone; it is only ever installed through
    /// [`set_config`](Self::set_config).
    pub fn reset(&mut self) {
        self.grid.reset();
        self.states = [CubeState::Unknown; SLOT_COUNT];
    }

    pub fn cube_states(&self) -> [CubeState; SLOT_COUNT] {
        self.states
    }

    pub fn bays(&self) -> [CubeColor; BAY_COUNT] {
        self.grid.bays()
    }

    pub fn rotated(&self) -> i32 {
        self.grid.rotated()
    }

    /// Installs the target configuration.
    ///
    /// A top slot above an unresolved bottom slot is forced back to
    /// `Unknown`: until the bottom is resolved, the recognizer cannot tell a
    /// genuinely empty top slot from one occluded by the unresolved state
    /// below it.
    pub fn set_config(&mut self, mut config: [CubeColor; SLOT_COUNT]) {
        for i in 0..BAY_COUNT {
            if config[i] == CubeColor::Unknown {
                config[i + BAY_COUNT] = CubeColor::Unknown;
            }
        }
        self.config = config;
    }

    /// Builds the configuration, optionally placing same-color doubles first.
    pub fn build(&mut self, build_doubles_first: bool) {
        if build_doubles_first {
            self.build_doubles();
        }
        self.build_whats_possible();
        self.finish_build();
    }

    /// Places every sector whose bottom and top hold the same known color as
    /// a single two-cube drop, saving one full place cycle per pair.
    ///
    /// Sectors whose pair is already placed are skipped, so a repeated call
    /// is a no-op.
    pub fn build_doubles(&mut self) {
        let mut colors = [CubeColor::None; BAY_COUNT];
        for i in 0..BAY_COUNT {
            if self.config[i] == self.config[i + BAY_COUNT]
                && self.config[i] != CubeColor::Unknown
                && self.states[i] != CubeState::Placed
            {
                colors[i] = self.config[i];
                self.states[i] = CubeState::Placed;
                self.states[i + BAY_COUNT] = CubeState::Placed;
            }
        }
        self.build_config(colors, true);
    }

    /// Places every cube whose slot is resolved, bottom slots before the top
    /// slot of the same sector. Slots still `Unknown` are left for a later
    /// call once the recognizer has resolved them.
    pub fn build_whats_possible(&mut self) {
        loop {
            self.update_cube_states();
            self.place_not_placed();
            if self.states.iter().all(|s| *s != CubeState::NotPlaced) {
                break;
            }
        }
    }

    /// Returns the turntable to its home orientation and lowers the lift.
    pub fn finish_build(&mut self) {
        self.rotate_grid(4 - self.grid.rotated());
        info!("move lift down command queued");
        self.send(Command::MoveLift(MoveLift::Down));
    }

    /// One placement pass: each sector contributes its bottom slot if that is
    /// still unplaced, else its top slot — never both in the same pass.
    fn place_not_placed(&mut self) {
        let mut colors = [CubeColor::None; BAY_COUNT];
        for i in 0..BAY_COUNT {
            if self.states[i] == CubeState::NotPlaced {
                colors[i] = self.config[i];
                self.states[i] = CubeState::Placed;
            } else if self.states[i + BAY_COUNT] == CubeState::NotPlaced {
                colors[i] = self.config[i + BAY_COUNT];
                self.states[i + BAY_COUNT] = CubeState::Placed;
            }
        }
        self.build_config(colors, false);
    }

    /// Derives placement states from the configuration: empty slots count as
    /// placed, freshly resolved cubes become `NotPlaced`.
    fn update_cube_states(&mut self) {
        for i in 0..SLOT_COUNT {
            match self.config[i] {
                CubeColor::None => self.states[i] = CubeState::Placed,
                color if color.is_cube() && self.states[i] == CubeState::Unknown => {
                    self.states[i] = CubeState::NotPlaced;
                }
                _ => {}
            }
        }
    }

    /// Works off a 4-slot color list: place whatever matches the bays at the
    /// current rotation, otherwise probe one 90° step at a time (at most 3 —
    /// after that every bay has been visited) until something matches.
    ///
    /// Precondition: every color in the list occurs in the bay color
    /// universe, otherwise no rotation can ever match it.
    pub fn build_config(&mut self, initial: [CubeColor; BAY_COUNT], two_cubes: bool) {
        let mut colors = initial;
        while !config_none(&colors) {
            let (mut matched, mut remaining) = self.match_with_config(&colors);
            let mut times = 0;
            while array_false(&matched) {
                times += 1;
                self.grid.shift(1);
                (matched, remaining) = self.match_with_config(&colors);
            }
            colors = remaining;
            self.queue_grid_rotation(times);
            self.place_cubes(&matched, two_cubes);
        }
    }

    /// Matches the color list against the live bay mapping. Returns which
    /// bays match and the list with matched slots cleared to `None`.
    pub fn match_with_config(
        &self,
        colors: &[CubeColor; BAY_COUNT],
    ) -> ([bool; BAY_COUNT], [CubeColor; BAY_COUNT]) {
        let mut matched = [false; BAY_COUNT];
        let mut remaining = *colors;
        let bays = self.grid.bays();
        for i in 0..BAY_COUNT {
            if bays[i] == colors[i] && colors[i] != CubeColor::None {
                matched[i] = true;
                remaining[i] = CubeColor::None;
            }
        }
        (matched, remaining)
    }

    /// Queues a single placement for every matching bay. With `two_cubes`
    /// each count is doubled (bottom + top dropped in one motion).
    fn place_cubes(&mut self, matched: &[bool; BAY_COUNT], two_cubes: bool) {
        let mut place = PlaceCubes::default();
        let bays = self.grid.bays();
        for i in 0..BAY_COUNT {
            if matched[i] {
                match bays[i] {
                    CubeColor::Red => place.red = 1,
                    CubeColor::Yellow => place.yellow = 1,
                    CubeColor::Blue => place.blue = 1,
                    _ => {}
                }
            }
        }
        if place.total() > 0 {
            if two_cubes {
                place.red *= 2;
                place.yellow *= 2;
                place.blue *= 2;
            }
            info!(
                "place cubes command queued - red: {}, yellow: {}, blue: {}",
                place.red, place.yellow, place.blue
            );
            self.send(Command::PlaceCubes(place));
        }
    }

    /// Rotates the turntable by `times` 90° steps, keeping the bay mapping in
    /// step. A multiple of 4 emits nothing.
    pub fn rotate_grid(&mut self, times: i32) {
        self.queue_grid_rotation(times);
        self.grid.shift(times);
    }

    /// Queues the wire rotation and records it for homing only — the bay
    /// mapping is the caller's concern (the placement search has already
    /// shifted it step by step).
    fn queue_grid_rotation(&mut self, times: i32) {
        if times.rem_euclid(BAY_COUNT as i32) == 0 {
            return;
        }
        let rotate = RotateGrid::new(times * 90);
        info!("rotate grid command queued: {}°", rotate.degrees);
        self.grid.record(times);
        self.send(Command::RotateGrid(rotate));
    }

    fn send(&self, command: Command) {
        // Sending only fails once the writer is gone, i.e. during shutdown.
        let _ = self.queue.send(command);
    }
}

/// True if no bay matched.
pub fn array_false(values: &[bool; BAY_COUNT]) -> bool {
    !values.iter().any(|v| *v)
}

/// True once the whole color list has been worked off.
pub fn config_none(colors: &[CubeColor; BAY_COUNT]) -> bool {
    colors.iter().all(|c| *c == CubeColor::None)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Receiver};
    use CubeColor::{Blue, None, Red, Unknown, Yellow};

    fn test_builder() -> (Builder, Receiver<Command>) {
        let (tx, rx) = unbounded();
        (Builder::new(tx), rx)
    }

    fn expect_rotate(rx: &Receiver<Command>, degrees: i16) {
        match rx.try_recv() {
            Ok(Command::RotateGrid(r)) => assert_eq!(r.degrees, degrees),
            other => panic!("expected RotateGrid({degrees}), got {other:?}"),
        }
    }

    fn expect_place(rx: &Receiver<Command>, red: u8, yellow: u8, blue: u8) {
        match rx.try_recv() {
            Ok(Command::PlaceCubes(p)) => {
                assert_eq!((p.red, p.yellow, p.blue), (red, yellow, blue));
            }
            other => panic!("expected PlaceCubes({red},{yellow},{blue}), got {other:?}"),
        }
    }

    fn expect_lift_down(rx: &Receiver<Command>) {
        match rx.try_recv() {
            Ok(Command::MoveLift(MoveLift::Down)) => {}
            other => panic!("expected MoveLift(Down), got {other:?}"),
        }
    }

    fn expect_empty(rx: &Receiver<Command>) {
        assert!(rx.try_recv().is_err(), "queue should be drained");
    }

    #[test]
    fn shift_moves_bays_left() {
        let (mut builder, _rx) = test_builder();

        builder.grid.shift(1);
        assert_eq!(builder.bays(), [Red, Yellow, Blue, None]);

        builder.reset();
        builder.grid.shift(2);
        assert_eq!(builder.bays(), [Yellow, Blue, None, Red]);

        builder.reset();
        builder.grid.shift(6);
        assert_eq!(builder.bays(), [Yellow, Blue, None, Red]);

        builder.reset();
        builder.grid.shift(-1);
        assert_eq!(builder.bays(), [Blue, None, Red, Yellow]);

        builder.reset();
        builder.grid.shift(-6);
        assert_eq!(builder.bays(), [Yellow, Blue, None, Red]);
    }

    #[test]
    fn shift_is_a_group_action() {
        let (mut builder, _rx) = test_builder();
        for (a, b) in [(1, 2), (3, 3), (-1, 1), (2, -5), (0, 0)] {
            builder.grid.reset();
            builder.grid.shift(a);
            builder.grid.shift(b);
            let stepwise = builder.bays();

            builder.grid.reset();
            builder.grid.shift(a + b);
            assert_eq!(stepwise, builder.bays(), "shift({a}) then shift({b})");
        }

        builder.grid.reset();
        let home = builder.bays();
        builder.grid.shift(0);
        assert_eq!(builder.bays(), home);
        builder.grid.shift(4);
        assert_eq!(builder.bays(), home);
    }

    #[test]
    fn rotate_grid_normalizes_degrees() {
        let (mut builder, rx) = test_builder();

        let cases = [
            (-5, Some(-90)),
            (-4, Option::None),
            (-3, Some(90)),
            (-2, Some(180)),
            (-1, Some(-90)),
            (0, Option::None),
            (1, Some(90)),
            (2, Some(180)),
            (3, Some(-90)),
            (4, Option::None),
            (5, Some(90)),
        ];
        for (times, expected) in cases {
            builder.rotate_grid(times);
            match expected {
                Some(degrees) => expect_rotate(&rx, degrees),
                Option::None => expect_empty(&rx),
            }
        }
    }

    #[test]
    fn place_cubes_maps_bays_to_colors() {
        let (mut builder, rx) = test_builder();

        builder.place_cubes(&[false, false, false, false], false);
        expect_empty(&rx);

        builder.place_cubes(&[false, true, true, true], false);
        expect_place(&rx, 1, 1, 1);

        // The bay under the reference sector feeds nothing.
        builder.place_cubes(&[true, false, false, false], false);
        expect_empty(&rx);

        builder.place_cubes(&[false, false, true, false], false);
        expect_place(&rx, 0, 1, 0);

        // After a half turn the mapping follows the bays.
        builder.rotate_grid(2);
        expect_rotate(&rx, 180);
        builder.place_cubes(&[true, false, false, false], false);
        expect_place(&rx, 0, 1, 0);
        builder.place_cubes(&[false, true, false, false], false);
        expect_place(&rx, 0, 0, 1);
    }

    #[test]
    fn detectors() {
        assert!(array_false(&[false, false, false, false]));
        assert!(!array_false(&[false, true, false, false]));
        assert!(!array_false(&[true, true, true, true]));

        assert!(config_none(&[None, None, None, None]));
        assert!(!config_none(&[Red, None, None, None]));
    }

    #[test]
    fn match_with_config_clears_matches() {
        let (mut builder, rx) = test_builder();

        let (matched, remaining) = builder.match_with_config(&[None, Red, Yellow, Blue]);
        assert_eq!(matched, [false, true, true, true]);
        assert_eq!(remaining, [None, None, None, None]);

        builder.rotate_grid(1);
        expect_rotate(&rx, 90);
        let (matched, remaining) = builder.match_with_config(&[Red, Yellow, Blue, Red]);
        assert_eq!(matched, [true, true, true, false]);
        assert_eq!(remaining, [None, None, None, Red]);
    }

    #[test]
    fn set_config_masks_top_of_unknown_bottom() {
        let (mut builder, _rx) = test_builder();
        builder.set_config([Red, Unknown, None, Unknown, Red, Yellow, Blue, Red]);

        let config = builder.config;
        assert_eq!(config[5], Unknown);
        assert_eq!(config[7], Unknown);
        // Resolved bottoms keep their tops.
        assert_eq!(config[4], Red);
        assert_eq!(config[6], Blue);
    }

    #[test]
    fn update_cube_states_from_config() {
        let (mut builder, _rx) = test_builder();
        builder.set_config([Red, Yellow, None, Red, Red, Yellow, None, Red]);
        builder.update_cube_states();
        assert_eq!(
            builder.cube_states(),
            [
                CubeState::NotPlaced,
                CubeState::NotPlaced,
                CubeState::Placed,
                CubeState::NotPlaced,
                CubeState::NotPlaced,
                CubeState::NotPlaced,
                CubeState::Placed,
                CubeState::NotPlaced,
            ]
        );
    }

    #[test]
    fn build_config_single_pass() {
        let (mut builder, rx) = test_builder();
        builder.build_config([None, Red, Yellow, Blue], false);
        expect_place(&rx, 1, 1, 1);
        expect_empty(&rx);
    }

    #[test]
    fn build_config_all_red_sweeps_every_bay() {
        let (mut builder, rx) = test_builder();
        builder.build_config([Red, Red, Red, Red], false);

        // One cube matches immediately, the other three need one step each:
        // 7 commands total, ending on a placement.
        expect_place(&rx, 1, 0, 0);
        for _ in 0..3 {
            expect_rotate(&rx, 90);
            expect_place(&rx, 1, 0, 0);
        }
        expect_empty(&rx);
    }

    #[test]
    fn build_whole_configuration() {
        let (mut builder, rx) = test_builder();
        builder.set_config([Red, Yellow, None, Red, None, None, None, None]);
        builder.build(false);

        expect_rotate(&rx, 90);
        expect_place(&rx, 1, 1, 0);
        expect_rotate(&rx, 90);
        expect_place(&rx, 1, 0, 0);
        expect_rotate(&rx, 180);
        expect_lift_down(&rx);
        expect_empty(&rx);
    }

    #[test]
    fn build_doubles_first_full_scenario() {
        let (mut builder, rx) = test_builder();
        builder.set_config([Red, Yellow, None, Red, Red, Yellow, None, Red]);
        builder.build(true);

        expect_rotate(&rx, 90);
        expect_place(&rx, 2, 2, 0);
        expect_rotate(&rx, 90);
        expect_place(&rx, 2, 0, 0);
        expect_rotate(&rx, 180);
        expect_lift_down(&rx);
        expect_empty(&rx);
    }

    #[test]
    fn build_doubles_mixed_with_singles() {
        let (mut builder, rx) = test_builder();
        builder.set_config([Red, Yellow, None, Red, Red, Blue, None, Red]);
        builder.build(true);

        // Doubles: sectors 1 and 4 (red pairs).
        expect_rotate(&rx, 90);
        expect_place(&rx, 2, 0, 0);
        expect_rotate(&rx, 90);
        expect_place(&rx, 2, 0, 0);
        // Singles: yellow bottom, then blue top of the same sector.
        expect_rotate(&rx, -90);
        expect_place(&rx, 0, 1, 0);
        expect_rotate(&rx, 90);
        expect_place(&rx, 0, 0, 1);
        // Homing + lift.
        expect_rotate(&rx, 180);
        expect_lift_down(&rx);
        expect_empty(&rx);
    }

    #[test]
    fn build_doubles_is_idempotent() {
        let (mut builder, rx) = test_builder();
        builder.set_config([Red, Yellow, None, Red, Red, Yellow, None, Red]);

        builder.build_doubles();
        while rx.try_recv().is_ok() {}

        builder.build_doubles();
        expect_empty(&rx);
        assert!(builder
            .cube_states()
            .iter()
            .all(|s| *s == CubeState::Placed));
    }

    #[test]
    fn incremental_build_as_slots_resolve() {
        let (mut builder, rx) = test_builder();

        // Sector 2's bottom is unresolved, which also masks its top.
        builder.set_config([Red, Unknown, None, Red, Red, Yellow, None, Red]);
        builder.build_whats_possible();

        expect_rotate(&rx, 90);
        expect_place(&rx, 1, 0, 0);
        expect_rotate(&rx, 90);
        expect_place(&rx, 1, 0, 0);
        expect_place(&rx, 1, 0, 0);
        expect_rotate(&rx, -90);
        expect_place(&rx, 1, 0, 0);
        expect_empty(&rx);

        // The recognizer resolves the remaining sector; only the yellow pair
        // is still outstanding.
        builder.set_config([Red, Yellow, None, Red, Red, Yellow, None, Red]);
        builder.build_whats_possible();

        expect_place(&rx, 0, 1, 0);
        expect_place(&rx, 0, 1, 0);
        expect_empty(&rx);

        builder.finish_build();
        expect_rotate(&rx, -90);
        expect_lift_down(&rx);
        expect_empty(&rx);
    }

    #[test]
    fn finish_build_from_home_only_lowers_lift() {
        let (mut builder, rx) = test_builder();
        builder.finish_build();
        expect_lift_down(&rx);
        expect_empty(&rx);
    }

    #[test]
    fn placed_state_never_reverts() {
        let (mut builder, _rx) = test_builder();
        builder.set_config([Red, None, None, None, None, None, None, None]);
        builder.build_whats_possible();
        assert!(builder
            .cube_states()
            .iter()
            .all(|s| *s == CubeState::Placed));

        // A later update must not knock placed slots back.
        builder.set_config([Red, None, None, None, Red, None, None, None]);
        builder.build_whats_possible();
        assert!(builder
            .cube_states()
            .iter()
            .all(|s| *s == CubeState::Placed));
    }
}
