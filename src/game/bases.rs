//! Baserunners
//!
//! Base occupancy and the advancement rules applied after each plate
//! appearance. A new [`BaseState`] is built from scratch for every play, and
//! placing two runners on one base is an error rather than an overwrite.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::error::StateViolation;
use crate::game::events::PlayKind;
use crate::game::physics::{BattedBall, OutKind};
use crate::stats::player::PlayerId;

/// Runner from second scores on a single.
const SCORE_FROM_SECOND_ON_SINGLE: f64 = 0.60;
/// Runner from first scores on a double.
const SCORE_FROM_FIRST_ON_DOUBLE: f64 = 0.42;
/// Runner from first takes third on a single.
const FIRST_TO_THIRD_ON_SINGLE: f64 = 0.33;

/// A base a runner can occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Base {
    First,
    Second,
    Third,
}

impl Base {
    const ALL: [Base; 3] = [Base::First, Base::Second, Base::Third];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Base::First => "first base",
            Base::Second => "second base",
            Base::Third => "third base",
        })
    }
}

/// Start or end point of a runner's movement on a play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Station {
    /// The batter's box
    Batter,
    First,
    Second,
    Third,
    /// Scored
    Home,
}

impl From<Base> for Station {
    fn from(base: Base) -> Self {
        match base {
            Base::First => Station::First,
            Base::Second => Station::Second,
            Base::Third => Station::Third,
        }
    }
}

/// One runner's movement on a play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunnerMove {
    /// Player moving
    pub runner: PlayerId,
    /// Where they started
    pub from: Station,
    /// Where they ended up
    pub to: Station,
}

impl RunnerMove {
    /// Runner crossed the plate.
    #[inline]
    pub fn scored(&self) -> bool {
        self.to == Station::Home
    }
}

// =============================================================================
// BASE STATE
// =============================================================================

/// Who is on each base.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseState {
    bases: [Option<PlayerId>; 3],
}

impl BaseState {
    /// Bases empty.
    pub const fn empty() -> Self {
        Self { bases: [None; 3] }
    }

    /// Runner standing on `base`.
    #[inline]
    pub fn runner_on(&self, base: Base) -> Option<PlayerId> {
        self.bases[base.index()]
    }

    /// Whether `base` holds a runner.
    #[inline]
    pub fn is_occupied(&self, base: Base) -> bool {
        self.runner_on(base).is_some()
    }

    /// No runners on.
    pub fn is_empty(&self) -> bool {
        self.bases.iter().all(Option::is_none)
    }

    /// Number of runners on base.
    pub fn count(&self) -> u8 {
        self.bases.iter().filter(|b| b.is_some()).count() as u8
    }

    /// Put a runner on an empty base.
    pub fn place(&mut self, base: Base, runner: PlayerId) -> Result<(), StateViolation> {
        let slot = &mut self.bases[base.index()];
        if slot.is_some() {
            return Err(StateViolation::BaseOccupied { base });
        }
        *slot = Some(runner);
        Ok(())
    }

    /// Runners lead-first: third, second, first.
    pub fn runners_lead_first(&self) -> impl Iterator<Item = (Base, PlayerId)> + '_ {
        Base::ALL
            .iter()
            .rev()
            .filter_map(move |&base| self.runner_on(base).map(|id| (base, id)))
    }

    /// Stable encoding for state hashing.
    pub fn occupancy_bits(&self) -> u8 {
        Base::ALL
            .iter()
            .filter(|&&b| self.is_occupied(b))
            .fold(0, |bits, &b| bits | 1 << b.index())
    }
}

// =============================================================================
// ADVANCEMENT
// =============================================================================

/// Bases after a play and how everyone got there.
#[derive(Clone, Debug, PartialEq)]
pub struct Advancement {
    /// Bases after the play
    pub bases: BaseState,
    /// Lead runner first; the batter's own move comes last.
    pub moves: Vec<RunnerMove>,
    /// Runs that crossed the plate
    pub runs: u32,
    /// A runner scored from third on a caught fly ball.
    pub sacrifice_fly: bool,
}

struct Builder {
    bases: BaseState,
    moves: Vec<RunnerMove>,
    runs: u32,
}

impl Builder {
    fn new() -> Self {
        Self {
            bases: BaseState::empty(),
            moves: Vec::with_capacity(4),
            runs: 0,
        }
    }

    fn send(&mut self, runner: PlayerId, from: Station, to: Station) -> Result<(), StateViolation> {
        match to {
            Station::Home => self.runs += 1,
            Station::First => self.bases.place(Base::First, runner)?,
            Station::Second => self.bases.place(Base::Second, runner)?,
            Station::Third => self.bases.place(Base::Third, runner)?,
            Station::Batter => {}
        }
        if from != to {
            self.moves.push(RunnerMove { runner, from, to });
        }
        Ok(())
    }

    /// Keep a runner on the base they occupy.
    fn hold(&mut self, runner: PlayerId, base: Base) -> Result<(), StateViolation> {
        self.send(runner, base.into(), base.into())
    }

    fn finish(self, sacrifice_fly: bool) -> Advancement {
        Advancement {
            bases: self.bases,
            moves: self.moves,
            runs: self.runs,
            sacrifice_fly,
        }
    }
}

/// Apply a terminal plate appearance to the bases.
///
/// `outs_before` is the out count before the play. Plays that record the
/// third out never score runs, so callers only need this for plays that
/// leave the inning alive; for a third out it returns the bases unchanged
/// and no runs.
pub fn advance(
    bases: &BaseState,
    batter: PlayerId,
    play: &PlayKind,
    outs_before: u8,
    batted: Option<&BattedBall>,
    rng: &mut DeterministicRng,
) -> Result<Advancement, StateViolation> {
    let mut b = Builder::new();
    let on = |base| bases.runner_on(base);

    match *play {
        PlayKind::HomeRun => {
            for (base, runner) in bases.runners_lead_first() {
                b.send(runner, base.into(), Station::Home)?;
            }
            b.send(batter, Station::Batter, Station::Home)?;
        }

        PlayKind::Triple => {
            for (base, runner) in bases.runners_lead_first() {
                b.send(runner, base.into(), Station::Home)?;
            }
            b.send(batter, Station::Batter, Station::Third)?;
        }

        PlayKind::Double => {
            if let Some(r) = on(Base::Third) {
                b.send(r, Station::Third, Station::Home)?;
            }
            if let Some(r) = on(Base::Second) {
                b.send(r, Station::Second, Station::Home)?;
            }
            if let Some(r) = on(Base::First) {
                let to = if rng.next_bool(SCORE_FROM_FIRST_ON_DOUBLE) { Station::Home } else { Station::Third };
                b.send(r, Station::First, to)?;
            }
            b.send(batter, Station::Batter, Station::Second)?;
        }

        PlayKind::Single => {
            if let Some(r) = on(Base::Third) {
                b.send(r, Station::Third, Station::Home)?;
            }
            if let Some(r) = on(Base::Second) {
                let to = if rng.next_bool(SCORE_FROM_SECOND_ON_SINGLE) { Station::Home } else { Station::Third };
                b.send(r, Station::Second, to)?;
            }
            if let Some(r) = on(Base::First) {
                let third_open = !b.bases.is_occupied(Base::Third);
                let to = if third_open && rng.next_bool(FIRST_TO_THIRD_ON_SINGLE) {
                    Station::Third
                } else {
                    Station::Second
                };
                b.send(r, Station::First, to)?;
            }
            b.send(batter, Station::Batter, Station::First)?;
        }

        PlayKind::Walk | PlayKind::HitByPitch => {
            // Only forced runners move
            let forced_first = bases.is_occupied(Base::First);
            let forced_second = forced_first && bases.is_occupied(Base::Second);
            let forced_third = forced_second && bases.is_occupied(Base::Third);

            if let Some(r) = on(Base::Third) {
                if forced_third {
                    b.send(r, Station::Third, Station::Home)?;
                } else {
                    b.hold(r, Base::Third)?;
                }
            }
            if let Some(r) = on(Base::Second) {
                if forced_second {
                    b.send(r, Station::Second, Station::Third)?;
                } else {
                    b.hold(r, Base::Second)?;
                }
            }
            if let Some(r) = on(Base::First) {
                b.send(r, Station::First, Station::Second)?;
            }
            b.send(batter, Station::Batter, Station::First)?;
        }

        PlayKind::InPlayOut(OutKind::Groundout) if outs_before < 2 => {
            for (base, runner) in bases.runners_lead_first() {
                let to = match base {
                    Base::Third => Station::Home,
                    Base::Second => Station::Third,
                    Base::First => Station::Second,
                };
                b.send(runner, base.into(), to)?;
            }
        }

        PlayKind::InPlayOut(OutKind::Flyout)
            if outs_before < 2 && bases.is_occupied(Base::Third) && batted.is_some_and(BattedBall::is_outfield) =>
        {
            for (base, runner) in bases.runners_lead_first() {
                if base == Base::Third {
                    b.send(runner, Station::Third, Station::Home)?;
                } else {
                    b.hold(runner, base)?;
                }
            }
            return Ok(b.finish(true));
        }

        PlayKind::Strikeout { .. } | PlayKind::InPlayOut(_) => {
            for (base, runner) in bases.runners_lead_first() {
                b.hold(runner, base)?;
            }
        }
    }

    Ok(b.finish(false))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::outcome::ContactQuality;
    use crate::game::physics::BattedBallResult;

    const BATTER: PlayerId = PlayerId(100);
    const R1: PlayerId = PlayerId(1);
    const R2: PlayerId = PlayerId(2);
    const R3: PlayerId = PlayerId(3);

    fn bases(first: bool, second: bool, third: bool) -> BaseState {
        let mut b = BaseState::empty();
        if first {
            b.place(Base::First, R1).unwrap();
        }
        if second {
            b.place(Base::Second, R2).unwrap();
        }
        if third {
            b.place(Base::Third, R3).unwrap();
        }
        b
    }

    fn fly(distance: f64) -> BattedBall {
        BattedBall {
            quality: ContactQuality::FlyBall,
            exit_velocity: 95.0,
            launch_angle: 32.0,
            horizontal_angle: 0.0,
            distance,
            wall_distance: 400.0,
            wall_height: 8.0,
            result: BattedBallResult::Out(OutKind::Flyout),
        }
    }

    fn run(start: BaseState, play: PlayKind, outs: u8) -> Advancement {
        let mut rng = DeterministicRng::new(1);
        advance(&start, BATTER, &play, outs, None, &mut rng).unwrap()
    }

    #[test]
    fn test_place_rejects_double_occupancy() {
        let mut b = bases(true, false, false);
        assert_eq!(
            b.place(Base::First, R2),
            Err(StateViolation::BaseOccupied { base: Base::First })
        );
    }

    #[test]
    fn test_home_run_clears_bases() {
        let adv = run(bases(true, true, true), PlayKind::HomeRun, 0);
        assert_eq!(adv.runs, 4);
        assert!(adv.bases.is_empty());
        assert_eq!(adv.moves.len(), 4);
        assert_eq!(adv.moves[0].runner, R3);
        assert_eq!(adv.moves[3].runner, BATTER);
    }

    #[test]
    fn test_triple_scores_everyone() {
        let adv = run(bases(true, false, true), PlayKind::Triple, 1);
        assert_eq!(adv.runs, 2);
        assert_eq!(adv.bases.runner_on(Base::Third), Some(BATTER));
        assert_eq!(adv.bases.count(), 1);
    }

    #[test]
    fn test_walk_forces_only() {
        // Runners on first and third: third is not forced
        let adv = run(bases(true, false, true), PlayKind::Walk, 0);
        assert_eq!(adv.runs, 0);
        assert_eq!(adv.bases.runner_on(Base::First), Some(BATTER));
        assert_eq!(adv.bases.runner_on(Base::Second), Some(R1));
        assert_eq!(adv.bases.runner_on(Base::Third), Some(R3));
    }

    #[test]
    fn test_bases_loaded_walk_forces_run() {
        let adv = run(bases(true, true, true), PlayKind::HitByPitch, 2);
        assert_eq!(adv.runs, 1);
        assert_eq!(adv.bases.count(), 3);
        assert!(adv.moves.iter().any(|m| m.runner == R3 && m.scored()));
    }

    #[test]
    fn test_single_scores_from_third() {
        let adv = run(bases(false, false, true), PlayKind::Single, 0);
        assert_eq!(adv.runs, 1);
        assert_eq!(adv.bases.runner_on(Base::First), Some(BATTER));
    }

    #[test]
    fn test_single_outcomes_stay_legal() {
        let mut rng = DeterministicRng::new(42);
        for _ in 0..500 {
            let adv = advance(&bases(true, true, false), BATTER, &PlayKind::Single, 0, None, &mut rng).unwrap();
            // Two runners plus the batter are accounted for
            assert_eq!(adv.runs as u8 + adv.bases.count(), 3);
            assert_eq!(adv.bases.runner_on(Base::First), Some(BATTER));
        }
    }

    #[test]
    fn test_double_moves_runner_from_first_at_least_to_third() {
        let mut rng = DeterministicRng::new(9);
        let mut scored = 0;
        for _ in 0..1000 {
            let adv = advance(&bases(true, false, false), BATTER, &PlayKind::Double, 1, None, &mut rng).unwrap();
            assert_eq!(adv.bases.runner_on(Base::Second), Some(BATTER));
            if adv.runs == 1 {
                scored += 1;
            } else {
                assert_eq!(adv.bases.runner_on(Base::Third), Some(R1));
            }
        }
        assert!((330..510).contains(&scored), "scored {scored}");
    }

    #[test]
    fn test_groundout_advances_with_less_than_two_outs() {
        let adv = run(bases(true, false, true), PlayKind::InPlayOut(OutKind::Groundout), 1);
        assert_eq!(adv.runs, 1);
        assert_eq!(adv.bases.runner_on(Base::Second), Some(R1));
        assert!(!adv.bases.is_occupied(Base::First));
    }

    #[test]
    fn test_groundout_with_two_outs_holds() {
        let start = bases(true, false, true);
        let adv = run(start, PlayKind::InPlayOut(OutKind::Groundout), 2);
        assert_eq!(adv.runs, 0);
        assert_eq!(adv.bases, start);
    }

    #[test]
    fn test_sacrifice_fly() {
        let mut rng = DeterministicRng::new(1);
        let start = bases(true, false, true);
        let deep = fly(310.0);
        let adv = advance(&start, BATTER, &PlayKind::InPlayOut(OutKind::Flyout), 0, Some(&deep), &mut rng).unwrap();
        assert_eq!(adv.runs, 1);
        assert!(adv.sacrifice_fly);
        assert_eq!(adv.bases.runner_on(Base::First), Some(R1));

        let shallow = fly(150.0);
        let adv = advance(&start, BATTER, &PlayKind::InPlayOut(OutKind::Flyout), 0, Some(&shallow), &mut rng).unwrap();
        assert_eq!(adv.runs, 0);
        assert!(!adv.sacrifice_fly);
    }

    #[test]
    fn test_strikeout_and_popout_hold() {
        let start = bases(true, true, true);
        for play in [PlayKind::Strikeout { looking: false }, PlayKind::InPlayOut(OutKind::Popout)] {
            let adv = run(start, play, 0);
            assert_eq!(adv.bases, start);
            assert_eq!(adv.runs, 0);
            assert!(adv.moves.is_empty());
        }
    }
}
