//! Game State Machine
//!
//! Drives one game from first pitch to final out:
//!
//! ```text
//! PreGame -> HalfInning -> AtBat (repeats) -> InningEnd -> HalfInning | GameEnd
//!                              \-> GameEnd (walk-off)
//! ```
//!
//! Each [`GameMachine::step`] performs one transition and appends its events
//! to the state's log. A plate appearance is resolved in full into a buffer
//! before anything is applied, so stopping between steps always leaves a
//! consistent log. All randomness comes from the machine's one
//! [`DeterministicRng`], seeded from the matchup.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::core::rng::DeterministicRng;
use crate::error::{SimError, StateViolation};
use crate::feed::EventLog;
use crate::game::bases::advance;
use crate::game::events::{GameEventData, PitchEvent, PlayKind};
use crate::game::matchup::MatchupContext;
use crate::game::outcome::{resolve, CountOutcome, PlateMatchup};
use crate::game::physics::{resolve_batted_ball, spray_angle};
use crate::game::pitch::{next_pitch, Count};
use crate::game::state::{GameState, Half, PlateAppearance};

/// Named states of a game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing logged yet
    #[default]
    PreGame,
    /// About to open a half-inning
    HalfInning,
    /// A batter is due up
    AtBat,
    /// Third out recorded; the half needs closing
    InningEnd,
    /// `GameEnded` has been logged
    GameEnd,
}

/// Steps a single game.
pub struct GameMachine<'a> {
    ctx: &'a MatchupContext,
    config: &'a SimConfig,
    state: GameState,
    rng: DeterministicRng,
    phase: Phase,
}

impl<'a> GameMachine<'a> {
    /// Set up a game from a built matchup.
    pub fn new(ctx: &'a MatchupContext, config: &'a SimConfig) -> Result<Self, SimError> {
        let state = GameState::new(
            ctx.seed,
            config.rules.regulation_innings.max(1),
            ctx.away.lineup.clone(),
            ctx.home.lineup.clone(),
        )?;
        Ok(Self {
            ctx,
            config,
            state,
            rng: DeterministicRng::new(ctx.seed),
            phase: Phase::PreGame,
        })
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Events recorded so far.
    pub fn log(&self) -> &EventLog {
        &self.state.log
    }

    /// The game has ended.
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameEnd
    }

    /// Perform one transition. Returns the phase entered.
    pub fn step(&mut self) -> Result<Phase, SimError> {
        self.phase = match self.phase {
            Phase::PreGame => self.start_game(),
            Phase::HalfInning => {
                let pitcher = self.ctx.team(self.state.half.fielding_side()).starter.player;
                self.state.start_half(pitcher)?;
                debug!(
                    inning = self.state.inning,
                    half = self.state.half.label(),
                    score = %self.state.score,
                    "Half-inning started"
                );
                Phase::AtBat
            }
            Phase::AtBat => self.at_bat()?,
            Phase::InningEnd => self.end_half()?,
            Phase::GameEnd => return Err(StateViolation::GameOver.into()),
        };
        Ok(self.phase)
    }

    /// Play to the end.
    pub fn run(&mut self) -> Result<(), SimError> {
        while !self.is_over() {
            self.step()?;
        }
        Ok(())
    }

    /// Play to the end unless `cancel` is raised.
    ///
    /// The flag is read only when a batter is due up, so a cancelled game
    /// stops between plate appearances with its log intact.
    pub fn run_cancellable(&mut self, cancel: &AtomicBool) -> Result<(), SimError> {
        while !self.is_over() {
            if self.phase == Phase::AtBat && cancel.load(Ordering::Acquire) {
                info!(
                    plate_appearances = self.state.plate_appearances,
                    events = self.state.log.len(),
                    "Simulation cancelled"
                );
                return Err(SimError::Cancelled {
                    completed_plate_appearances: self.state.plate_appearances,
                });
            }
            self.step()?;
        }
        Ok(())
    }

    /// Take the final state.
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Take the event log.
    pub fn into_log(self) -> EventLog {
        self.state.log
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    fn start_game(&mut self) -> Phase {
        let ctx = self.ctx;
        self.state.push_event(GameEventData::GameStarted {
            game_id: ctx.game_id,
            seed: ctx.seed,
            reference_era: ctx.reference_era.season(),
            park: ctx.park.name.clone(),
            away: ctx.away.sheet(),
            home: ctx.home.sheet(),
        });
        info!(
            game_id = %ctx.game_id,
            seed = ctx.seed,
            "{} ({}) at {} ({})",
            ctx.away.name, ctx.away.season, ctx.home.name, ctx.home.season
        );
        Phase::HalfInning
    }

    fn at_bat(&mut self) -> Result<Phase, SimError> {
        let pa = self.simulate_plate_appearance()?;
        let outcome = self.state.apply_plate_appearance(pa)?;

        debug!(
            inning = self.state.inning,
            half = self.state.half.label(),
            batter = %outcome.batter,
            play = outcome.kind.label(),
            runs = outcome.runs_scored,
            outs = outcome.outs_after,
            pitches = outcome.pitches,
            "Plate appearance"
        );

        if outcome.walk_off {
            let innings = self.state.inning;
            self.finish(innings, true)?;
            return Ok(Phase::GameEnd);
        }
        if self.state.half_over() {
            return Ok(Phase::InningEnd);
        }
        Ok(Phase::AtBat)
    }

    fn end_half(&mut self) -> Result<Phase, SimError> {
        let inning = self.state.inning;
        let half = self.state.half;
        let regulation = self.state.regulation_innings;
        self.state.close_half()?;

        let score = self.state.score;
        let over = match half {
            // Home team ahead after the top of the last inning: bottom not needed
            Half::Top => inning >= regulation && score.home > score.away,
            Half::Bottom => {
                (inning >= regulation && score.home != score.away)
                    || self.config.rules.max_innings.is_some_and(|cap| inning >= cap)
            }
        };

        if over {
            self.finish(inning, false)?;
            return Ok(Phase::GameEnd);
        }
        self.state.next_half()?;
        Ok(Phase::HalfInning)
    }

    fn finish(&mut self, innings: u16, walk_off: bool) -> Result<(), SimError> {
        self.state.finish(innings, walk_off)?;
        let hash = self.state.compute_hash();
        info!(
            score = %self.state.score,
            innings,
            walk_off,
            pitches = self.state.pitch_count,
            events = self.state.log.len(),
            state_hash = %hex::encode(&hash[..8]),
            "Game over"
        );
        Ok(())
    }

    // =========================================================================
    // PLATE APPEARANCE
    // =========================================================================

    /// Resolve the current batter's plate appearance without touching state.
    fn simulate_plate_appearance(&mut self) -> Result<PlateAppearance, SimError> {
        let ctx = self.ctx;
        let batting = ctx.team(self.state.batting_side());
        let fielding = ctx.team(self.state.half.fielding_side());

        let batter_id = self.state.current_batter();
        let (batter, bats) = match (batting.batter(batter_id), batting.batter_line(batter_id)) {
            (Some(profile), Some(line)) => (profile, line.bats),
            _ => {
                return Err(SimError::InvalidRoster(format!(
                    "{} has no batting profile for {}",
                    batting.name, batter_id
                )))
            }
        };
        let pitcher = fielding.pitcher();
        let pitcher_id = fielding.starter.player;
        let batter_side = bats.batting_side_against(fielding.starter.throws);

        let matchup = PlateMatchup::new(batter, pitcher, ctx.baseline);

        let mut count = Count::default();
        let mut pitches: Vec<PitchEvent> = Vec::with_capacity(8);

        let (kind, batted_ball) = loop {
            let pitch = next_pitch(pitcher, count, batter_side, &self.state.bases, &mut self.rng)
                .ok_or_else(|| SimError::InvalidRoster(format!("{} has an empty arsenal", pitcher_id)))?;
            let result = resolve(&pitch, &matchup, batter_side, count, &mut self.rng);

            #[cfg(feature = "debug-tracing")]
            tracing::trace!(
                pitch = pitch.pitch_type.code(),
                velocity = pitch.velocity,
                x = pitch.location.x,
                z = pitch.location.z,
                balls = count.balls,
                strikes = count.strikes,
                result = ?result,
                "Pitch"
            );

            let velocity = pitch.velocity;
            let number = pitches.len() + 1;
            pitches.push(PitchEvent {
                pitcher: pitcher_id,
                batter: batter_id,
                number: u16::try_from(number).map_err(|_| StateViolation::PitchLimit { pitches: number })?,
                count,
                pitch,
                result,
            });

            match count.apply(result)? {
                CountOutcome::Continue(next) => count = next,
                CountOutcome::Strikeout { looking } => break (PlayKind::Strikeout { looking }, None),
                CountOutcome::Walk => break (PlayKind::Walk, None),
                CountOutcome::HitByPitch => break (PlayKind::HitByPitch, None),
                CountOutcome::InPlay(quality) => {
                    let angle = spray_angle(batter_side, &mut self.rng);
                    let ball = resolve_batted_ball(
                        quality,
                        &matchup,
                        velocity,
                        &ctx.park,
                        angle,
                        &self.config.fielding,
                        &mut self.rng,
                    );
                    break (PlayKind::from_batted(ball.result), Some(ball));
                }
            }
        };

        let advancement = advance(
            &self.state.bases,
            batter_id,
            &kind,
            self.state.outs,
            batted_ball.as_ref(),
            &mut self.rng,
        )?;

        Ok(PlateAppearance {
            batter: batter_id,
            pitcher: pitcher_id,
            pitches,
            kind,
            batted_ball,
            advancement,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
