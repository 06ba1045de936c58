//! Game State Definitions
//!
//! Score, inning, outs, baserunners, batting orders and the event log for one
//! game. Only the game machine mutates a [`GameState`], and every mutation
//! appends to its log.
//!
//! A plate appearance is resolved into a [`PlateAppearance`] first and then
//! applied in one step by [`GameState::apply_plate_appearance`]. Validation
//! happens before anything is written, so a rejected or abandoned plate
//! appearance never leaves partial state behind.

use serde::{Serialize, Deserialize};

use crate::core::hash::{compute_state_hash, Fingerprint, StateHash, StateHasher};
use crate::error::StateViolation;
use crate::feed::EventLog;
use crate::game::bases::{Advancement, BaseState};
use crate::game::events::{GameEventData, PitchEvent, PlayKind, PlayOutcome};
use crate::game::lineup::BattingOrderManager;
use crate::game::physics::BattedBall;
use crate::stats::player::PlayerId;

/// Outs that end a half-inning.
pub const OUTS_PER_HALF: u8 = 3;

// =============================================================================
// SIDES AND HALVES
// =============================================================================

/// One of the two teams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    #[default]
    Away,
    Home,
}

impl TeamSide {
    /// Both sides, away first.
    pub const ALL: [TeamSide; 2] = [TeamSide::Away, TeamSide::Home];

    /// The other team.
    #[inline]
    pub fn opponent(self) -> TeamSide {
        match self {
            TeamSide::Away => TeamSide::Home,
            TeamSide::Home => TeamSide::Away,
        }
    }

    /// "Away" or "Home".
    pub fn label(self) -> &'static str {
        match self {
            TeamSide::Away => "away",
            TeamSide::Home => "home",
        }
    }
}

/// Top or bottom of an inning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Half {
    #[default]
    Top,
    Bottom,
}

impl Half {
    /// The away team bats in the top.
    #[inline]
    pub fn batting_side(self) -> TeamSide {
        match self {
            Half::Top => TeamSide::Away,
            Half::Bottom => TeamSide::Home,
        }
    }

    /// Team in the field this half.
    #[inline]
    pub fn fielding_side(self) -> TeamSide {
        self.batting_side().opponent()
    }

    /// "Top" or "Bottom".
    pub fn label(self) -> &'static str {
        match self {
            Half::Top => "top",
            Half::Bottom => "bottom",
        }
    }
}

// =============================================================================
// SCORE
// =============================================================================

/// Runs per team.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    /// Visiting team runs
    pub away: u32,
    /// Home team runs
    pub home: u32,
}

impl Score {
    /// Runs for one side.
    pub fn get(&self, side: TeamSide) -> u32 {
        match side {
            TeamSide::Away => self.away,
            TeamSide::Home => self.home,
        }
    }

    /// Add runs. Scores only ever go up.
    pub fn add(&mut self, side: TeamSide, runs: u32) {
        match side {
            TeamSide::Away => self.away += runs,
            TeamSide::Home => self.home += runs,
        }
    }

    /// Team ahead, `None` when tied.
    pub fn leader(&self) -> Option<TeamSide> {
        match self.away.cmp(&self.home) {
            std::cmp::Ordering::Greater => Some(TeamSide::Away),
            std::cmp::Ordering::Less => Some(TeamSide::Home),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl Fingerprint for Score {
    fn fingerprint(&self, hasher: &mut StateHasher) {
        hasher.put(&self.away).put(&self.home);
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.away, self.home)
    }
}

// =============================================================================
// PLATE APPEARANCE
// =============================================================================

/// A fully resolved plate appearance waiting to be applied.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateAppearance {
    /// Batter
    pub batter: PlayerId,
    /// Pitcher
    pub pitcher: PlayerId,
    /// Every pitch, in order
    pub pitches: Vec<PitchEvent>,
    /// How it ended
    pub kind: PlayKind,
    /// Flight details for a ball in play
    pub batted_ball: Option<BattedBall>,
    /// Runner movement, validated against the bases
    pub advancement: Advancement,
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of one game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    /// RNG seed (for verification)
    pub seed: u64,

    /// Innings before extras
    pub regulation_innings: u16,

    /// Current inning, 1-based
    pub inning: u16,

    /// Top or bottom
    pub half: Half,

    /// 0..=2 during play, 3 only between the third out and the half change
    pub outs: u8,

    /// Runs so far
    pub score: Score,

    /// Runners on
    pub bases: BaseState,

    /// Where each team is in its order
    pub lineups: BattingOrderManager,

    /// Completed plate appearances, both teams
    pub plate_appearances: u32,

    /// Pitches thrown, both teams
    pub pitch_count: u32,

    /// Runs this half
    pub half_runs: u32,
    /// Hits this half
    pub half_hits: u32,

    /// Set once `GameEnded` is logged
    pub finished: bool,

    /// Every event recorded so far
    pub log: EventLog,
}

impl GameState {
    /// Create a game state before the first pitch.
    pub fn new(
        seed: u64,
        regulation_innings: u16,
        away: Vec<PlayerId>,
        home: Vec<PlayerId>,
    ) -> Result<Self, StateViolation> {
        Ok(Self {
            seed,
            regulation_innings,
            inning: 1,
            half: Half::Top,
            outs: 0,
            score: Score::default(),
            bases: BaseState::empty(),
            lineups: BattingOrderManager::new(away, home)?,
            plate_appearances: 0,
            pitch_count: 0,
            half_runs: 0,
            half_hits: 0,
            finished: false,
            log: EventLog::new(),
        })
    }

    /// Team at bat.
    #[inline]
    pub fn batting_side(&self) -> TeamSide {
        self.half.batting_side()
    }

    /// Player due up for the team at bat.
    pub fn current_batter(&self) -> PlayerId {
        self.lineups.current_player(self.batting_side())
    }

    /// Third out has been recorded.
    pub fn half_over(&self) -> bool {
        self.outs >= OUTS_PER_HALF
    }

    /// Past the regulation length.
    pub fn is_extra_innings(&self) -> bool {
        self.inning > self.regulation_innings
    }

    /// Append an event stamped with the current inning and half.
    pub fn push_event(&mut self, data: GameEventData) {
        self.log.push(self.inning, self.half, data);
    }

    fn ensure_live(&self) -> Result<(), StateViolation> {
        if self.finished {
            return Err(StateViolation::GameOver);
        }
        Ok(())
    }

    /// Open the current half-inning.
    pub fn start_half(&mut self, pitcher: PlayerId) -> Result<(), StateViolation> {
        self.ensure_live()?;
        self.outs = 0;
        self.bases = BaseState::empty();
        self.half_runs = 0;
        self.half_hits = 0;
        let batting = self.batting_side();
        self.push_event(GameEventData::HalfInningStarted { batting, pitcher });
        Ok(())
    }

    /// Apply a resolved plate appearance.
    ///
    /// Either everything is applied or nothing is: the out count is checked
    /// before the first event is written.
    pub fn apply_plate_appearance(&mut self, pa: PlateAppearance) -> Result<PlayOutcome, StateViolation> {
        self.ensure_live()?;

        let outs_recorded = pa.kind.outs();
        let outs_after = self.outs + outs_recorded;
        if self.half_over() || outs_after > OUTS_PER_HALF {
            return Err(StateViolation::FourthOut {
                inning: self.inning,
                half: self.half,
                outs: outs_after,
            });
        }

        let side = self.batting_side();
        // No run scores on the third out
        let runs = if outs_after == OUTS_PER_HALF { 0 } else { pa.advancement.runs };

        let mut score_after = self.score;
        score_after.add(side, runs);
        let walk_off = self.half == Half::Bottom
            && self.inning >= self.regulation_innings
            && self.score.home <= self.score.away
            && score_after.home > score_after.away;

        let pitches = u16::try_from(pa.pitches.len())
            .map_err(|_| StateViolation::PitchLimit { pitches: pa.pitches.len() })?;
        let outcome = PlayOutcome {
            batter: pa.batter,
            pitcher: pa.pitcher,
            kind: pa.kind,
            batted_ball: pa.batted_ball,
            runner_moves: pa.advancement.moves,
            runs_scored: runs,
            rbi: runs,
            outs_recorded,
            outs_after,
            sacrifice_fly: pa.advancement.sacrifice_fly,
            pitches,
            score_after,
            walk_off,
        };

        // Commit
        self.pitch_count += pa.pitches.len() as u32;
        for pitch in pa.pitches {
            self.push_event(GameEventData::Pitch(pitch));
        }

        self.outs = outs_after;
        // Runners stranded by the third out stay put until the half closes
        self.bases = pa.advancement.bases;
        self.score = score_after;
        self.half_runs += runs;
        if pa.kind.is_hit() {
            self.half_hits += 1;
        }
        self.plate_appearances += 1;
        self.lineups.advance(side);

        self.push_event(GameEventData::PlayOutcome(outcome.clone()));
        Ok(outcome)
    }

    /// Log the close of the half-inning. Position is left unchanged so a
    /// game ending here is stamped with the half it ended in.
    pub fn close_half(&mut self) -> Result<(), StateViolation> {
        self.ensure_live()?;
        self.push_event(GameEventData::HalfInningEnded {
            runs: self.half_runs,
            hits: self.half_hits,
            left_on_base: self.bases.count(),
            score: self.score,
        });
        Ok(())
    }

    /// Move to the next half-inning.
    pub fn next_half(&mut self) -> Result<(), StateViolation> {
        self.ensure_live()?;
        match self.half {
            Half::Top => self.half = Half::Bottom,
            Half::Bottom => {
                self.inning += 1;
                self.half = Half::Top;
            }
        }
        self.outs = 0;
        self.bases = BaseState::empty();
        Ok(())
    }

    /// Record the end of the game.
    ///
    /// `innings` is the number of innings played, which is the previous
    /// inning when the game ends between innings.
    pub fn finish(&mut self, innings: u16, walk_off: bool) -> Result<(), StateViolation> {
        self.ensure_live()?;
        self.push_event(GameEventData::GameEnded {
            final_score: self.score,
            innings,
            walk_off,
            winner: self.score.leader(),
            total_pitches: self.pitch_count,
        });
        self.finished = true;
        Ok(())
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.seed, self.log.len() as u32, |hasher| {
            hasher
                .put(&self.inning)
                .put(&(self.half as u8))
                .put(&self.outs)
                .put(&self.score)
                .put(&self.bases.occupancy_bits());
            for side in TeamSide::ALL {
                let order = self.lineups.order(side);
                hasher.put(&(order.index() as u32)).put(&order.completed());
            }
            hasher
                .put(&self.plate_appearances)
                .put(&self.pitch_count)
                .put(&self.finished);
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
