//! Game Events
//!
//! Everything that happens in a game is recorded as a [`GameEvent`]. The
//! ordered list of events is the only thing outside consumers see, and the
//! box score is computed from it alone.

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::game::bases::RunnerMove;
use crate::game::outcome::PitchResult;
use crate::game::physics::{BattedBall, BattedBallResult, OutKind};
use crate::game::pitch::{Count, Pitch};
use crate::game::state::{Half, Score, TeamSide};
use crate::stats::player::PlayerId;

// =============================================================================
// PLAY CLASSIFICATION
// =============================================================================

/// How a plate appearance ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayKind {
    Strikeout { looking: bool },
    Walk,
    HitByPitch,
    InPlayOut(OutKind),
    Single,
    Double,
    Triple,
    HomeRun,
}

impl PlayKind {
    /// Classification of a batted ball.
    pub fn from_batted(result: BattedBallResult) -> Self {
        match result {
            BattedBallResult::Out(kind) => PlayKind::InPlayOut(kind),
            BattedBallResult::Single => PlayKind::Single,
            BattedBallResult::Double => PlayKind::Double,
            BattedBallResult::Triple => PlayKind::Triple,
            BattedBallResult::HomeRun => PlayKind::HomeRun,
        }
    }

    /// Batter reached on a hit.
    pub fn is_hit(self) -> bool {
        matches!(self, PlayKind::Single | PlayKind::Double | PlayKind::Triple | PlayKind::HomeRun)
    }

    /// Bases credited to the batter for a hit.
    pub fn total_bases(self) -> u32 {
        match self {
            PlayKind::Single => 1,
            PlayKind::Double => 2,
            PlayKind::Triple => 3,
            PlayKind::HomeRun => 4,
            _ => 0,
        }
    }

    /// Outs the play records.
    pub fn outs(self) -> u8 {
        match self {
            PlayKind::Strikeout { .. } | PlayKind::InPlayOut(_) => 1,
            _ => 0,
        }
    }

    /// Strikeout, swinging or looking.
    pub fn is_strikeout(self) -> bool {
        matches!(self, PlayKind::Strikeout { .. })
    }

    /// Short label for play-by-play.
    pub fn label(self) -> &'static str {
        match self {
            PlayKind::Strikeout { looking: true } => "strikeout looking",
            PlayKind::Strikeout { looking: false } => "strikeout swinging",
            PlayKind::Walk => "walk",
            PlayKind::HitByPitch => "hit by pitch",
            PlayKind::InPlayOut(OutKind::Groundout) => "groundout",
            PlayKind::InPlayOut(OutKind::Lineout) => "lineout",
            PlayKind::InPlayOut(OutKind::Flyout) => "flyout",
            PlayKind::InPlayOut(OutKind::Popout) => "popout",
            PlayKind::Single => "single",
            PlayKind::Double => "double",
            PlayKind::Triple => "triple",
            PlayKind::HomeRun => "home run",
        }
    }
}

// =============================================================================
// EVENT PAYLOADS
// =============================================================================

/// One recorded pitch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PitchEvent {
    /// Who threw it
    pub pitcher: PlayerId,
    /// Who faced it
    pub batter: PlayerId,
    /// 1-based pitch number within the plate appearance
    pub number: u16,
    /// Count before the pitch
    pub count: Count,
    /// Type, speed and location
    pub pitch: Pitch,
    /// What the batter did with it
    pub result: PitchResult,
}

/// Result of a completed plate appearance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayOutcome {
    /// Batter
    pub batter: PlayerId,
    /// Pitcher
    pub pitcher: PlayerId,
    /// How the plate appearance ended
    pub kind: PlayKind,
    /// Flight details when the ball was put in play
    pub batted_ball: Option<BattedBall>,
    /// Lead runner first, batter last
    pub runner_moves: Vec<RunnerMove>,
    /// Runs that counted
    pub runs_scored: u32,
    /// Runs credited to the batter
    pub rbi: u32,
    /// Outs made on the play
    pub outs_recorded: u8,
    /// Outs on the board after the play
    pub outs_after: u8,
    /// Fly ball out that scored a runner
    pub sacrifice_fly: bool,
    /// Pitches thrown in the plate appearance
    pub pitches: u16,
    /// Score once the play is applied
    pub score_after: Score,
    /// The play ended the game in the home team's favor
    pub walk_off: bool,
}

/// A player as named in the game header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Player id
    pub id: PlayerId,
    /// Display name
    pub name: String,
}

/// One team as it took the field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSheet {
    /// Team name
    pub name: String,
    /// Season the roster comes from
    pub season: u16,
    /// Batting order
    pub batters: Vec<Participant>,
    /// Starting pitcher
    pub starter: Participant,
}

impl TeamSheet {
    /// Look up a participant's name.
    pub fn name_of(&self, id: PlayerId) -> Option<&str> {
        self.batters
            .iter()
            .chain(std::iter::once(&self.starter))
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Header: who is playing where
    GameStarted {
        game_id: Uuid,
        seed: u64,
        reference_era: u16,
        park: String,
        away: TeamSheet,
        home: TeamSheet,
    },

    /// A half-inning began
    HalfInningStarted {
        batting: TeamSide,
        pitcher: PlayerId,
    },

    /// A pitch was thrown
    Pitch(PitchEvent),

    /// A plate appearance ended
    PlayOutcome(PlayOutcome),

    /// Third out recorded
    HalfInningEnded {
        runs: u32,
        hits: u32,
        left_on_base: u8,
        score: Score,
    },

    /// Final event of every completed game
    GameEnded {
        final_score: Score,
        innings: u16,
        walk_off: bool,
        winner: Option<TeamSide>,
        total_pitches: u32,
    },
}

/// A game event with its position in the game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Position in the log, starting at 0
    pub seq: u32,
    /// Inning the event belongs to
    pub inning: u16,
    /// Half the event belongs to
    pub half: Half,
    /// Payload
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(seq: u32, inning: u16, half: Half, data: GameEventData) -> Self {
        Self { seq, inning, half, data }
    }

    /// Primary player involved, if any.
    pub fn player(&self) -> Option<PlayerId> {
        match &self.data {
            GameEventData::Pitch(p) => Some(p.batter),
            GameEventData::PlayOutcome(o) => Some(o.batter),
            GameEventData::HalfInningStarted { pitcher, .. } => Some(*pitcher),
            _ => None,
        }
    }

    /// Short name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self.data {
            GameEventData::GameStarted { .. } => "game_started",
            GameEventData::HalfInningStarted { .. } => "half_inning_started",
            GameEventData::Pitch(_) => "pitch",
            GameEventData::PlayOutcome(_) => "play",
            GameEventData::HalfInningEnded { .. } => "half_inning_ended",
            GameEventData::GameEnded { .. } => "game_ended",
        }
    }

    /// The play, if this is a `PlayOutcome`.
    pub fn as_play(&self) -> Option<&PlayOutcome> {
        match &self.data {
            GameEventData::PlayOutcome(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// The pitch, if this is a `Pitch`.
    pub fn as_pitch(&self) -> Option<&PitchEvent> {
        match &self.data {
            GameEventData::Pitch(pitch) => Some(pitch),
            _ => None,
        }
    }

    /// Team at bat when the event happened.
    #[inline]
    pub fn batting_side(&self) -> TeamSide {
        self.half.batting_side()
    }
}
