//! Batting Order
//!
//! One index per team into a fixed nine-man order. The index advances by
//! one when a plate appearance ends and wraps at the end of the order; it is
//! never reset, not between half-innings and not between innings.

use serde::{Serialize, Deserialize};

use crate::error::StateViolation;
use crate::game::state::TeamSide;
use crate::stats::player::PlayerId;
use crate::stats::profile::SlashLine;

/// Batters in a lineup.
pub const LINEUP_SIZE: usize = 9;

/// A team's batting order and whose turn it is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattingOrder {
    players: Vec<PlayerId>,
    index: usize,
    completed: u32,
}

impl BattingOrder {
    /// Returns `None` for an empty order.
    pub fn new(players: Vec<PlayerId>) -> Option<Self> {
        if players.is_empty() {
            return None;
        }
        Some(Self {
            players,
            index: 0,
            completed: 0,
        })
    }

    /// Batter due up.
    #[inline]
    pub fn current(&self) -> PlayerId {
        self.players[self.index]
    }

    /// 0-based slot of the batter due up.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Move to the next batter after a completed plate appearance.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.players.len();
        self.completed += 1;
    }

    /// Completed plate appearances.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Players in batting order.
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    /// Number of batters in the order.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// No batters.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Batting orders for both teams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattingOrderManager {
    away: BattingOrder,
    home: BattingOrder,
}

impl BattingOrderManager {
    /// Orders for both teams. Fails when either is empty.
    pub fn new(away: Vec<PlayerId>, home: Vec<PlayerId>) -> Result<Self, StateViolation> {
        let away = BattingOrder::new(away).ok_or(StateViolation::EmptyLineup { side: TeamSide::Away })?;
        let home = BattingOrder::new(home).ok_or(StateViolation::EmptyLineup { side: TeamSide::Home })?;
        Ok(Self { away, home })
    }

    /// One team's order.
    pub fn order(&self, side: TeamSide) -> &BattingOrder {
        match side {
            TeamSide::Away => &self.away,
            TeamSide::Home => &self.home,
        }
    }

    fn order_mut(&mut self, side: TeamSide) -> &mut BattingOrder {
        match side {
            TeamSide::Away => &mut self.away,
            TeamSide::Home => &mut self.home,
        }
    }

    /// Slot of the batter due up for a team.
    pub fn current_batter(&self, side: TeamSide) -> usize {
        self.order(side).index()
    }

    /// Player due up for a team.
    pub fn current_player(&self, side: TeamSide) -> PlayerId {
        self.order(side).current()
    }

    /// Move a team to its next batter.
    pub fn advance(&mut self, side: TeamSide) {
        self.order_mut(side).advance();
    }
}

// =============================================================================
// LINEUP CONSTRUCTION
// =============================================================================

/// Build a nine-man order from candidate batters.
///
/// Leadoff gets the best OBP, second the best OPS, third the best average,
/// cleanup the next best OPS, fifth the best slugging, and the rest follow
/// by OPS. Ties keep the candidates' listed order.
pub fn optimize_lineup(candidates: &[(PlayerId, SlashLine)]) -> Vec<PlayerId> {
    let mut pool: Vec<(PlayerId, SlashLine)> = candidates.to_vec();
    let mut order = Vec::with_capacity(LINEUP_SIZE);

    let take = |pool: &mut Vec<(PlayerId, SlashLine)>, key: fn(&SlashLine) -> f64| {
        let best = pool
            .iter()
            .enumerate()
            // max_by keeps the last maximum; reversing keeps the first
            .rev()
            .max_by(|(_, a), (_, b)| key(&a.1).total_cmp(&key(&b.1)))
            .map(|(i, _)| i);
        best.map(|i| pool.remove(i).0)
    };

    let slots: [fn(&SlashLine) -> f64; 5] = [
        |s| s.obp,
        |s| s.ops(),
        |s| s.avg,
        |s| s.ops(),
        |s| s.slg,
    ];
    for key in slots {
        if let Some(id) = take(&mut pool, key) {
            order.push(id);
        }
    }
    while order.len() < LINEUP_SIZE {
        match take(&mut pool, |s| s.ops()) {
            Some(id) => order.push(id),
            None => break,
        }
    }
    order
}

// =============================================================================
// TESTS
// =============================================================================
