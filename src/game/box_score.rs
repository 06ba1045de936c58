//! Box Score
//!
//! Post-game reduction of an [`EventLog`] into per-player lines, team totals,
//! a line score, highlights and MVP picks. [`summarize`] is a pure function
//! of the log: it never looks at game state.
//!
//! MVP composite scores are linear in the counting stats:
//!
//! ```text
//! batter  = run·R + rbi·RBI + hit·H + double·2B + triple·3B + home_run·HR
//!           + walk·BB + strikeout·K
//! pitcher = pitcher_out·outs + pitcher_strikeout·K + pitcher_run·R
//!           + pitcher_hit·H + pitcher_walk·BB
//! ```
//!
//! Weights come from [`MvpWeights`]; ties go to the lower player id.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Deserialize};

use crate::feed::EventLog;
use crate::game::events::{GameEventData, PlayKind, PlayOutcome, TeamSheet};
use crate::game::state::{Score, TeamSide};
use crate::stats::player::PlayerId;

/// Strikeouts that make a pitcher's day notable.
const STRIKEOUT_MILESTONE: u32 = 10;
/// RBI that make a batter's day notable.
const RBI_MILESTONE: u32 = 3;
/// Outs a pitcher needs for a complete-game highlight.
const COMPLETE_GAME_OUTS: u32 = 24;

// =============================================================================
// WEIGHTS
// =============================================================================

/// MVP composite weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MvpWeights {
    /// Per run scored
    pub run: f64,
    /// Per run batted in
    pub rbi: f64,
    /// Per hit
    pub hit: f64,
    /// Bonus on top of `hit` for a double
    pub double: f64,
    /// Bonus for a triple
    pub triple: f64,
    /// Bonus for a home run
    pub home_run: f64,
    /// Per walk or hit-by-pitch
    pub walk: f64,
    /// Per strikeout (negative)
    pub strikeout: f64,
    /// Per out recorded
    pub pitcher_out: f64,
    /// Per strikeout thrown
    pub pitcher_strikeout: f64,
    /// Per run allowed (negative)
    pub pitcher_run: f64,
    /// Per hit allowed (negative)
    pub pitcher_hit: f64,
    /// Per walk allowed (negative)
    pub pitcher_walk: f64,
}

impl Default for MvpWeights {
    fn default() -> Self {
        Self {
            run: 1.0,
            rbi: 1.5,
            hit: 2.0,
            double: 1.5,
            triple: 2.5,
            home_run: 4.0,
            walk: 0.75,
            strikeout: -0.75,
            pitcher_out: 1.0,
            pitcher_strikeout: 2.5,
            pitcher_run: -3.0,
            pitcher_hit: -1.5,
            pitcher_walk: -1.5,
        }
    }
}

// =============================================================================
// PLAYER LINES
// =============================================================================

/// A batter's game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatterLine {
    /// Team the batter played for
    pub side: TeamSide,
    /// Batter id
    pub player: PlayerId,
    /// Display name
    pub name: String,
    /// 0-based lineup slot
    pub slot: usize,
    /// Plate appearances
    pub plate_appearances: u32,
    /// Official at-bats
    pub at_bats: u32,
    /// Runs scored
    pub runs: u32,
    /// Hits
    pub hits: u32,
    /// Doubles
    pub doubles: u32,
    /// Triples
    pub triples: u32,
    /// Home runs
    pub home_runs: u32,
    /// Runs batted in
    pub rbi: u32,
    /// Walks
    pub walks: u32,
    /// Strikeouts
    pub strikeouts: u32,
    /// Times hit by a pitch
    pub hit_by_pitch: u32,
    /// Sacrifice flies
    pub sac_flies: u32,
}

fn rate(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl BatterLine {
    /// Singles + 2·doubles + 3·triples + 4·home runs.
    pub fn total_bases(&self) -> u32 {
        let singles = self.hits.saturating_sub(self.doubles + self.triples + self.home_runs);
        singles + 2 * self.doubles + 3 * self.triples + 4 * self.home_runs
    }

    /// Batting average; zero without an at-bat.
    pub fn avg(&self) -> f64 {
        rate(self.hits, self.at_bats)
    }

    /// On-base percentage.
    pub fn obp(&self) -> f64 {
        rate(
            self.hits + self.walks + self.hit_by_pitch,
            self.at_bats + self.walks + self.hit_by_pitch + self.sac_flies,
        )
    }

    /// Slugging percentage.
    pub fn slg(&self) -> f64 {
        rate(self.total_bases(), self.at_bats)
    }

    /// On-base plus slugging.
    pub fn ops(&self) -> f64 {
        self.obp() + self.slg()
    }

    /// MVP composite score.
    pub fn mvp_score(&self, w: &MvpWeights) -> f64 {
        w.run * self.runs as f64
            + w.rbi * self.rbi as f64
            + w.hit * self.hits as f64
            + w.double * self.doubles as f64
            + w.triple * self.triples as f64
            + w.home_run * self.home_runs as f64
            + w.walk * self.walks as f64
            + w.strikeout * self.strikeouts as f64
    }

    fn record(&mut self, play: &PlayOutcome) {
        self.plate_appearances += 1;
        self.rbi += play.rbi;
        match play.kind {
            PlayKind::Walk => self.walks += 1,
            PlayKind::HitByPitch => self.hit_by_pitch += 1,
            _ if play.sacrifice_fly => self.sac_flies += 1,
            kind => {
                self.at_bats += 1;
                if kind.is_hit() {
                    self.hits += 1;
                }
                match kind {
                    PlayKind::Double => self.doubles += 1,
                    PlayKind::Triple => self.triples += 1,
                    PlayKind::HomeRun => self.home_runs += 1,
                    PlayKind::Strikeout { .. } => self.strikeouts += 1,
                    _ => {}
                }
            }
        }
    }
}

/// A pitcher's game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PitcherLine {
    /// Team the pitcher played for
    pub side: TeamSide,
    /// Pitcher id
    pub player: PlayerId,
    /// Display name
    pub name: String,
    /// Outs recorded
    pub outs: u32,
    /// Batters faced
    pub batters_faced: u32,
    /// Pitches thrown
    pub pitches: u32,
    /// Strikes, fouls and balls in play included
    pub strikes: u32,
    /// Hits allowed
    pub hits: u32,
    /// Runs allowed
    pub runs: u32,
    /// Walks allowed
    pub walks: u32,
    /// Strikeouts
    pub strikeouts: u32,
    /// Home runs allowed
    pub home_runs: u32,
    /// Batters hit
    pub hit_by_pitch: u32,
    /// Sum of pitch speeds, for the average
    pub velocity_total: f64,
    /// Fastest pitch (mph)
    pub peak_velocity: f64,
}

impl PitcherLine {
    /// Innings pitched in `x.y` notation, where `y` is extra outs.
    pub fn innings_pitched(&self) -> String {
        format!("{}.{}", self.outs / 3, self.outs % 3)
    }

    /// Runs per nine innings. Every run is treated as earned.
    pub fn era(&self) -> Option<f64> {
        (self.outs > 0).then(|| self.runs as f64 * 27.0 / self.outs as f64)
    }

    /// Walks plus hits per inning.
    pub fn whip(&self) -> Option<f64> {
        (self.outs > 0).then(|| (self.walks + self.hits) as f64 * 3.0 / self.outs as f64)
    }

    /// Mean pitch speed, if any pitch was thrown.
    pub fn average_velocity(&self) -> Option<f64> {
        (self.pitches > 0).then(|| self.velocity_total / self.pitches as f64)
    }

    /// MVP composite score.
    pub fn mvp_score(&self, w: &MvpWeights) -> f64 {
        w.pitcher_out * self.outs as f64
            + w.pitcher_strikeout * self.strikeouts as f64
            + w.pitcher_run * self.runs as f64
            + w.pitcher_hit * self.hits as f64
            + w.pitcher_walk * self.walks as f64
    }

    fn record(&mut self, play: &PlayOutcome) {
        self.batters_faced += 1;
        self.outs += play.outs_recorded as u32;
        self.runs += play.runs_scored;
        match play.kind {
            PlayKind::Walk => self.walks += 1,
            PlayKind::HitByPitch => self.hit_by_pitch += 1,
            PlayKind::Strikeout { .. } => self.strikeouts += 1,
            PlayKind::HomeRun => {
                self.hits += 1;
                self.home_runs += 1;
            }
            kind if kind.is_hit() => self.hits += 1,
            _ => {}
        }
    }
}

// =============================================================================
// TEAM AND GAME SUMMARY
// =============================================================================

/// Team totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamTotals {
    /// Runs scored
    pub runs: u32,
    /// Hits
    pub hits: u32,
    /// Runners stranded
    pub left_on_base: u32,
}

/// Runs per half-inning. The home row is one short when the bottom of the
/// last inning was not needed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineScore {
    /// Runs per inning, away team
    pub away: Vec<u32>,
    /// Runs per inning, home team
    pub home: Vec<u32>,
}

impl LineScore {
    /// Inning-by-inning runs for one team.
    pub fn row(&self, side: TeamSide) -> &[u32] {
        match side {
            TeamSide::Away => &self.away,
            TeamSide::Home => &self.home,
        }
    }

    fn row_mut(&mut self, side: TeamSide) -> &mut Vec<u32> {
        match side {
            TeamSide::Away => &mut self.away,
            TeamSide::Home => &mut self.home,
        }
    }
}

/// Something worth mentioning in a recap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighlightKind {
    MultiHit { hits: u32 },
    HomeRuns { count: u32 },
    RunsBattedIn { rbi: u32 },
    Strikeouts { count: u32 },
    NoHitter,
    Shutout,
    WalkOff { play: PlayKind },
}

/// A notable individual performance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    /// Player's team
    pub side: TeamSide,
    /// Player id
    pub player: PlayerId,
    /// Display name
    pub name: String,
    /// What they did
    pub kind: HighlightKind,
}

impl Highlight {
    /// One-line description.
    pub fn describe(&self) -> String {
        match &self.kind {
            HighlightKind::MultiHit { hits } => format!("{} had {} hits", self.name, hits),
            HighlightKind::HomeRuns { count: 1 } => format!("{} homered", self.name),
            HighlightKind::HomeRuns { count } => format!("{} hit {} home runs", self.name, count),
            HighlightKind::RunsBattedIn { rbi } => format!("{} drove in {} runs", self.name, rbi),
            HighlightKind::Strikeouts { count } => format!("{} struck out {}", self.name, count),
            HighlightKind::NoHitter => format!("{} threw a no-hitter", self.name),
            HighlightKind::Shutout => format!("{} threw a shutout", self.name),
            HighlightKind::WalkOff { play } => format!("{} won it with a walk-off {}", self.name, play.label()),
        }
    }
}

/// Most valuable player pick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MvpPick {
    /// Winner's team
    pub side: TeamSide,
    /// Winner id
    pub player: PlayerId,
    /// Display name
    pub name: String,
    /// Composite score
    pub score: f64,
}

/// Summary of one game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    /// Visiting team name
    pub away_team: String,
    /// Home team name
    pub home_team: String,
    /// Score when the game ended
    pub final_score: Score,
    /// Innings played
    pub innings: u16,
    /// Ended on a home-team walk-off
    pub walk_off: bool,
    /// `None` for a tie
    pub winner: Option<TeamSide>,
    /// The log ended with `GameEnded`
    pub complete: bool,
    /// Pitches thrown by both teams
    pub total_pitches: u32,
    /// Runs by inning
    pub line_score: LineScore,
    /// Visiting team totals
    pub away_totals: TeamTotals,
    /// Home team totals
    pub home_totals: TeamTotals,
    /// Away batters in lineup order, then home batters
    pub batters: Vec<BatterLine>,
    /// Pitching lines, starters first
    pub pitchers: Vec<PitcherLine>,
    /// Notable performances
    pub highlights: Vec<Highlight>,
    /// Top batter by composite score
    pub mvp_batter: Option<MvpPick>,
    /// Top pitcher by composite score
    pub mvp_pitcher: Option<MvpPick>,
}

impl BoxScore {
    /// Team totals for one side.
    pub fn totals(&self, side: TeamSide) -> &TeamTotals {
        match side {
            TeamSide::Away => &self.away_totals,
            TeamSide::Home => &self.home_totals,
        }
    }

    /// Team name for one side.
    pub fn team_name(&self, side: TeamSide) -> &str {
        match side {
            TeamSide::Away => &self.away_team,
            TeamSide::Home => &self.home_team,
        }
    }

    /// A batter's line, if they batted.
    pub fn batter(&self, side: TeamSide, player: PlayerId) -> Option<&BatterLine> {
        self.batters.iter().find(|b| b.side == side && b.player == player)
    }

    /// A pitcher's line, if they pitched.
    pub fn pitcher(&self, side: TeamSide, player: PlayerId) -> Option<&PitcherLine> {
        self.pitchers.iter().find(|p| p.side == side && p.player == player)
    }
}

// =============================================================================
// SUMMARIZE
// =============================================================================

/// Summarize with the default MVP weights.
pub fn summarize(log: &EventLog) -> BoxScore {
    summarize_with(log, &MvpWeights::default())
}

/// Reduce an event log to a box score.
pub fn summarize_with(log: &EventLog, weights: &MvpWeights) -> BoxScore {
    let mut box_score = BoxScore::default();
    let mut batters: BTreeMap<(TeamSide, PlayerId), BatterLine> = BTreeMap::new();
    let mut pitchers: BTreeMap<(TeamSide, PlayerId), PitcherLine> = BTreeMap::new();
    let mut sheets: [Option<&TeamSheet>; 2] = [None, None];
    let mut walk_off_play: Option<(TeamSide, PlayerId, PlayKind)> = None;

    let name_of = |sheets: &[Option<&TeamSheet>; 2], side: TeamSide, id: PlayerId| -> String {
        sheets[side as usize]
            .and_then(|s| s.name_of(id))
            .map_or_else(|| id.to_string(), str::to_string)
    };

    for event in log {
        let batting = event.batting_side();
        match &event.data {
            GameEventData::GameStarted { away, home, .. } => {
                box_score.away_team = away.name.clone();
                box_score.home_team = home.name.clone();
                sheets = [Some(away), Some(home)];
                for (side, sheet) in [(TeamSide::Away, away), (TeamSide::Home, home)] {
                    for (slot, p) in sheet.batters.iter().enumerate() {
                        batters.insert((side, p.id), BatterLine {
                            side,
                            player: p.id,
                            name: p.name.clone(),
                            slot,
                            ..Default::default()
                        });
                    }
                }
            }

            GameEventData::HalfInningStarted { .. } => {
                box_score.line_score.row_mut(batting).push(0);
            }

            GameEventData::Pitch(pitch) => {
                let fielding = batting.opponent();
                let line = pitchers.entry((fielding, pitch.pitcher)).or_insert_with(|| PitcherLine {
                    side: fielding,
                    player: pitch.pitcher,
                    name: name_of(&sheets, fielding, pitch.pitcher),
                    ..Default::default()
                });
                line.pitches += 1;
                if pitch.result.is_strike() {
                    line.strikes += 1;
                }
                line.velocity_total += pitch.pitch.velocity;
                line.peak_velocity = line.peak_velocity.max(pitch.pitch.velocity);
            }

            GameEventData::PlayOutcome(play) => {
                let fielding = batting.opponent();
                batters
                    .entry((batting, play.batter))
                    .or_insert_with(|| BatterLine {
                        side: batting,
                        player: play.batter,
                        name: name_of(&sheets, batting, play.batter),
                        slot: usize::MAX,
                        ..Default::default()
                    })
                    .record(play);

                for runner in play.runner_moves.iter().filter(|m| m.scored()) {
                    if let Some(line) = batters.get_mut(&(batting, runner.runner)) {
                        line.runs += 1;
                    }
                }

                pitchers
                    .entry((fielding, play.pitcher))
                    .or_insert_with(|| PitcherLine {
                        side: fielding,
                        player: play.pitcher,
                        name: name_of(&sheets, fielding, play.pitcher),
                        ..Default::default()
                    })
                    .record(play);

                if let Some(runs) = box_score.line_score.row_mut(batting).last_mut() {
                    *runs += play.runs_scored;
                }
                if play.kind.is_hit() {
                    match batting {
                        TeamSide::Away => box_score.away_totals.hits += 1,
                        TeamSide::Home => box_score.home_totals.hits += 1,
                    }
                }
                if play.walk_off {
                    walk_off_play = Some((batting, play.batter, play.kind));
                }
            }

            GameEventData::HalfInningEnded { left_on_base, .. } => match batting {
                TeamSide::Away => box_score.away_totals.left_on_base += *left_on_base as u32,
                TeamSide::Home => box_score.home_totals.left_on_base += *left_on_base as u32,
            },

            GameEventData::GameEnded { final_score, innings, walk_off, winner, total_pitches } => {
                box_score.final_score = *final_score;
                box_score.innings = *innings;
                box_score.walk_off = *walk_off;
                box_score.winner = *winner;
                box_score.total_pitches = *total_pitches;
                box_score.complete = true;
            }
        }
    }

    if !box_score.complete {
        // Partial log: report what has happened so far
        box_score.final_score = log
            .iter()
            .rev()
            .find_map(|e| e.as_play().map(|p| p.score_after))
            .unwrap_or_default();
        box_score.innings = log.last().map_or(0, |e| e.inning);
        box_score.total_pitches = log.pitch_count() as u32;
    }
    box_score.away_totals.runs = box_score.final_score.away;
    box_score.home_totals.runs = box_score.final_score.home;

    let mut batter_lines: Vec<BatterLine> = batters.into_values().collect();
    batter_lines.sort_by_key(|b| (b.side, b.slot, b.player));
    let pitcher_lines: Vec<PitcherLine> = pitchers.into_values().collect();

    box_score.highlights = highlights(&batter_lines, &pitcher_lines, &box_score, walk_off_play);
    box_score.mvp_batter = pick_mvp(batter_lines.iter().map(|b| (b.side, b.player, &b.name, b.mvp_score(weights))));
    box_score.mvp_pitcher = pick_mvp(pitcher_lines.iter().map(|p| (p.side, p.player, &p.name, p.mvp_score(weights))));
    box_score.batters = batter_lines;
    box_score.pitchers = pitcher_lines;
    box_score
}

/// Highest score wins; ties go to the lower player id.
fn pick_mvp<'a>(candidates: impl Iterator<Item = (TeamSide, PlayerId, &'a String, f64)>) -> Option<MvpPick> {
    candidates
        .max_by(|a, b| a.3.total_cmp(&b.3).then_with(|| b.1.cmp(&a.1)).then_with(|| b.0.cmp(&a.0)))
        .map(|(side, player, name, score)| MvpPick {
            side,
            player,
            name: name.clone(),
            score,
        })
}

fn highlights(
    batters: &[BatterLine],
    pitchers: &[PitcherLine],
    box_score: &BoxScore,
    walk_off: Option<(TeamSide, PlayerId, PlayKind)>,
) -> Vec<Highlight> {
    let mut out = Vec::new();
    let mut push = |side, player, name: &str, kind| {
        out.push(Highlight {
            side,
            player,
            name: name.to_string(),
            kind,
        })
    };

    for b in batters {
        if b.hits >= 2 {
            push(b.side, b.player, &b.name, HighlightKind::MultiHit { hits: b.hits });
        }
        if b.home_runs > 0 {
            push(b.side, b.player, &b.name, HighlightKind::HomeRuns { count: b.home_runs });
        }
        if b.rbi >= RBI_MILESTONE {
            push(b.side, b.player, &b.name, HighlightKind::RunsBattedIn { rbi: b.rbi });
        }
    }

    for p in pitchers {
        if p.strikeouts >= STRIKEOUT_MILESTONE {
            push(p.side, p.player, &p.name, HighlightKind::Strikeouts { count: p.strikeouts });
        }
        if box_score.complete && p.outs >= COMPLETE_GAME_OUTS {
            if p.hits == 0 {
                push(p.side, p.player, &p.name, HighlightKind::NoHitter);
            }
            if p.runs == 0 {
                push(p.side, p.player, &p.name, HighlightKind::Shutout);
            }
        }
    }

    if let Some((side, player, play)) = walk_off {
        let name = batters
            .iter()
            .find(|b| b.side == side && b.player == player)
            .map_or_else(|| player.to_string(), |b| b.name.clone());
        push(side, player, &name, HighlightKind::WalkOff { play });
    }

    out
}

// =============================================================================
// DISPLAY
// =============================================================================

impl fmt::Display for BoxScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let innings = self.line_score.away.len().max(self.line_score.home.len());
        write!(f, "{:<20}", "")?;
        for i in 1..=innings {
            write!(f, "{:>3}", i)?;
        }
        writeln!(f, "   R   H LOB")?;

        for side in TeamSide::ALL {
            write!(f, "{:<20}", self.team_name(side))?;
            let row = self.line_score.row(side);
            for i in 0..innings {
                match row.get(i) {
                    Some(runs) => write!(f, "{:>3}", runs)?,
                    None => write!(f, "{:>3}", "X")?,
                }
            }
            let t = self.totals(side);
            writeln!(f, " {:>3} {:>3} {:>3}", t.runs, t.hits, t.left_on_base)?;
        }

        for side in TeamSide::ALL {
            writeln!(f)?;
            writeln!(f, "{:<24} AB  R  H RBI BB  K   AVG   OPS", self.team_name(side))?;
            for b in self.batters.iter().filter(|b| b.side == side) {
                writeln!(
                    f,
                    "{:<24}{:>3}{:>3}{:>3}{:>4}{:>3}{:>3} {:>5.3} {:>5.3}",
                    b.name, b.at_bats, b.runs, b.hits, b.rbi, b.walks, b.strikeouts, b.avg(), b.ops()
                )?;
            }
            for p in self.pitchers.iter().filter(|p| p.side == side) {
                writeln!(
                    f,
                    "{:<24} IP {} H {} R {} BB {} K {} P {} ERA {:.2}",
                    p.name,
                    p.innings_pitched(),
                    p.hits,
                    p.runs,
                    p.walks,
                    p.strikeouts,
                    p.pitches,
                    p.era().unwrap_or(0.0)
                )?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::game::bases::{RunnerMove, Station};
    use crate::game::events::{Participant, PitchEvent};
    use crate::game::outcome::{ContactQuality, PitchResult};
    use crate::game::physics::OutKind;
    use crate::game::pitch::{Count, Pitch, PlateLocation, ZoneRegion};
    use crate::game::state::Half;
    use crate::stats::arsenal::PitchType;

    const AWAY_ACE: PlayerId = PlayerId(90);
    const HOME_ACE: PlayerId = PlayerId(190);

    fn sheet(name: &str, first: u32, ace: PlayerId) -> TeamSheet {
        TeamSheet {
            name: name.to_string(),
            season: 2000,
            batters: (first..first + 9)
                .map(|id| Participant { id: PlayerId(id), name: format!("Player {id}") })
                .collect(),
            starter: Participant { id: ace, name: format!("Ace {}", ace.0) },
        }
    }

    struct Script {
        log: EventLog,
        score: Score,
    }

    impl Script {
        fn new() -> Self {
            let mut log = EventLog::new();
            log.push(1, Half::Top, GameEventData::GameStarted {
                game_id: Uuid::nil(),
                seed: 1,
                reference_era: 2000,
                park: "Neutral Park".to_string(),
                away: sheet("Visitors", 1, AWAY_ACE),
                home: sheet("Locals", 101, HOME_ACE),
            });
            Self { log, score: Score::default() }
        }

        fn half(&mut self, inning: u16, half: Half) {
            let pitcher = if half == Half::Top { HOME_ACE } else { AWAY_ACE };
            self.log.push(inning, half, GameEventData::HalfInningStarted {
                batting: half.batting_side(),
                pitcher,
            });
        }

        fn pitch(&mut self, inning: u16, half: Half, batter: PlayerId, velocity: f64, result: PitchResult) {
            let pitcher = if half == Half::Top { HOME_ACE } else { AWAY_ACE };
            self.log.push(inning, half, GameEventData::Pitch(PitchEvent {
                pitcher,
                batter,
                number: 1,
                count: Count::new(0, 0),
                pitch: Pitch {
                    pitch_type: PitchType::FourSeam,
                    velocity,
                    movement: 8.0,
                    location: PlateLocation::new(0.0, 2.5),
                    region: ZoneRegion::InZone,
                },
                result,
            }));
        }

        fn play(&mut self, inning: u16, half: Half, batter: PlayerId, kind: PlayKind, scorers: &[PlayerId]) {
            let side = half.batting_side();
            let pitcher = if half == Half::Top { HOME_ACE } else { AWAY_ACE };
            self.score.add(side, scorers.len() as u32);
            let walk_off = half == Half::Bottom && inning >= 9 && self.score.home > self.score.away;
            self.log.push(inning, half, GameEventData::PlayOutcome(PlayOutcome {
                batter,
                pitcher,
                kind,
                batted_ball: None,
                runner_moves: scorers
                    .iter()
                    .map(|&runner| RunnerMove { runner, from: Station::Third, to: Station::Home })
                    .collect(),
                runs_scored: scorers.len() as u32,
                rbi: scorers.len() as u32,
                outs_recorded: kind.outs(),
                outs_after: 0,
                sacrifice_fly: false,
                pitches: 1,
                score_after: self.score,
                walk_off,
            }));
        }

        fn end_half(&mut self, inning: u16, half: Half, left_on_base: u8) {
            self.log.push(inning, half, GameEventData::HalfInningEnded {
                runs: 0,
                hits: 0,
                left_on_base,
                score: self.score,
            });
        }

        fn finish(mut self, innings: u16, walk_off: bool) -> EventLog {
            self.log.push(innings, Half::Bottom, GameEventData::GameEnded {
                final_score: self.score,
                innings,
                walk_off,
                winner: self.score.leader(),
                total_pitches: self.log.pitch_count() as u32,
            });
            self.log
        }
    }

    fn sample_game() -> EventLog {
        let mut s = Script::new();
        s.half(1, Half::Top);
        s.pitch(1, Half::Top, PlayerId(1), 95.0, PitchResult::InPlay(ContactQuality::FlyBall));
        s.play(1, Half::Top, PlayerId(1), PlayKind::HomeRun, &[PlayerId(1)]);
        s.pitch(1, Half::Top, PlayerId(2), 97.0, PitchResult::SwingingStrike);
        s.play(1, Half::Top, PlayerId(2), PlayKind::Strikeout { looking: false }, &[]);
        s.play(1, Half::Top, PlayerId(3), PlayKind::Walk, &[]);
        s.play(1, Half::Top, PlayerId(4), PlayKind::InPlayOut(OutKind::Flyout), &[]);
        s.play(1, Half::Top, PlayerId(5), PlayKind::InPlayOut(OutKind::Groundout), &[]);
        s.end_half(1, Half::Top, 1);

        s.half(1, Half::Bottom);
        s.play(1, Half::Bottom, PlayerId(101), PlayKind::Double, &[]);
        s.play(1, Half::Bottom, PlayerId(102), PlayKind::Single, &[PlayerId(101)]);
        s.play(1, Half::Bottom, PlayerId(103), PlayKind::Strikeout { looking: true }, &[]);
        s.play(1, Half::Bottom, PlayerId(104), PlayKind::Strikeout { looking: false }, &[]);
        s.play(1, Half::Bottom, PlayerId(105), PlayKind::InPlayOut(OutKind::Popout), &[]);
        s.end_half(1, Half::Bottom, 1);
        s.finish(1, false)
    }

    #[test]
    fn test_batter_lines() {
        let box_score = summarize(&sample_game());
        let leadoff = box_score.batter(TeamSide::Away, PlayerId(1)).unwrap();
        assert_eq!((leadoff.at_bats, leadoff.hits, leadoff.home_runs, leadoff.runs, leadoff.rbi), (1, 1, 1, 1, 1));
        assert_eq!(leadoff.slg(), 4.0);

        let walker = box_score.batter(TeamSide::Away, PlayerId(3)).unwrap();
        assert_eq!((walker.plate_appearances, walker.at_bats, walker.walks), (1, 0, 1));
        assert_eq!(walker.obp(), 1.0);

        let scorer = box_score.batter(TeamSide::Home, PlayerId(101)).unwrap();
        assert_eq!((scorer.doubles, scorer.runs, scorer.rbi), (1, 1, 0));
        assert_eq!(box_score.batter(TeamSide::Home, PlayerId(102)).unwrap().rbi, 1);

        // Batters who never came up are listed too, in lineup order
        let away: Vec<_> = box_score.batters.iter().filter(|b| b.side == TeamSide::Away).collect();
        assert_eq!(away.len(), 9);
        assert_eq!(away[8].player, PlayerId(9));
        assert_eq!(away[8].plate_appearances, 0);
    }

    #[test]
    fn test_pitcher_lines() {
        let box_score = summarize(&sample_game());
        let home_ace = box_score.pitcher(TeamSide::Home, HOME_ACE).unwrap();
        assert_eq!(home_ace.outs, 3);
        assert_eq!(home_ace.innings_pitched(), "1.0");
        assert_eq!((home_ace.hits, home_ace.home_runs, home_ace.walks, home_ace.strikeouts), (1, 1, 1, 1));
        assert_eq!(home_ace.pitches, 2);
        assert_eq!(home_ace.strikes, 2);
        assert_eq!(home_ace.average_velocity(), Some(96.0));
        assert_eq!(home_ace.peak_velocity, 97.0);
        assert_eq!(home_ace.era(), Some(9.0));
        assert_eq!(home_ace.whip(), Some(2.0));
        assert_eq!(home_ace.name, "Ace 190");
    }

    #[test]
    fn test_team_totals_and_line_score() {
        let box_score = summarize(&sample_game());
        assert!(box_score.complete);
        assert_eq!(box_score.away_team, "Visitors");
        assert_eq!(box_score.line_score.away, vec![1]);
        assert_eq!(box_score.line_score.home, vec![1]);
        assert_eq!(box_score.away_totals, TeamTotals { runs: 1, hits: 1, left_on_base: 1 });
        assert_eq!(box_score.home_totals, TeamTotals { runs: 1, hits: 2, left_on_base: 1 });
        assert_eq!(box_score.winner, None);
    }

    #[test]
    fn test_innings_pitched_notation() {
        let line = PitcherLine { outs: 20, ..Default::default() };
        assert_eq!(line.innings_pitched(), "6.2");
        assert_eq!(PitcherLine::default().era(), None);
    }

    #[test]
    fn test_mvp_prefers_home_run_and_breaks_ties_low() {
        let box_score = summarize(&sample_game());
        let mvp = box_score.mvp_batter.unwrap();
        // Home run with run and RBI: 2 + 4 + 1 + 1.5; double and run: 2 + 1.5 + 1
        assert_eq!(mvp.player, PlayerId(1));
        assert_eq!(mvp.score, 8.5);

        let weights = MvpWeights {
            run: 0.0,
            rbi: 0.0,
            hit: 0.0,
            double: 0.0,
            triple: 0.0,
            home_run: 0.0,
            walk: 0.0,
            strikeout: 0.0,
            ..Default::default()
        };
        let flat = summarize_with(&sample_game(), &weights);
        assert_eq!(flat.mvp_batter.unwrap().player, PlayerId(1));
    }

    #[test]
    fn test_walk_off_highlight() {
        let mut s = Script::new();
        for inning in 1..=8 {
            for half in [Half::Top, Half::Bottom] {
                s.half(inning, half);
                s.end_half(inning, half, 0);
            }
        }
        s.half(9, Half::Top);
        s.end_half(9, Half::Top, 0);
        s.half(9, Half::Bottom);
        s.play(9, Half::Bottom, PlayerId(104), PlayKind::HomeRun, &[PlayerId(104)]);
        let box_score = summarize(&s.finish(9, true));

        assert!(box_score.walk_off);
        assert_eq!(box_score.winner, Some(TeamSide::Home));
        assert_eq!(box_score.line_score.home.len(), 9);
        let walk_off = box_score
            .highlights
            .iter()
            .find(|h| matches!(h.kind, HighlightKind::WalkOff { .. }))
            .unwrap();
        assert_eq!(walk_off.player, PlayerId(104));
        assert_eq!(walk_off.describe(), "Player 104 won it with a walk-off home run");
    }

    #[test]
    fn test_partial_log_is_not_complete() {
        let mut s = Script::new();
        s.half(1, Half::Top);
        s.play(1, Half::Top, PlayerId(1), PlayKind::Single, &[]);
        let box_score = summarize(&s.log);
        assert!(!box_score.complete);
        assert_eq!(box_score.away_totals.hits, 1);
        assert_eq!(box_score.innings, 1);
    }

    #[test]
    fn test_display_renders_line_score() {
        let text = summarize(&sample_game()).to_string();
        assert!(text.contains("Visitors"));
        assert!(text.contains("Locals"));
        assert!(text.contains("Ace 190"));
    }
}
