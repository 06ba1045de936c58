//! Narrative Generation
//!
//! Optional natural-language commentary for a finished game. A failing
//! generator never affects the box score or the event log; [`narrate`]
//! logs the failure and returns `None`.

use thiserror::Error;
use tracing::warn;

use crate::config::REGULATION_INNINGS;
use crate::game::box_score::{BoxScore, Highlight};
use crate::game::state::TeamSide;

/// Errors from a narrative generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrativeError {
    /// The service could not be reached.
    #[error("narrative service unavailable: {0}")]
    Unavailable(String),

    /// The service answered but produced nothing usable.
    #[error("narrative generation failed: {0}")]
    Failed(String),
}

/// Produces commentary from a box score and its notable events.
pub trait NarrativeGenerator: Send + Sync {
    fn generate(&self, box_score: &BoxScore, highlights: &[Highlight]) -> Result<String, NarrativeError>;
}

/// Ask a generator for commentary, degrading to `None` on failure.
pub fn narrate<G>(generator: &G, box_score: &BoxScore) -> Option<String>
where
    G: NarrativeGenerator + ?Sized,
{
    match generator.generate(box_score, &box_score.highlights) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            warn!("Narrative generator returned empty text");
            None
        }
        Err(e) => {
            warn!("Narrative omitted: {}", e);
            None
        }
    }
}

/// Local one-paragraph recap built from the box score alone.
#[derive(Clone, Copy, Debug)]
pub struct RecapNarrator {
    /// Highlights to mention at most
    pub max_highlights: usize,
    /// Innings in a regulation game; longer games are called out
    pub regulation_innings: u16,
}

impl Default for RecapNarrator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RecapNarrator {
    /// Recap mentioning up to `max_highlights` highlights.
    pub fn new(max_highlights: usize) -> Self {
        Self {
            max_highlights,
            regulation_innings: REGULATION_INNINGS,
        }
    }

    /// Use the game's configured regulation length.
    pub fn with_regulation_innings(mut self, innings: u16) -> Self {
        self.regulation_innings = innings;
        self
    }
}

impl NarrativeGenerator for RecapNarrator {
    fn generate(&self, box_score: &BoxScore, highlights: &[Highlight]) -> Result<String, NarrativeError> {
        if !box_score.complete {
            return Err(NarrativeError::Failed("game is not over".to_string()));
        }

        let mut text = match box_score.winner {
            Some(winner) => {
                let loser = winner.opponent();
                format!(
                    "The {} beat the {} {}-{}",
                    box_score.team_name(winner),
                    box_score.team_name(loser),
                    box_score.final_score.get(winner),
                    box_score.final_score.get(loser),
                )
            }
            None => format!(
                "The {} and {} finished level at {}",
                box_score.team_name(TeamSide::Away),
                box_score.team_name(TeamSide::Home),
                box_score.final_score,
            ),
        };

        if box_score.innings > self.regulation_innings {
            text.push_str(&format!(" in {} innings", box_score.innings));
        }
        text.push('.');

        for highlight in highlights.iter().take(self.max_highlights) {
            text.push(' ');
            text.push_str(&highlight.describe());
            text.push('.');
        }

        if let Some(mvp) = &box_score.mvp_batter {
            text.push_str(&format!(" Player of the game: {}.", mvp.name));
        }
        Ok(text)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::box_score::{HighlightKind, MvpPick};
    use crate::game::events::PlayKind;
    use crate::game::state::Score;
    use crate::stats::player::PlayerId;

    struct Offline;

    impl NarrativeGenerator for Offline {
        fn generate(&self, _: &BoxScore, _: &[Highlight]) -> Result<String, NarrativeError> {
            Err(NarrativeError::Unavailable("connection refused".to_string()))
        }
    }

    fn finished() -> BoxScore {
        BoxScore {
            away_team: "Riverton Ironmen".to_string(),
            home_team: "Bay City Comets".to_string(),
            final_score: Score { away: 2, home: 3 },
            innings: 10,
            walk_off: true,
            winner: Some(TeamSide::Home),
            complete: true,
            highlights: vec![Highlight {
                side: TeamSide::Home,
                player: PlayerId(104),
                name: "Dee Alcott".to_string(),
                kind: HighlightKind::WalkOff { play: PlayKind::Single },
            }],
            mvp_batter: Some(MvpPick {
                side: TeamSide::Home,
                player: PlayerId(104),
                name: "Dee Alcott".to_string(),
                score: 6.5,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_failure_degrades_to_none() {
        assert_eq!(narrate(&Offline, &finished()), None);
    }

    #[test]
    fn test_recap_mentions_result_and_highlights() {
        let text = narrate(&RecapNarrator::new(3), &finished()).unwrap();
        assert!(text.starts_with("The Bay City Comets beat the Riverton Ironmen 3-2 in 10 innings."));
        assert!(text.contains("Dee Alcott won it with a walk-off single."));
        assert!(text.contains("Player of the game: Dee Alcott."));
    }

    #[test]
    fn test_recap_uses_configured_regulation() {
        let seven = BoxScore { innings: 7, ..finished() };
        let short = RecapNarrator::new(0).with_regulation_innings(5);
        let text = narrate(&short, &seven).unwrap();
        assert!(text.starts_with("The Bay City Comets beat the Riverton Ironmen 3-2 in 7 innings."));

        let full = narrate(&RecapNarrator::new(0), &seven).unwrap();
        assert_eq!(full, "The Bay City Comets beat the Riverton Ironmen 3-2. Player of the game: Dee Alcott.");
    }

    #[test]
    fn test_recap_refuses_unfinished_game() {
        let unfinished = BoxScore { complete: false, ..finished() };
        assert!(RecapNarrator::default().generate(&unfinished, &[]).is_err());
        assert_eq!(narrate(&RecapNarrator::default(), &unfinished), None);
    }
}
