//! Simulation Entry Point
//!
//! One call turns two historical rosters, a park, a reference era and a seed
//! into an event log and a box score. Identical arguments always yield a
//! byte-identical log.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::SimConfig;
use crate::core::hash::StateHash;
use crate::error::SimError;
use crate::feed::EventLog;
use crate::game::box_score::{summarize_with, BoxScore};
use crate::game::machine::GameMachine;
use crate::game::matchup::MatchupContext;
use crate::provider::StatsProvider;
use crate::stats::profile::ReferenceEra;

/// Everything that identifies a simulated game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Visiting team name
    pub away_team: String,
    /// Visiting team season
    pub away_season: u16,
    /// Home team name
    pub home_team: String,
    /// Home team season
    pub home_season: u16,
    /// Park name; dimensions are taken for the home season
    pub park: String,
    /// Season all statistics are expressed in
    pub reference_era: ReferenceEra,
    /// Seed for every random draw
    pub seed: u64,
}

/// Result of one simulated game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    /// Complete event log
    pub events: EventLog,
    /// Summary derived from the log
    pub box_score: BoxScore,
    /// Fingerprint of the final game state
    pub state_hash: StateHash,
}

impl SimulationOutput {
    /// Digest of the canonical event log encoding.
    pub fn digest(&self) -> Result<StateHash, bincode::Error> {
        self.events.digest()
    }
}

/// Simulate one game with the default configuration.
pub fn simulate<P>(provider: &P, request: &SimulationRequest) -> Result<SimulationOutput, SimError>
where
    P: StatsProvider + ?Sized,
{
    simulate_with_config(provider, request, &SimConfig::default())
}

/// Simulate one game.
pub fn simulate_with_config<P>(
    provider: &P,
    request: &SimulationRequest,
    config: &SimConfig,
) -> Result<SimulationOutput, SimError>
where
    P: StatsProvider + ?Sized,
{
    let ctx = MatchupContext::build(provider, request, config)?;
    let mut machine = GameMachine::new(&ctx, config)?;
    machine.run()?;
    Ok(finish(machine, config))
}

/// Simulate one game, stopping between plate appearances once `cancel` is set.
pub fn simulate_cancellable<P>(
    provider: &P,
    request: &SimulationRequest,
    config: &SimConfig,
    cancel: &AtomicBool,
) -> Result<SimulationOutput, SimError>
where
    P: StatsProvider + ?Sized,
{
    let ctx = MatchupContext::build(provider, request, config)?;
    let mut machine = GameMachine::new(&ctx, config)?;
    machine.run_cancellable(cancel)?;
    Ok(finish(machine, config))
}

fn finish(machine: GameMachine<'_>, config: &SimConfig) -> SimulationOutput {
    let state = machine.into_state();
    let state_hash = state.compute_hash();
    let box_score = summarize_with(&state.log, &config.mvp);
    debug!(
        events = state.log.len(),
        batters = box_score.batters.len(),
        "Box score compiled"
    );
    SimulationOutput {
        events: state.log,
        box_score,
        state_hash,
    }
}

/// Simulate independent games concurrently on the blocking pool.
///
/// Results come back in request order and match what sequential calls to
/// [`simulate_with_config`] would produce.
pub async fn simulate_many<P>(
    provider: Arc<P>,
    requests: Vec<SimulationRequest>,
    config: SimConfig,
) -> Vec<Result<SimulationOutput, SimError>>
where
    P: StatsProvider + ?Sized + 'static,
{
    let config = Arc::new(config);
    let mut set = JoinSet::new();

    for (index, request) in requests.iter().cloned().enumerate() {
        let provider = Arc::clone(&provider);
        let config = Arc::clone(&config);
        set.spawn_blocking(move || (index, simulate_with_config(&*provider, &request, &config)));
    }

    let mut results: Vec<Option<Result<SimulationOutput, SimError>>> =
        (0..requests.len()).map(|_| None).collect();

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => warn!("Simulation task aborted: {}", e),
        }
    }

    results
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(SimError::Cancelled { completed_plate_appearances: 0 })))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::{GameEventData, PlayKind};
    use crate::game::state::{Score, TeamSide, OUTS_PER_HALF};
    use crate::provider::{Dataset, InMemoryProvider};
    use crate::stats::player::{BattingLine, MetricRange, PlayerSeasonStats};
    use proptest::prelude::*;

    fn request(seed: u64) -> SimulationRequest {
        SimulationRequest {
            away_team: "Riverton Ironmen".to_string(),
            away_season: 1968,
            home_team: "Bay City Comets".to_string(),
            home_season: 2019,
            park: "Comets Yard".to_string(),
            reference_era: ReferenceEra(2019),
            seed,
        }
    }

    #[test]
    fn test_same_inputs_byte_identical_log() {
        let provider = InMemoryProvider::sample().unwrap();
        let a = simulate(&provider, &request(77)).unwrap();
        let b = simulate(&provider, &request(77)).unwrap();
        assert_eq!(a.events.to_bytes().unwrap(), b.events.to_bytes().unwrap());
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        assert_eq!(a.state_hash, b.state_hash);
        assert_eq!(a.box_score, b.box_score);
    }

    #[test]
    fn test_different_seed_different_game() {
        let provider = InMemoryProvider::sample().unwrap();
        let a = simulate(&provider, &request(1)).unwrap();
        let b = simulate(&provider, &request(2)).unwrap();
        assert_ne!(a.digest().unwrap(), b.digest().unwrap());
    }

    #[test]
    fn test_box_score_agrees_with_log() {
        let provider = InMemoryProvider::sample().unwrap();
        let output = simulate(&provider, &request(31)).unwrap();
        let box_score = &output.box_score;

        let Some(GameEventData::GameEnded { final_score, total_pitches, .. }) =
            output.events.last().map(|e| e.data.clone())
        else {
            panic!("log must end with GameEnded");
        };
        assert!(box_score.complete);
        assert_eq!(box_score.final_score, final_score);
        assert_eq!(box_score.total_pitches, total_pitches);
        assert_eq!(total_pitches, output.events.pitch_count() as u32);

        for side in TeamSide::ALL {
            let hits = output
                .events
                .iter()
                .filter(|e| e.batting_side() == side)
                .filter_map(|e| e.as_play())
                .filter(|p| p.kind.is_hit())
                .count() as u32;
            assert_eq!(box_score.totals(side).hits, hits);
            assert_eq!(box_score.totals(side).runs, final_score.get(side));
        }
        assert!(box_score.mvp_batter.is_some());
        assert!(box_score.mvp_pitcher.is_some());
    }

    #[test]
    fn test_batting_order_spans_half_innings() {
        let provider = InMemoryProvider::sample().unwrap();
        let output = simulate(&provider, &request(12)).unwrap();
        let roster = provider.team_roster("Riverton Ironmen", 1968).unwrap();

        let away_batters: Vec<_> = output
            .events
            .iter()
            .filter(|e| e.batting_side() == TeamSide::Away)
            .filter_map(|e| e.as_play())
            .map(|p| p.batter)
            .collect();
        assert!(away_batters.len() >= 27);
        for (k, batter) in away_batters.iter().enumerate() {
            assert_eq!(*batter, roster.lineup[k % 9]);
        }
    }

    #[test]
    fn test_missing_data_fails_before_first_pitch() {
        let provider = InMemoryProvider::sample().unwrap();
        let bad = SimulationRequest { away_team: "Nobody".to_string(), ..request(1) };
        assert!(matches!(simulate(&provider, &bad), Err(SimError::DataUnavailable(_))));

        let bad = SimulationRequest { park: "Atlantis Dome".to_string(), ..request(1) };
        assert!(matches!(simulate(&provider, &bad), Err(SimError::DataUnavailable(_))));
    }

    #[test]
    fn test_cancelled_before_start() {
        let provider = InMemoryProvider::sample().unwrap();
        let cancel = AtomicBool::new(true);
        let err = simulate_cancellable(&provider, &request(5), &SimConfig::default(), &cancel).unwrap_err();
        assert!(matches!(err, SimError::Cancelled { completed_plate_appearances: 0 }));
    }

    #[test]
    fn test_config_reaches_box_score() {
        let provider = InMemoryProvider::sample().unwrap();
        let mut config = SimConfig::default();
        config.mvp.home_run = 100.0;
        let plain = simulate(&provider, &request(8)).unwrap();
        let tuned = simulate_with_config(&provider, &request(8), &config).unwrap();
        // Weights change the summary, never the game
        assert_eq!(plain.events, tuned.events);
        for line in &tuned.box_score.batters {
            if line.home_runs > 0 {
                assert!(line.mvp_score(&config.mvp) >= 100.0 * f64::from(line.home_runs) - 10.0);
            }
        }
    }

    /// Sample league with every Comets season line rewritten by `edit`.
    fn comets_edited(edit: impl Fn(&mut PlayerSeasonStats)) -> InMemoryProvider {
        let mut dataset: Dataset = serde_json::from_str(include_str!("../data/sample_league.json")).unwrap();
        for player in dataset.players.iter_mut().filter(|p| p.season == 2019) {
            edit(player);
        }
        InMemoryProvider::new(dataset)
    }

    fn tally(provider: &InMemoryProvider, side: TeamSide, kind: fn(PlayKind) -> bool) -> usize {
        (0..20)
            .map(|seed| simulate(provider, &request(seed)).unwrap())
            .map(|output| {
                output
                    .events
                    .iter()
                    .filter(|e| e.batting_side() == side)
                    .filter_map(|e| e.as_play())
                    .filter(|p| kind(p.kind))
                    .count()
            })
            .sum()
    }

    #[test]
    fn test_lineup_power_shows_in_home_runs() {
        let batting = |home_runs: u32, hits: u32, avg_ev: f64, avg_angle: f64| {
            move |player: &mut PlayerSeasonStats| {
                if let Some(line) = player.batting.as_mut() {
                    *line = BattingLine {
                        plate_appearances: 620,
                        at_bats: 560,
                        hits,
                        doubles: 28,
                        triples: 2,
                        home_runs,
                        walks: 50,
                        strikeouts: 120,
                        hit_by_pitch: 5,
                        sac_flies: 5,
                        launch_speed: MetricRange::new(avg_ev, avg_ev - 30.0, 116.0),
                        launch_angle: MetricRange::new(avg_angle, -35.0, 60.0),
                    };
                }
            }
        };
        let sluggers = comets_edited(batting(45, 150, 95.0, 18.0));
        let slap_hitters = comets_edited(batting(1, 160, 80.0, 4.0));

        let is_homer = |kind: PlayKind| kind == PlayKind::HomeRun;
        let big = tally(&sluggers, TeamSide::Home, is_homer);
        let small = tally(&slap_hitters, TeamSide::Home, is_homer);
        assert!(big > small * 3 + 5, "sluggers {big} vs slap hitters {small}");
    }

    #[test]
    fn test_staff_strikeout_rate_shows_in_strikeouts() {
        let pitching = |strikeouts: u32, walks: u32| {
            move |player: &mut PlayerSeasonStats| {
                if let Some(line) = player.pitching.as_mut() {
                    line.batters_faced = 800;
                    line.outs_recorded = 570;
                    line.hits = 170;
                    line.walks = walks;
                    line.strikeouts = strikeouts;
                    line.home_runs = 22;
                }
            }
        };
        let power_arms = comets_edited(pitching(300, 60));
        let soft_tossers = comets_edited(pitching(80, 60));

        let is_strikeout = |kind: PlayKind| matches!(kind, PlayKind::Strikeout { .. });
        let many = tally(&power_arms, TeamSide::Away, is_strikeout);
        let few = tally(&soft_tossers, TeamSide::Away, is_strikeout);
        assert!(many > few + few / 2, "power arms {many} vs soft tossers {few}");
    }

    #[tokio::test]
    async fn test_simulate_many_matches_sequential() {
        let provider = Arc::new(InMemoryProvider::sample().unwrap());
        let requests: Vec<_> = (100..106).map(request).collect();
        let mut with_bad = requests.clone();
        with_bad.push(SimulationRequest { home_season: 1850, ..request(1) });

        let results = simulate_many(Arc::clone(&provider), with_bad, SimConfig::default()).await;
        assert_eq!(results.len(), requests.len() + 1);
        for (req, result) in requests.iter().zip(&results) {
            let sequential = simulate(&*provider, req).unwrap();
            assert_eq!(result.as_ref().unwrap().events, sequential.events);
        }
        assert!(matches!(results.last(), Some(Err(SimError::DataUnavailable(_)))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_game_invariants(seed in any::<u64>()) {
            let provider = InMemoryProvider::sample().unwrap();
            let output = simulate(&provider, &request(seed)).unwrap();
            let mut last = Score::default();
            let mut outs = 0u8;
            let mut at_bat = [0usize; 2];
            for event in &output.events {
                match &event.data {
                    GameEventData::HalfInningStarted { .. } => outs = 0,
                    GameEventData::PlayOutcome(play) => {
                        outs += play.outs_recorded;
                        prop_assert!(outs <= OUTS_PER_HALF);
                        prop_assert!(play.score_after.away >= last.away);
                        prop_assert!(play.score_after.home >= last.home);
                        last = play.score_after;
                        at_bat[event.batting_side() as usize] += 1;
                    }
                    _ => {}
                }
            }
            prop_assert!(output.events.is_complete());
            prop_assert_eq!(last, output.box_score.final_score);
            prop_assert!(at_bat[0] >= 27);
            prop_assert!(at_bat[1] >= 24);
        }
    }
}
