//! Crossera Simulator
//!
//! Runs one cross-era matchup from the bundled sample league (or the dataset
//! named by `CROSSERA_DATASET`), prints the box score, then replays the same
//! seed to confirm the event log is reproduced exactly.

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crossera::{
    core::derive_game_seed,
    game::events::GameEventData,
    provider::{narrate, RecapNarrator},
    simulate_with_config, InMemoryProvider, ReferenceEra, SimConfig, SimulationRequest, VERSION,
};

const DEFAULT_SEED: u64 = 12345;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Crossera Simulator v{}", VERSION);

    let provider = match std::env::var("CROSSERA_DATASET") {
        Ok(path) => InMemoryProvider::from_json_file(&path)
            .with_context(|| format!("loading dataset {path}"))?,
        Err(_) => InMemoryProvider::sample().context("loading sample league")?,
    };
    let config = match std::env::var("CROSSERA_CONFIG") {
        Ok(path) => SimConfig::from_json_file(&path).with_context(|| format!("loading config {path}"))?,
        Err(_) => SimConfig::default(),
    };
    let base_seed = match std::env::var("CROSSERA_SEED") {
        Ok(text) => text.parse().with_context(|| format!("invalid seed {text:?}"))?,
        Err(_) => DEFAULT_SEED,
    };

    let mut teams = provider.teams().map(|(name, season)| (name.to_string(), season));
    let (Some(away), Some(home)) = (teams.next(), teams.next()) else {
        bail!("dataset needs at least two team rosters");
    };
    let park = provider
        .park_names()
        .next()
        .map(str::to_string)
        .context("dataset has no parks")?;

    let label = format!("{} {} @ {} {}", away.0, away.1, home.0, home.1);
    let seed = derive_game_seed(&label, base_seed);
    info!("{} (seed {})", label, seed);

    let request = SimulationRequest {
        away_team: away.0,
        away_season: away.1,
        home_team: home.0,
        home_season: home.1,
        park,
        reference_era: ReferenceEra(home.1),
        seed,
    };

    info!("=== Starting Game ===");
    let output = simulate_with_config(&provider, &request, &config)?;

    for event in &output.events {
        if let GameEventData::HalfInningEnded { runs, hits, left_on_base, score } = event.data {
            info!(
                "{} {}: {} R, {} H, {} LOB ({})",
                event.half.label(),
                event.inning,
                runs,
                hits,
                left_on_base,
                score
            );
        }
    }

    info!("=== Box Score ===");
    for line in output.box_score.to_string().lines() {
        info!("{}", line);
    }
    if let Some(mvp) = &output.box_score.mvp_batter {
        info!("MVP (batting): {} ({:.2})", mvp.name, mvp.score);
    }
    if let Some(mvp) = &output.box_score.mvp_pitcher {
        info!("MVP (pitching): {} ({:.2})", mvp.name, mvp.score);
    }
    let narrator = RecapNarrator::new(3).with_regulation_innings(config.rules.regulation_innings);
    if let Some(recap) = narrate(&narrator, &output.box_score) {
        info!("Recap: {}", recap);
    }

    let digest = output.digest()?;
    info!("Events: {}", output.events.len());
    info!("Event Log Digest: {}", hex::encode(digest));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let replay = simulate_with_config(&provider, &request, &config)?;
    let replay_digest = replay.digest()?;
    info!("Replay Digest: {}", hex::encode(replay_digest));

    if digest != replay_digest {
        bail!("DETERMINISM FAILURE: digests differ");
    }
    info!("DETERMINISM VERIFIED: digests match");
    Ok(())
}
