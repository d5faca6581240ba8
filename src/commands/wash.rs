use anyhow::{Context, Result};

use ticktag::clock;
use ticktag::config::Config;
use ticktag::store::AirtableStore;
use ticktag::washer::Washer;

/// CLI overrides for the wash command
pub struct WashParams {
    pub mode: Option<String>,
    pub relock: bool,
    pub reschedule: bool,
    pub iterations: Option<u32>,
    pub interval: Option<u64>,
    pub dry_run: bool,
}

pub async fn wash(mut config: Config, params: WashParams) -> Result<()> {

    if params.mode.is_some() {
        config.tagger.mode_override = params.mode;
    }
    let washer = &mut config.washer;
    washer.relock |= params.relock;
    washer.reschedule |= params.reschedule;
    washer.dry_run |= params.dry_run;
    if let Some(iterations) = params.iterations {
        washer.iterations = iterations;
    }
    if let Some(interval) = params.interval {
        washer.interval_secs = interval;
    }

    config.validate()?;
    if config.washer.target.table.trim().is_empty() {
        anyhow::bail!("washer table must not be empty");
    }

    let store = AirtableStore::new(&config.store).context("Failed to create record store client")?;
    let clock = clock::from_config(&config.clock, config.request_timeout())
        .context("Failed to create clock source")?;

    let report = Washer::new(&store, clock.as_ref(), &config).run().await?;

    println!("Wash complete");
    println!("=============");
    println!("  Mode: {}", report.mode);
    for (i, round) in report.rounds.iter().enumerate() {
        println!(
            "  Round {}: now={} due={} written={}",
            i + 1,
            round.clock.now_epoch,
            round.due.len(),
            round.written
        );
    }

    Ok(())
}
