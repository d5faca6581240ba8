use anyhow::{Context, Result};

use ticktag::clock;
use ticktag::config::Config;
use ticktag::store::AirtableStore;
use ticktag::tagging::Tagger;

/// CLI overrides for the tag command
pub struct TagParams {
    pub mode: Option<String>,
    pub dry_run: bool,
    pub pass_delay: Option<u64>,
    pub timeout: Option<u64>,
}

pub async fn tag(mut config: Config, params: TagParams) -> Result<()> {

    if params.mode.is_some() {
        config.tagger.mode_override = params.mode;
    }
    if let Some(delay) = params.pass_delay {
        config.tagger.pass_delay_secs = delay;
    }
    if let Some(timeout) = params.timeout {
        config.store.timeout_secs = timeout;
    }
    config.tagger.dry_run |= params.dry_run;

    config.validate()?;

    let store = AirtableStore::new(&config.store).context("Failed to create record store client")?;
    let clock = clock::from_config(&config.clock, config.request_timeout())
        .context("Failed to create clock source")?;

    let report = Tagger::new(&store, clock.as_ref(), &config).run().await?;

    println!("Tagging complete");
    println!("================");
    println!("  Mode: {}", report.mode);
    println!("  Passes: {}", report.passes.len());
    for (i, pass) in report.passes.iter().enumerate() {
        println!(
            "  Pass {}: now={} schedules={} trips={} written={}",
            i + 1,
            pass.clock.now_epoch,
            pass.schedule_patches.len(),
            pass.trip_patches.len(),
            pass.written
        );
    }
    if config.tagger.dry_run {
        println!("  (dry run, nothing written)");
    }

    Ok(())
}
