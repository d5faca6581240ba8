use anyhow::{Context, Result};

use ticktag::config::Config;
use ticktag::publisher::{HttpPublishSink, Publisher};
use ticktag::store::AirtableStore;

pub async fn publish(mut config: Config, force: bool, dry_run: bool) -> Result<()> {
    config.publisher.dry_run |= dry_run;

    config.validate()?;
    config.validate_publisher()?;

    let store = AirtableStore::new(&config.store).context("Failed to create record store client")?;
    let sink = HttpPublishSink::from_config(&config.publisher, config.request_timeout())
        .context("Failed to create publish sink client")?
        .context("publisher.sink_url must be set")?;

    let report = Publisher::new(&store, &sink, &config).run(force).await?;

    println!("Publish complete");
    println!("================");
    println!("  Rendered: {}", report.rendered.len());
    println!("  Candidates: {}", report.candidates.len());
    println!("  Committed: {}", report.committed.len());
    for path in &report.committed {
        println!("    {path}");
    }
    println!("  Dirty flags cleared: {}", report.cleared);
    if config.publisher.dry_run {
        println!("  (dry run, nothing committed)");
    }

    Ok(())
}
