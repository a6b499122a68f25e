use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use clade_core::config::NormalizerConfig;
use clade_core::insert::TabularSource;
use clade_core::normalize::Normalizer;
use clade_core::progress::IndicatifReporter;
use clade_core::store::GraphStore;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Checklist directory containing the source files (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Database file to write (default: clade.db in the checklist directory)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Fail on duplicate taxon identifiers instead of flagging them
    #[arg(long)]
    pub strict_ids: bool,

    /// Records per transaction batch
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[allow(clippy::cast_precision_loss)]
pub fn run(args: NormalizeArgs) -> anyhow::Result<()> {
    let dir = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Cannot resolve path: {}", args.path.display()))?;

    let mut config = NormalizerConfig::load_or_default(&dir)
        .with_context(|| format!("Cannot load config from {}", dir.display()))?;
    if args.strict_ids {
        config.insert.strict_ids = true;
    }
    if let Some(batch_size) = args.batch_size {
        config.insert.batch_size = batch_size;
    }

    let db_path = super::resolve_db_path(&dir, &config, args.store.as_deref());
    let source = TabularSource::open(&dir, &config.source)
        .with_context(|| format!("Cannot open checklist source in {}", dir.display()))?;
    let store = GraphStore::open(&db_path)
        .with_context(|| format!("Cannot open database: {}", db_path.display()))?;
    info!(db = %db_path.display(), "normalizing checklist");

    let normalizer = Normalizer::new(store, source, config)
        .with_reporter(Box::new(IndicatifReporter::new()));
    let store = normalizer
        .run(false)
        .context("Normalization failed")?
        .context("normalizer closed the store unexpectedly")?;

    let meta = store
        .payloads()
        .load_metadata()
        .context("Cannot read run metadata")?;
    let usage_count = store.payloads().usage_count()?;
    store.close().context("Cannot close database")?;

    println!("Checklist normalized into {}", db_path.display());
    println!();
    if let Some(meta) = meta {
        println!("  Records read:    {}", meta.records);
        println!("  Usages created:  {usage_count}");
        println!("  Vernaculars:     {}", meta.vernaculars);
        println!("  Distributions:   {}", meta.distributions);
        if meta.duplicate_ids > 0 {
            println!("  Duplicate ids:   {}", meta.duplicate_ids);
        }
        println!(
            "  Duration:        {:.1}s",
            meta.elapsed().num_milliseconds() as f64 / 1000.0
        );
    }
    Ok(())
}
