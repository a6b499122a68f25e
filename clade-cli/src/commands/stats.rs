use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use clade_core::store::PayloadStore;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Normalized database file
    #[arg(default_value = "clade.db")]
    pub store: PathBuf,

    /// Emit machine-readable JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatsArgs) -> anyhow::Result<()> {
    if !args.store.is_file() {
        anyhow::bail!(
            "Cannot open database: {}. Run `clade normalize` first.",
            args.store.display()
        );
    }
    let payloads = PayloadStore::open(&args.store)
        .with_context(|| format!("Cannot open database: {}", args.store.display()))?;

    let meta = payloads
        .load_metadata()
        .context("Cannot read run metadata")?;
    let usages = payloads.usage_count()?;
    let statuses = payloads.status_counts()?;
    let ranks = payloads.rank_counts()?;
    let issues = payloads.issue_counts()?;

    if args.json {
        let out = serde_json::json!({
            "database": args.store.display().to_string(),
            "usages": usages,
            "metadata": meta,
            "statuses": counts_object(&statuses),
            "ranks": counts_object(&ranks),
            "issues": counts_object(&issues),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Clade stats for {}", args.store.display());
    println!();
    if let Some(size) = payloads.file_size() {
        println!("  Size:   {}", format_bytes(size));
    }
    println!("  Usages: {usages}");
    if let Some(meta) = &meta {
        println!();
        println!("  Last run: {}", meta.run_id);
        println!("    started:       {}", meta.started.to_rfc3339());
        if let Some(finished) = meta.finished {
            println!("    finished:      {}", finished.to_rfc3339());
        }
        println!("    records:       {}", meta.records);
        println!("    vernaculars:   {}", meta.vernaculars);
        println!("    distributions: {}", meta.distributions);
        if meta.duplicate_ids > 0 {
            println!("    duplicate ids: {}", meta.duplicate_ids);
        }
    }

    print_counts("Statuses", &statuses);
    print_counts("Ranks", &ranks);
    print_counts("Issues", &issues);
    Ok(())
}

fn print_counts(heading: &str, counts: &[(String, u64)]) {
    if counts.is_empty() {
        return;
    }
    println!();
    println!("  {heading}:");
    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (key, count) in sorted {
        println!("    {key:<28} {count:>8}");
    }
}

fn counts_object(counts: &[(String, u64)]) -> serde_json::Value {
    counts
        .iter()
        .map(|(key, count)| (key.clone(), serde_json::json!(count)))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn counts_sort_by_frequency_then_name() {
        let counts = vec![
            ("b".to_string(), 1),
            ("a".to_string(), 1),
            ("c".to_string(), 5),
        ];
        let object = counts_object(&counts);
        assert_eq!(object["c"], 5);
        // rendering order is checked by eye; the object keeps all keys
        assert_eq!(object.as_object().map(serde_json::Map::len), Some(3));
    }
}
