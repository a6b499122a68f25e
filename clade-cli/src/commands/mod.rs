pub mod normalize;
pub mod stats;
pub mod tree;

use std::path::{Path, PathBuf};

use clap::Subcommand;

use clade_core::config::NormalizerConfig;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Normalize a checklist directory into a taxon database
    Normalize(normalize::NormalizeArgs),
    /// Print the taxonomic tree from a normalized database
    Tree(tree::TreeArgs),
    /// Show insertion metadata and issue/status/rank counts
    Stats(stats::StatsArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Normalize(args) => normalize::run(args),
        Command::Tree(args) => tree::run(args),
        Command::Stats(args) => stats::run(args),
    }
}

/// Where the payload database lives: an explicit `--store` wins, then the
/// config file, then `clade.db` next to the source files.
pub fn resolve_db_path(dir: &Path, config: &NormalizerConfig, flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    match &config.store.path {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => dir.join(path),
        None => dir.join("clade.db"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_config() {
        let mut config = NormalizerConfig::default();
        config.store.path = Some(PathBuf::from("other.db"));
        let resolved = resolve_db_path(
            Path::new("/data"),
            &config,
            Some(Path::new("/tmp/explicit.db")),
        );
        assert_eq!(resolved, PathBuf::from("/tmp/explicit.db"));
    }

    #[test]
    fn relative_config_path_is_anchored_to_the_source_dir() {
        let mut config = NormalizerConfig::default();
        config.store.path = Some(PathBuf::from("out/taxa.db"));
        let resolved = resolve_db_path(Path::new("/data"), &config, None);
        assert_eq!(resolved, PathBuf::from("/data/out/taxa.db"));
    }

    #[test]
    fn default_sits_next_to_the_source() {
        let config = NormalizerConfig::default();
        let resolved = resolve_db_path(Path::new("/data"), &config, None);
        assert_eq!(resolved, PathBuf::from("/data/clade.db"));
    }
}
