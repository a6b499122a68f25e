use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use clade_core::store::PayloadStore;
use clade_core::tree::render_tree;

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Normalized database file
    #[arg(default_value = "clade.db")]
    pub store: PathBuf,
}

pub fn run(args: TreeArgs) -> anyhow::Result<()> {
    if !args.store.is_file() {
        anyhow::bail!(
            "Cannot open database: {}. Run `clade normalize` first.",
            args.store.display()
        );
    }
    let payloads = PayloadStore::open(&args.store)
        .with_context(|| format!("Cannot open database: {}", args.store.display()))?;

    let rendered = render_tree(&payloads).context("Cannot render tree")?;
    if rendered.is_empty() {
        println!("(empty tree)");
    } else {
        print!("{rendered}");
    }
    Ok(())
}
