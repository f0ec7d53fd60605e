//! Offline replay tool for the admin validation engine.
//!
//! Loads chain params, replays blocks of raw transactions from a JSON file and
//! prints the final admin info (thread tips, key sets, total supply) to
//! stdout.

mod args;
mod logging;
mod replay;

use std::process;

use anyhow::Context;
use keystone_params::ChainParams;
use tracing::info;

use crate::{
    args::Args,
    replay::{ReplayFile, Replayer},
};

fn main() {
    let args: Args = argh::from_env();
    logging::init(args.json_logs);

    if let Err(e) = run(args) {
        eprintln!("ERROR\n{e:?}");
        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let params = ChainParams::load(&args.params)
        .with_context(|| format!("loading params from {}", args.params.display()))?;
    let file = ReplayFile::load(&args.blocks)?;
    info!(blocks = file.blocks.len(), utxos = file.utxos.len(), "loaded replay file");

    let report = Replayer::new(params)?.run(&file, args.keep_going)?;
    info!(
        connected = report.connected_blocks,
        rejected = report.rejected_blocks,
        "replay finished"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
