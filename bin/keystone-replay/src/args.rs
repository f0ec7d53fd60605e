//! Command line arguments for `keystone-replay`.

use std::path::PathBuf;

use argh::FromArgs;

/// Replays blocks of raw transactions through the admin validation engine and
/// prints the resulting admin state as JSON.
#[derive(FromArgs, Debug)]
pub(crate) struct Args {
    #[argh(option, description = "chain params TOML file", short = 'p')]
    pub(crate) params: PathBuf,

    #[argh(positional, description = "replay file (JSON) with UTXOs and blocks")]
    pub(crate) blocks: PathBuf,

    #[argh(switch, description = "emit logs as JSON")]
    pub(crate) json_logs: bool,

    #[argh(
        switch,
        description = "skip rejected blocks instead of stopping at the first one"
    )]
    pub(crate) keep_going: bool,
}
