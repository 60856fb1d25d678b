use clap::Parser;
use gsi_common::settings::Settings;

use crate::error::GsiCliResult;

#[derive(Parser, Debug, Clone)]
pub struct InfoArgs {
    /// Also print the resolved settings as YAML
    #[arg(long)]
    pub show_settings: bool,
}

pub async fn run(args: InfoArgs, config: &Settings) -> GsiCliResult<()> {
    println!(
        "{} {} ({}, rustc {})",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_BUILD_TIMESTAMP"),
        short_sha(env!("VERGEN_GIT_SHA")),
        env!("VERGEN_RUSTC_SEMVER")
    );
    if args.show_settings {
        print!("{}", serde_yaml::to_string(config)?);
    }
    Ok(())
}

/// First 8 characters of a commit hash; anything shorter is returned as is.
fn short_sha(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}
