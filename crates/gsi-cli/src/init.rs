use gsi_common::{
    error::GsiResult,
    settings::{set_config, Settings},
};

use crate::Cli;

/// Loads settings from `--settings`, else `--root`, else the working directory.
pub fn init_config(cli: &Cli) -> GsiResult<&'static Settings> {
    let source = cli.settings.clone().or_else(|| cli.root.clone());
    set_config(Settings::from_root(source)?)
}
