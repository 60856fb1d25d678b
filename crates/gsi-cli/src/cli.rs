use std::path::PathBuf;

use clap::Parser;
use gsi_common::metadata::LevelFilter;
use gsi_common::util::tracing::{resolve_level, setup_tracing};

use crate::{error::GsiCliResult, init::init_config};

mod info;
mod run;

#[derive(Debug, Parser)]
#[command(version, about = "Exposes Agones game servers through Kubernetes Ingresses", long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Directory searched for `config.*` files
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Overrides the configured `log_level`
    #[clap(short('l'), long, value_name("LEVEL"))]
    pub log_level: Option<LevelFilter>,

    /// Settings file, takes precedence over `--root`
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Parser, Clone)]
pub enum Command {
    #[command(about = "Show build information")]
    Info(info::InfoArgs),
    #[command(about = "Watch game servers and create their Service and Ingress", alias = "r")]
    Run(run::RunArgs),
}

pub async fn exec() -> GsiCliResult {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let cfg = init_config(&cli);
    let configured = cfg.as_ref().map(|cfg| cfg.log_level.as_str()).unwrap_or("info");
    setup_tracing(Some(resolve_level(cli.log_level, configured)))?;
    let cfg = cfg?;

    match cli.cmd {
        Command::Info(args) => info::run(args, cfg).await?,
        Command::Run(args) => run::run(args, cfg).await?,
    }
    Ok(())
}
