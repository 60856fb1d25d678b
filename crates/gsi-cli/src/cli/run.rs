use clap::Parser;
use gsi_common::settings::Settings;
use gsi_common::{info, warn};
use gsi_operator::operator;
use tokio_util::sync::CancellationToken;

use crate::error::GsiCliResult;

#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Only watch game servers in this namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Domain for game servers without a domain or fqdn annotation
    #[arg(long)]
    pub base_domain: Option<String>,

    /// cert-manager issuer for TLS game servers without an issuer annotation
    #[arg(long)]
    pub default_issuer: Option<String>,

    #[arg(long)]
    pub max_concurrent_reconciles: Option<usize>,
}

impl RunArgs {
    /// Settings with every flag given on the command line applied on top.
    fn apply(self, config: &Settings) -> Settings {
        let mut settings = config.clone();
        if let Some(namespace) = self.namespace {
            settings.namespace = Some(namespace);
        }
        if let Some(base_domain) = self.base_domain {
            settings.base_domain = Some(base_domain);
        }
        if let Some(issuer) = self.default_issuer {
            settings.default_issuer = Some(issuer);
        }
        if let Some(max) = self.max_concurrent_reconciles {
            settings.max_concurrent_reconciles = max;
        }
        settings
    }
}

pub async fn run(args: RunArgs, config: &Settings) -> GsiCliResult<()> {
    let settings = args.apply(config);
    let cancel = CancellationToken::new();

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                shutdown.cancel();
            }
            Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
        }
    });

    operator(&settings, cancel).await?;
    Ok(())
}
