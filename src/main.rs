mod configuration;
mod kubernetes;
mod server;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::configuration::{Args, LogFormat};
use crate::kubernetes::kubers::{self, KubeRsBased};
use crate::kubernetes::model::SharedK8sClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = configuration::resolve(Args::parse())?;
    init_tracing(settings.log_format)?;

    info!(
        bind = %settings.bind,
        kubeconfig = ?settings.kubeconfig,
        context = ?settings.context,
        "Starting kube_rest_facade"
    );

    let client =
        kubers::connect(settings.kubeconfig.as_deref(), settings.context.as_deref()).await?;
    let client: SharedK8sClient = Arc::new(KubeRsBased::new(client));

    server::serve(client, settings.bind, shutdown_signal()).await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("kube_rest_facade=info".parse()?)
        .add_directive("tower_http=info".parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Received shutdown signal, draining connections");
}
