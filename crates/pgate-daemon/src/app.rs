//! Application lifecycle.

use std::sync::Arc;

use tracing::{error, info, warn};

use pgate_api::run_server;
use pgate_policy::PolicyGate;

use crate::config::AppConfig;
use crate::error::AppResult;

/// The daemon: one gate, served over HTTP.
pub struct Application {
    config: AppConfig,
    gate: Arc<PolicyGate>,
}

impl Application {
    /// Validate `config` and build the gate.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let gate = Arc::new(PolicyGate::new(config.policy.clone()));

        info!(
            version = %gate.version(),
            kill_switch = config.policy.kill_switch,
            empty_order_pass = config.policy.empty_order_pass,
            "Policy gate initialized"
        );
        if config.policy.empty_order_pass {
            warn!("Empty orders bypass every policy rule");
        }

        Ok(Self { config, gate })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared handle to the gate.
    pub fn gate(&self) -> &Arc<PolicyGate> {
        &self.gate
    }

    /// Serve until Ctrl-C or SIGTERM.
    pub async fn run(self) -> AppResult<()> {
        run_server(self.gate, self.config.server, shutdown_signal()).await?;
        info!("Shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
