use std::{path::PathBuf, sync::Arc};

mod backend_bridge;
mod config;
mod controller;
mod ui;

use anyhow::{anyhow, Context};
use clap::Parser;
use client_core::{AuthContext, HttpPolicyClient, PolicyService};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::{
    backend_bridge::commands::BackendCommand,
    config::{load_settings, CliOverrides},
    controller::events::UiEvent,
    ui::PolicyDeskApp,
};

#[derive(Parser, Debug)]
#[command(name = "policy_desk", about = "Desktop front-end for vehicle insurance policies")]
struct Args {
    /// Base URL of the policy service, e.g. http://127.0.0.1:8080/api
    #[arg(long)]
    api_base_url: Option<String>,
    /// Actor recorded as created_by/updated_by on submissions.
    #[arg(long)]
    actor_id: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// tracing filter used when RUST_LOG is unset.
    #[arg(long)]
    log_filter: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings(&CliOverrides {
        api_base_url: args.api_base_url,
        actor_id: args.actor_id,
        config_path: args.config,
        log_filter: args.log_filter,
    })?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let base_url = settings.base_url()?;
    let auth = AuthContext::new(settings.actor()?);
    let service: Arc<dyn PolicyService> = Arc::new(
        HttpPolicyClient::with_timeout(&base_url, settings.request_timeout())
            .context("failed to build http client")?,
    );
    tracing::info!(api_base_url = %base_url, actor = %auth.actor(), "starting policy desk");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, service, auth)
        .context("failed to spawn backend worker thread")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Policy Desk")
            .with_inner_size([1180.0, 720.0])
            .with_min_inner_size([860.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Policy Desk",
        options,
        Box::new(|_cc| Ok(Box::new(PolicyDeskApp::new(cmd_tx, ui_rx)))),
    )
    .map_err(|err| anyhow!("desktop ui exited with an error: {err}"))
}
