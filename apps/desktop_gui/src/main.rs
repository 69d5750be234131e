use std::{path::PathBuf, sync::Arc};

mod backend_bridge;
mod controller;
mod ui;

use anyhow::{anyhow, Result};
use clap::Parser;
use client_core::{load_settings, ClassificationService, HttpClassificationClient};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{app::StartupConfig, ClassifierApp};

#[derive(Parser, Debug)]
#[command(name = "car-classifier-gui", about = "Desktop front-end for the car classifier")]
struct Args {
    /// Base URL of the classification service.
    #[arg(long)]
    server_url: Option<String>,
    /// Route prefix, e.g. `/api`.
    #[arg(long)]
    api_prefix: Option<String>,
    /// Settings file; defaults to ./classifier.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(api_prefix) = args.api_prefix {
        settings.api_prefix = api_prefix;
    }
    let client = HttpClassificationClient::from_settings(&settings)?;
    tracing::info!(predict = %client.endpoints().predict, "using classification service");
    let service: Arc<dyn ClassificationService> = Arc::new(client);

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(cmd_rx, ui_tx)?;

    let startup = StartupConfig {
        server_label: settings.server_url.clone(),
        health_check_on_startup: settings.health_check_on_startup,
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Car Classifier")
            .with_inner_size([720.0, 680.0])
            .with_min_inner_size([480.0, 420.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Car Classifier",
        options,
        Box::new(move |_cc| Ok(Box::new(ClassifierApp::new(service, startup, cmd_tx, ui_rx)))),
    )
    .map_err(|err| anyhow!("desktop GUI exited with an error: {err}"))
}
