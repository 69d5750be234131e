use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, CandidateFile, ClassificationService, HealthJob, HttpClassificationClient,
    Preview, ResultView, Settings, UploadLifecycleController, View,
};
use shared::{domain::Zone, protocol::HealthResponse};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

const BAR_WIDTH: usize = 30;

#[derive(Parser, Debug)]
#[command(name = "car-classify", about = "Classify car images with a remote model")]
struct Args {
    /// Base URL of the classification service.
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// Route prefix, e.g. `/api`.
    #[arg(long, global = true)]
    api_prefix: Option<String>,
    /// Settings file; defaults to ./classifier.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate, preview and classify one image.
    Classify {
        path: PathBuf,
        /// Skip the startup health probe.
        #[arg(long)]
        no_health_check: bool,
    },
    /// Print the service health report.
    Health,
    /// List the labels the model knows.
    Classes,
}

/// Prints zone content to stdout. Error text is left to `main`, which
/// returns it as the process error.
#[derive(Default)]
struct TerminalView {
    error: Option<String>,
}

impl View for TerminalView {
    fn show_zone(&mut self, zone: Zone) {
        println!("[{zone}]");
        if zone == Zone::Processing {
            println!("Classifying...");
        }
    }

    fn set_preview(&mut self, preview: &Preview) {
        match &preview.thumbnail {
            Some(image) => println!(
                "Preview: {} ({}x{})",
                preview.file_name, image.width, image.height
            ),
            None => println!("Preview: {} (no thumbnail)", preview.file_name),
        }
    }

    fn clear_preview(&mut self) {}

    fn render_result(&mut self, result: &ResultView) {
        println!("{} ({})", result.label, result.confidence_text);
        if result.not_a_car {
            println!("This image does not look like a car.");
        }
        if let Some(rows) = &result.probabilities {
            let width = rows.iter().map(|row| row.label.len()).max().unwrap_or(0);
            for row in rows {
                println!(
                    "  {:<width$}  {:<BAR_WIDTH$}  {:>6}",
                    row.label,
                    bar(row.bar_fraction),
                    row.percent_text,
                );
            }
        }
    }

    fn set_error_message(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn clear_file_input(&mut self) {}

    fn set_drag_highlight(&mut self, _active: bool) {}
}

fn bar(fraction: f32) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
    "#".repeat(filled)
}

fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = &args.server_url {
        settings.server_url = server_url.clone();
    }
    if let Some(api_prefix) = &args.api_prefix {
        settings.api_prefix = api_prefix.clone();
    }
    Ok(settings)
}

async fn classify(
    service: Arc<dyn ClassificationService>,
    path: &Path,
    health_check: bool,
) -> Result<()> {
    let mut controller = UploadLifecycleController::new(TerminalView::default(), service);
    if health_check {
        spawn_health_check(controller.health_job());
    }

    let candidate = match CandidateFile::from_path(path) {
        Ok(candidate) => candidate,
        Err(err) => {
            controller.reject_file(err);
            bail!("{}: {}", failure(&controller), path.display());
        }
    };

    let Some(decode) = controller.select_file(candidate) else {
        bail!(failure(&controller));
    };
    let completion = tokio::task::spawn_blocking(move || decode.run())
        .await
        .context("preview task panicked")?;
    controller.preview_finished(completion);

    let Some(predict) = controller.confirm_classification() else {
        bail!(failure(&controller));
    };
    let completion = predict.run().await;
    controller.prediction_finished(completion);

    match controller.zone() {
        Zone::Results => Ok(()),
        _ => bail!(failure(&controller)),
    }
}

/// Runs in the background; classification never waits on it.
fn spawn_health_check(job: HealthJob) -> JoinHandle<Option<HealthResponse>> {
    tokio::spawn(job.run())
}

fn failure(controller: &UploadLifecycleController<TerminalView>) -> String {
    controller
        .view()
        .error
        .clone()
        .unwrap_or_else(|| format!("classification stopped in the {} zone", controller.zone()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = resolve_settings(&args)?;
    let client = HttpClassificationClient::from_settings(&settings)?;
    tracing::info!(predict = %client.endpoints().predict, "using classification service");
    let service: Arc<dyn ClassificationService> = Arc::new(client);

    match &args.command {
        Command::Classify {
            path,
            no_health_check,
        } => {
            let health_check = settings.health_check_on_startup && !no_health_check;
            classify(service, path, health_check).await
        }
        Command::Health => {
            let health = service.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
            Ok(())
        }
        Command::Classes => {
            let classes = service.classes().await?;
            println!("{} classes", classes.total_classes);
            for class in &classes.classes {
                println!("  {class}");
            }
            Ok(())
        }
    }
}
