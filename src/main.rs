//! WSI Exhibit - layout and load synchronization for multi-channel slide exhibits.
//!
//! This binary loads an exhibit and either prints its layout or simulates
//! building it into a headless viewer.

use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_exhibit::{
    barrier::BarrierReport,
    config::{Cli, Command, LayoutConfig, SimulateConfig},
    exhibit::{load_exhibit, ExhibitBuilder, HttpFetcher, LayoutReport},
    viewer::{HeadlessRenderState, HeadlessViewer, LayerStatus, Viewer, ViewerOptions},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Layout(config) => run_layout(config).await,
        Command::Simulate(config) => run_simulate(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr so that JSON output on stdout stays parseable.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "wsi_exhibit=debug"
    } else {
        "wsi_exhibit=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> ExitCode {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };

    match json {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Layout Command
// =============================================================================

async fn run_layout(config: LayoutConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let exhibit = match load_exhibit(config.source(), &HttpFetcher::new()).await {
        Ok(exhibit) => exhibit,
        Err(e) => {
            error!("Failed to load exhibit: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match LayoutReport::plan(&exhibit, config.texture_units) {
        Ok(report) => print_json(&report, config.compact),
        Err(e) => {
            error!("Invalid exhibit: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Simulate Command
// =============================================================================

#[derive(Serialize)]
struct LayerOutcome {
    index: usize,
    layer: String,
    status: &'static str,
}

#[derive(Serialize)]
struct SimulationReport {
    name: String,
    layers: Vec<LayerOutcome>,
    fired: bool,
    total: usize,
    loaded: usize,
    failed: usize,
    timed_out: bool,
    initializer_ran: bool,
}

async fn run_simulate(config: SimulateConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let exhibit = match load_exhibit(config.source(), &HttpFetcher::new()).await {
        Ok(exhibit) => exhibit,
        Err(e) => {
            error!("Failed to load exhibit: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let headless = Arc::new(HeadlessViewer::with_options(ViewerOptions::for_exhibit(
        &exhibit,
        config.texture_units,
    )));
    let viewer: Arc<dyn Viewer> = headless.clone();

    let initialized = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&initialized);
    let initializer = Box::new(move |report: &BarrierReport| {
        flag.store(true, Ordering::Release);
        info!(
            loaded = report.loaded,
            failed = report.failed,
            "Initializing legend and overlays"
        );
    });

    let mut builder = ExhibitBuilder::new(Arc::new(HeadlessRenderState::new()))
        .with_failure_policy(config.failure_policy);
    if let Some(timeout) = config.barrier_timeout() {
        builder = builder.with_barrier_timeout(timeout);
    }

    let built = match builder.build(&exhibit, &viewer, initializer) {
        Ok(built) => built,
        Err(e) => {
            error!("Failed to build exhibit: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for handle in headless.pending_layers() {
        if config.fail_layers.contains(&handle.layer) {
            headless.fail_layer(handle.index, "failed on request");
        } else if config.skip_layers.contains(&handle.layer) {
            info!(layer = %handle.layer, "Leaving layer unresolved");
        } else {
            headless.complete_layer(handle.index);
        }
    }
    headless.tick();

    let report = match (built.barrier.report(), config.barrier_timeout()) {
        (Some(report), _) => Some(report),
        (None, Some(timeout)) => {
            info!("Waiting up to {:?} for the load barrier", timeout);
            // The armed deadline fires first
            built
                .barrier
                .wait_timeout(timeout + Duration::from_secs(1))
                .await
                .ok()
        }
        (None, None) => None,
    };

    if report.is_none() {
        warn!(
            loaded = built.barrier.loaded(),
            failed = built.barrier.failed(),
            total = built.barrier.total(),
            "Load barrier never fired"
        );
    }

    let layers = built
        .layers
        .iter()
        .map(|handle| LayerOutcome {
            index: handle.index,
            layer: handle.layer.clone(),
            status: match headless.layer_status(handle.index) {
                Some(LayerStatus::Loaded) => "loaded",
                Some(LayerStatus::Failed) => "failed",
                Some(LayerStatus::Pending) | None => "pending",
            },
        })
        .collect();

    let output = SimulationReport {
        name: built.display_name.clone(),
        layers,
        fired: report.is_some(),
        total: built.barrier.total(),
        loaded: built.barrier.loaded(),
        failed: built.barrier.failed(),
        timed_out: report.map(|r| r.timed_out).unwrap_or(false),
        initializer_ran: initialized.load(Ordering::Acquire),
    };

    let code = print_json(&output, false);
    if report.is_some() {
        code
    } else {
        ExitCode::FAILURE
    }
}
