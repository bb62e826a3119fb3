//! PlantAI - Plant photo upload and disease inference client
//!
//! Main entry point for the command-line host.
//!
//! # Overview
//!
//! This binary drives the same controllers a graphical host would. It initializes:
//! - Configuration loading ([`ConfigManager`]) from `PlantAI Data/`
//! - Logging infrastructure (daily file rotation + optional console output)
//! - A current-thread tokio runtime for the inference request
//! - State management ([`StateManager`]) and a presenter thread printing changes
//!
//! # Execution Flow
//!
//! 1. Load `PlantAI Config.yaml` (written with defaults on first run), apply `PLANTAI_*` overrides
//! 2. Initialize logging → `<log_dir>/plantai.<date>`
//! 3. Select an image: paths on the command line are handled as a drop (first file
//!    wins); with no arguments a native file picker is shown
//! 4. Submit it to `{api_url}/predict` and print the result
//! 5. Reset, releasing the preview, and log a metrics summary

use anyhow::{Context, Result};
use plantai::controller::utf8_paths;
use plantai::ui::{ResultView, spawn_presenter, status_message};
use plantai::{
    APP_NAME, ConfigManager, HttpInferenceClient, IngestionController, Metrics, PreviewStore,
    StateManager, SubmissionController, VERSION,
};
use std::sync::Arc;

fn main() -> Result<()> {
    // Load configuration before logging so the log settings can come from it
    let config_manager = ConfigManager::new("PlantAI Data")?;
    let created = config_manager.ensure_user_config()?;
    let user_config = config_manager.load_user_config()?;

    let _guard = plantai::logging::setup_logging_with_console(
        &user_config.log_dir,
        "plantai",
        user_config.debug_mode,
        user_config.console_logging,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    if created {
        tracing::info!(
            "Wrote default configuration to {}",
            config_manager.user_config_path()
        );
    }

    let endpoint = user_config.predict_endpoint()?;

    // One request at a time, so a single thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let state_manager = Arc::new(StateManager::new());
    let previews = Arc::new(PreviewStore::new());
    let metrics = Arc::new(Metrics::new());
    let client = Arc::new(HttpInferenceClient::new(endpoint)?);
    tracing::info!("Inference endpoint: {}", client.endpoint());

    let presenter = spawn_presenter(state_manager.subscribe(), |line| println!("{}", line));

    let ingestion = IngestionController::new(
        Arc::clone(&state_manager),
        Arc::clone(&previews),
        Arc::clone(&metrics),
    );
    let submission = SubmissionController::new(
        Arc::clone(&state_manager),
        client,
        Arc::clone(&metrics),
        runtime.handle().clone(),
    );

    let paths = utf8_paths(std::env::args_os().skip(1));
    if paths.is_empty() {
        ingestion.pick_from_dialog()?;
    } else {
        ingestion.select_from_paths(&paths)?;
    }

    if !state_manager.read(|s| s.has_image()) {
        tracing::info!("No image selected, exiting");
    } else {
        tracing::info!("{}", state_manager.read(status_message));
        runtime.block_on(submission.submit_and_wait());

        let view = state_manager.read(ResultView::from_state);
        if view.is_visible() {
            tracing::info!("Result: {}", view.render());
        }
    }

    ingestion.reset();
    metrics.log_summary();

    // Dropping the last StateManager closes the channel and stops the presenter
    drop(ingestion);
    drop(submission);
    drop(state_manager);
    if presenter.join().is_err() {
        tracing::error!("Presenter thread panicked");
    }

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    tracing::info!("Application shutdown complete");

    Ok(())
}
