use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::application::PredictUseCase;
use crate::infrastructure::artifacts::{ArtifactLayout, ArtifactStore};
use crate::infrastructure::config::Settings;
use crate::interfaces::http::{add_log, LogEntry};

pub struct AppState {
    pub predict_use_case: PredictUseCase,
    pub artifacts: Arc<ArtifactStore>,
    pub settings: Settings,
}

/// Wire up settings, artifacts and the HTTP server, then serve until the
/// process is stopped. Artifact load failures are logged and reported per
/// request; they never abort startup.
pub async fn run() -> std::io::Result<()> {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let settings = Settings::load().unwrap_or_else(|err| {
        error!(error = %err, "Falling back to default settings");
        Settings::default()
    });

    let artifacts = Arc::new(ArtifactStore::new(ArtifactLayout::new(
        settings.artifact_dir.clone(),
    )));

    let status = artifacts.warm_up();
    for (name, state) in [("scaler", &status.scaler), ("model", &status.model)] {
        match &state.error {
            None => add_log(&logs, "INFO", "Artifacts", &format!("Loaded {name}")),
            Some(err) => add_log(
                &logs,
                "ERROR",
                "Artifacts",
                &format!("Failed to load {name}: {err}"),
            ),
        }
    }

    let state = Arc::new(AppState {
        predict_use_case: PredictUseCase::new(artifacts.clone()),
        artifacts,
        settings: settings.clone(),
    });

    let server = crate::interfaces::http::start_server(state, logs.clone())?;

    info!(host = %settings.host, port = settings.port, "HTTP server started");
    add_log(
        &logs,
        "INFO",
        "System",
        &format!(
            "Backend initialized and HTTP server started on {}:{}",
            settings.host, settings.port
        ),
    );

    server.await
}
