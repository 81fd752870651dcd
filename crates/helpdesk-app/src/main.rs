//! Helpdesk application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialise tracing
//! 3. Build the generative backend, context supplier and identity provider
//! 4. Serve the HTTP API, or run the terminal shell with `--interactive`

mod cli;
mod shell;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;

use helpdesk_api::AppState;
use helpdesk_chat::{ConversationOrchestrator, GenerativeBackend, MockBackend, VoiceInterface};
use helpdesk_core::config::{BackendProvider, HelpdeskConfig};
use helpdesk_core::error::HelpdeskError;
use helpdesk_core::events::DomainEvent;
use helpdesk_gemini::GeminiBackend;
use helpdesk_identity::SessionGate;

use cli::CliArgs;

fn build_backend(config: &HelpdeskConfig) -> helpdesk_core::Result<Arc<dyn GenerativeBackend>> {
    match config.backend.provider {
        BackendProvider::Gemini => {
            let backend = GeminiBackend::from_config(&config.backend)?;
            tracing::info!(model = %backend.model(), "Gemini backend ready");
            Ok(Arc::new(backend))
        }
        BackendProvider::Mock => {
            tracing::warn!("Using mock backend; replies are canned");
            Ok(Arc::new(MockBackend::new()))
        }
    }
}

/// Write the default configuration, refusing to replace an existing file
/// unless `force` is set.
fn init_config(path: &Path, force: bool) -> helpdesk_core::Result<()> {
    if path.exists() && !force {
        return Err(HelpdeskError::Config(format!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        )));
    }
    HelpdeskConfig::default().save(path)
}

/// Log every domain event at debug until the channel closes.
fn spawn_event_log(mut rx: broadcast::Receiver<DomainEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => tracing::debug!(
                    event = event.event_name(),
                    at = %event.timestamp(),
                    "{:?}",
                    event
                ),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event log lagging")
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config (before tracing so the configured level can seed the filter).
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = match HelpdeskConfig::load(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (HelpdeskConfig::default(), Some(e)),
    };

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Helpdesk v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config; using defaults"
        ),
    }

    if args.init_config {
        init_config(&config_file, args.force)?;
        println!("Wrote default configuration to {}", config_file.display());
        return Ok(());
    }

    config.general.port = args.resolve_port(config.general.port);

    // Collaborators.
    let backend = build_backend(&config)?;
    let context = helpdesk_chat::context::from_config(&config.context);

    if args.interactive {
        let (event_tx, event_rx) = broadcast::channel(256);
        let _event_log = spawn_event_log(event_rx);
        let orchestrator = ConversationOrchestrator::from_config(&config, backend, context)
            .with_events("terminal", event_tx);
        orchestrator.preload_context().await;
        let voice = VoiceInterface::from_config(&config.speech);
        tracing::info!(
            listen = voice.can_listen(),
            speak = voice.can_speak(),
            "Terminal shell ready"
        );

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        shell::run(
            &orchestrator,
            &voice,
            &config.chat.greeting,
            stdin,
            tokio::io::stdout(),
        )
        .await?;
        return Ok(());
    }

    let provider = helpdesk_identity::from_config(&config.identity)?;
    let gate = SessionGate::new(provider);
    tracing::info!(provider = gate.provider().name(), "Identity provider ready");

    let state = AppState::new(config, backend, context, gate);
    let _event_log = spawn_event_log(state.event_tx.subscribe());
    let _session_watcher = state.gate.watch();
    tracing::info!(surfaces = ?state.surface_names(), "Chat surfaces ready");

    helpdesk_api::start_server(state).await?;
    tracing::info!("Helpdesk stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_config_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        init_config(&path, false).unwrap();
        let written = HelpdeskConfig::load(&path).unwrap();
        assert_eq!(written.general.port, HelpdeskConfig::default().general.port);
    }

    #[test]
    fn test_init_config_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nport = 9000\n").unwrap();

        let err = init_config(&path, false).unwrap_err();
        assert!(matches!(err, HelpdeskError::Config(msg) if msg.contains("--force")));
        assert_eq!(HelpdeskConfig::load(&path).unwrap().general.port, 9000);

        init_config(&path, true).unwrap();
        assert_eq!(
            HelpdeskConfig::load(&path).unwrap().general.port,
            HelpdeskConfig::default().general.port
        );
    }

    #[tokio::test]
    async fn test_event_log_stops_when_channel_closes() {
        let (tx, rx) = broadcast::channel(4);
        let handle = spawn_event_log(rx);
        tx.send(DomainEvent::session_ended(0)).unwrap();
        drop(tx);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
