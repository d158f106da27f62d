//! edgeroute binary
//!
//! Runs the HTTP server, one-shot routing and persona commands, or an
//! interactive chat session.

use clap::Parser;
use edgeroute::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    error::AppResult,
    handlers::{self, AppState},
    persona::{PersonaProfile, load_profile, save_profile},
    session::ChatSession,
    telemetry,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Config { output } => match output {
            Some(path) => {
                std::fs::write(&path, generate_config_template())?;
                eprintln!("Configuration template written to {}", path);
            }
            None => print!("{}", generate_config_template()),
        },
        Command::Serve => serve(load_state(&cli.config)?).await?,
        Command::Route { request, profile } => {
            let state = load_state(&cli.config)?;
            let profile = match profile {
                Some(path) => load_profile(&path)?.unwrap_or_else(|| {
                    tracing::warn!(path = %path.display(), "Profile file not found, using empty profile");
                    PersonaProfile::default()
                }),
                None => PersonaProfile::default(),
            };

            let decision = state.router().decide(&profile, &request).await;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Command::Persona {
            description,
            output,
        } => {
            let state = load_state(&cli.config)?;
            let profile = state.extractor().extract(&description).await?;
            match output {
                Some(path) => {
                    save_profile(&path, &profile)?;
                    eprintln!("Profile written to {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&profile)?),
            }
        }
        Command::Chat {
            profile,
            description,
        } => {
            let state = load_state(&cli.config)?;
            let persona = resolve_profile(&state, &profile, description.as_deref()).await?;

            let session = ChatSession::new(state.router(), state.backend(), &persona);
            let answered = session
                .run(std::io::stdin().lock(), std::io::stdout().lock())
                .await?;
            tracing::info!(answered = answered, "Chat session ended");
        }
    }

    Ok(())
}

/// Load configuration, start logging, and wire the application state
fn load_state(config_path: &str) -> AppResult<AppState> {
    let config = Config::from_file(config_path)?;
    telemetry::init(&config.observability.log_level);
    AppState::new(Arc::new(config))
}

/// Profile for a chat session: stored file, else extracted once and saved
async fn resolve_profile(
    state: &AppState,
    path: &Path,
    description: Option<&str>,
) -> AppResult<PersonaProfile> {
    if let Some(profile) = load_profile(path)? {
        return Ok(profile);
    }

    match description {
        Some(description) => {
            let profile = state.extractor().extract(description).await?;
            save_profile(path, &profile)?;
            tracing::info!(path = %path.display(), "Created persona profile");
            Ok(profile)
        }
        None => {
            tracing::warn!(
                path = %path.display(),
                "No profile file and no --description given, chatting without a persona"
            );
            Ok(PersonaProfile::default())
        }
    }
}

async fn serve(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let server = &state.config().server;
    let addr = SocketAddr::from((
        server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        server.port,
    ));

    tracing::info!(
        classifier = %state.config().models.classifier.name(),
        local = %state.config().models.local.name(),
        cloud = %state.config().models.cloud.name(),
        word_threshold = state.config().routing.word_threshold,
        "Starting edgeroute server"
    );
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, handlers::app(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
