//! Command-line interface for edgeroute
//!
//! Provides argument parsing and subcommand handling for the edgeroute binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Edge/cloud request router for self-hosted LLMs
#[derive(Parser)]
#[command(name = "edgeroute")]
#[command(version)]
#[command(about = "Edge/cloud request router for self-hosted LLMs")]
#[command(
    long_about = "edgeroute decides, per request, whether a cheap local model or a larger \
    cloud model should answer, and builds a persona-aware prompt for the chosen model."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default when no subcommand is given)
    Serve,

    /// Print the routing decision for one request
    Route {
        /// The request text
        request: String,

        /// Persona profile JSON file
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },

    /// Extract a persona profile from a self-description
    Persona {
        /// Free-text self-description
        description: String,

        /// Write the profile to this file (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start an interactive chat session
    Chat {
        /// Persona profile JSON file (created from --description if missing)
        #[arg(short, long, default_value = "profile.json")]
        profile: PathBuf,

        /// Self-description used to create the profile when the file is missing
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# edgeroute Configuration
# ========================
#
# Configures the HTTP server, the three model endpoints, routing policy,
# classifier call limits, and logging.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# Timeout in seconds for backend (local/cloud) model calls
request_timeout_seconds = 60

# ─────────────────────────────────────────────────────────────────────────────
# MODEL ENDPOINTS
# ─────────────────────────────────────────────────────────────────────────────
#
# All endpoints must be OpenAI-compatible (Ollama serves one at /v1).
#
# Endpoint fields:
#   - name: Model identifier
#   - base_url: API base URL (must end with /v1)
#   - max_tokens: Maximum tokens for generation
#   - temperature: Sampling temperature (0.0-2.0, default 0.7)
#   - system_prompt: Optional system message sent with every query

# Classifier: makes routing decisions and extracts persona profiles
[models.classifier]
name = "gemma3:4b"
base_url = "http://localhost:11434/v1"
max_tokens = 2048
temperature = 0.2
system_prompt = "You are a helpful AI that strictly follows instructions."

# LOCAL_SMALL_MODEL: cheap default backend
[models.local]
name = "gemma3:4b"
base_url = "http://localhost:11434/v1"
max_tokens = 4096
temperature = 0.7
system_prompt = "You are a helpful local assistant."

# CLOUD_LARGE_MODEL: costly high-capacity backend
[models.cloud]
name = "llama3.1:8b"
base_url = "http://localhost:11434/v1"
max_tokens = 8192
temperature = 0.7
system_prompt = "You are a powerful AI assistant."

# ─────────────────────────────────────────────────────────────────────────────
# ROUTING POLICY
# ─────────────────────────────────────────────────────────────────────────────

[routing]
# Requests with more words than this skip the classifier and go to the cloud
word_threshold = 500

# First line of prompts built for hard-rule escalations
cloud_framing = "You are a powerful large language model."

# First line of prompts built for fallbacks
default_framing = "You are an AI assistant."

# ─────────────────────────────────────────────────────────────────────────────
# CLASSIFIER CALL LIMITS
# ─────────────────────────────────────────────────────────────────────────────

[classifier]
# Per-attempt timeout in seconds (max 300)
timeout_seconds = 30

# Answers larger than this are rejected mid-stream
max_response_bytes = 16384

# Attempts for transient failures (timeouts, broken streams), 1-5
max_attempts = 2

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["edgeroute"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path_after_subcommand() {
        let cli = Cli::parse_from(["edgeroute", "serve", "--config", "custom.toml"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn route_subcommand() {
        let cli = Cli::parse_from(["edgeroute", "route", "What is a monad?", "-p", "me.json"]);
        match cli.command {
            Some(Command::Route { request, profile }) => {
                assert_eq!(request, "What is a monad?");
                assert_eq!(profile, Some(PathBuf::from("me.json")));
            }
            _ => panic!("expected route subcommand"),
        }
    }

    #[test]
    fn persona_subcommand() {
        let cli = Cli::parse_from(["edgeroute", "persona", "I am a chemist", "-o", "p.json"]);
        assert!(matches!(
            cli.command,
            Some(Command::Persona { ref description, output: Some(ref path) })
                if description == "I am a chemist" && path == &PathBuf::from("p.json")
        ));
    }

    #[test]
    fn chat_subcommand_defaults() {
        let cli = Cli::parse_from(["edgeroute", "chat"]);
        match cli.command {
            Some(Command::Chat {
                profile,
                description,
            }) => {
                assert_eq!(profile, PathBuf::from("profile.json"));
                assert!(description.is_none());
            }
            _ => panic!("expected chat subcommand"),
        }
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["edgeroute", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "my-config.toml"
        ));
    }

    #[test]
    fn template_is_a_valid_config() {
        let config: Config = generate_config_template()
            .parse()
            .expect("template should parse and validate");
        assert_eq!(config.routing.word_threshold, 500);
        assert_eq!(config.models.cloud.name(), "llama3.1:8b");
        assert_eq!(
            config.models.local.system_prompt(),
            Some("You are a helpful local assistant.")
        );
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        for section in [
            "[server]",
            "[models.classifier]",
            "[models.local]",
            "[models.cloud]",
            "[routing]",
            "[classifier]",
            "[observability]",
        ] {
            assert!(template.contains(section), "missing {}", section);
        }
    }
}
