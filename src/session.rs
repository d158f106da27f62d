//! Interactive chat session
//!
//! Reads one request per line, routes it, and prints the chosen route
//! followed by the backend's answer. `exit` or `quit` (any case) or end of
//! input ends the session. Generic over reader and writer so it can be
//! driven from tests.

use crate::error::AppResult;
use crate::models::Backend;
use crate::persona::PersonaProfile;
use crate::router::HybridRouter;
use std::io::{BufRead, Write};

/// A chat session bound to one persona
pub struct ChatSession<'a> {
    router: &'a HybridRouter,
    backend: &'a dyn Backend,
    profile: &'a PersonaProfile,
}

impl<'a> ChatSession<'a> {
    pub fn new(
        router: &'a HybridRouter,
        backend: &'a dyn Backend,
        profile: &'a PersonaProfile,
    ) -> Self {
        Self {
            router,
            backend,
            profile,
        }
    }

    /// Run the session until `exit`/`quit` or end of input
    ///
    /// Returns the number of requests answered. A failing backend call is
    /// reported inline and the session continues.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading input or writing output fails.
    pub async fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> AppResult<usize> {
        let persona = if self.profile.persona_description.is_empty() {
            "N/A"
        } else {
            self.profile.persona_description.as_str()
        };
        writeln!(output, "Your persona: {}", persona)?;
        writeln!(output, "Type 'exit' or 'quit' to end the session.")?;

        let mut answered = 0;
        let mut line = String::new();

        loop {
            write!(output, "\nYou: ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }

            let request = line.trim();
            if request.is_empty() {
                continue;
            }
            if request.eq_ignore_ascii_case("exit") || request.eq_ignore_ascii_case("quit") {
                writeln!(output, "Goodbye!")?;
                break;
            }

            let decision = self.router.decide(self.profile, request).await;
            writeln!(output, "\n[Router chose: {}]", decision.route())?;

            match self
                .backend
                .complete(decision.route(), decision.final_prompt())
                .await
            {
                Ok(answer) => {
                    writeln!(output, "\nAssistant: {}", answer)?;
                    answered += 1;
                }
                Err(e) => {
                    tracing::warn!(route = %decision.route(), error = %e, "Backend call failed");
                    writeln!(output, "\nError: {}", e)?;
                }
            }
        }

        Ok(answered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::StubClassifier;
    use crate::config::RoutingConfig;
    use crate::error::{AppError, ModelQueryError};
    use crate::metrics::Metrics;
    use crate::router::Route;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::Arc;

    struct EchoBackend;

    #[async_trait]
    impl Backend for EchoBackend {
        async fn complete(&self, route: Route, _prompt: &str) -> AppResult<String> {
            Ok(format!("answer from {}", route))
        }
    }

    struct DownBackend;

    #[async_trait]
    impl Backend for DownBackend {
        async fn complete(&self, _route: Route, _prompt: &str) -> AppResult<String> {
            Err(AppError::ModelQuery(ModelQueryError::EmptyResponse {
                endpoint: "http://localhost:11434/v1".to_string(),
            }))
        }
    }

    fn router(stub: StubClassifier) -> HybridRouter {
        HybridRouter::new(
            &RoutingConfig::default(),
            Arc::new(stub),
            Arc::new(Metrics::new().unwrap()),
        )
    }

    async fn run_session(backend: &dyn Backend, input: &str) -> (usize, String) {
        let router = router(StubClassifier::replying(
            r#"{"route":"LOCAL_SMALL_MODEL","final_prompt":"..."}"#,
        ));
        let profile = PersonaProfile::default();
        let session = ChatSession::new(&router, backend, &profile);

        let mut output = Vec::new();
        let answered = session
            .run(Cursor::new(input.to_string()), &mut output)
            .await
            .unwrap();
        (answered, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn test_session_prints_route_and_answer() {
        let (answered, output) = run_session(&EchoBackend, "What is Rust?\nexit\n").await;

        assert_eq!(answered, 1);
        assert!(output.contains("Your persona: N/A"));
        assert!(output.contains("[Router chose: LOCAL_SMALL_MODEL]"));
        assert!(output.contains("Assistant: answer from LOCAL_SMALL_MODEL"));
        assert!(output.trim_end().ends_with("Goodbye!"));
    }

    #[tokio::test]
    async fn test_session_stops_at_quit_and_skips_blank_lines() {
        let (answered, output) = run_session(&EchoBackend, "\n   \nQUIT\nnever read\n").await;
        assert_eq!(answered, 0);
        assert!(!output.contains("Router chose"));
    }

    #[tokio::test]
    async fn test_session_ends_at_eof() {
        let (answered, _) = run_session(&EchoBackend, "one\ntwo").await;
        assert_eq!(answered, 2);
    }

    #[tokio::test]
    async fn test_session_survives_backend_errors() {
        let (answered, output) = run_session(&DownBackend, "hi\nexit\n").await;
        assert_eq!(answered, 0);
        assert!(output.contains("Error: "));
        assert!(output.contains("Goodbye!"));
    }

    #[tokio::test]
    async fn test_long_line_escalates_without_classifier() {
        let router = router(StubClassifier::unavailable());
        let profile = PersonaProfile::default();
        let session = ChatSession::new(&router, &EchoBackend, &profile);
        let input = format!("{}\nexit\n", "word ".repeat(501));

        let mut output = Vec::new();
        session.run(Cursor::new(input), &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("[Router chose: CLOUD_LARGE_MODEL]"));
    }
}
