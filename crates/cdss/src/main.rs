//! Request treatment recommendations for a psychiatric presentation from the
//! terminal.
//!
//! Reads the API key from `secrets.toml` (or `CDSS_API_KEY`).
//!
//! # Examples
//!
//! ```sh
//! # Recommendation for a moderate mood presentation
//! cdss --category mood --symptom "Persistent sadness" --symptom Insomnia \
//!   --severity moderate
//!
//! # With history and medications, then follow-up questions from stdin
//! cdss --category anxiety --symptom "Excessive worry" --severity mild \
//!   --history "No prior episodes" --medications "None" --follow-up
//!
//! # List the symptom catalog
//! cdss --list-symptoms
//! ```

use std::io::{self, Write};
use std::process;

use cdss::clinical::{ClinicalInput, Severity, SymptomCategory};
use cdss::config::{DEFAULT_SECRETS_PATH, Settings};
use cdss::consult::{Consultant, Recommendation, Session};
use cdss::error::ConsultError;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Request treatment recommendations for a psychiatric presentation.
#[derive(Parser)]
#[command(name = "cdss", version)]
struct Cli {
    // ── Presentation ───────────────────────────────────────────
    /// Symptom category (Mood, Anxiety, Psychotic, Other)
    #[arg(long, default_value = "Mood Disorders")]
    category: SymptomCategory,

    /// Selected symptom; repeat for several
    #[arg(long = "symptom")]
    symptoms: Vec<String>,

    /// Severity (Mild, Moderate, Severe)
    #[arg(long, default_value = "Moderate")]
    severity: Severity,

    /// Relevant medical history
    #[arg(long, default_value = "")]
    history: String,

    /// Current medications
    #[arg(long, default_value = "")]
    medications: String,

    // ── Settings ───────────────────────────────────────────────
    /// Path to the secrets file
    #[arg(long, env = "CDSS_SECRETS", default_value = DEFAULT_SECRETS_PATH)]
    secrets: String,

    /// Override the model from the secrets file
    #[arg(long, env = "CDSS_MODEL")]
    model: Option<String>,

    /// Override the retry count for transient failures
    #[arg(long)]
    retries: Option<u32>,

    // ── Output mode ────────────────────────────────────────────
    /// Print the unsectioned reply text
    #[arg(long)]
    raw: bool,

    /// After the recommendation, read follow-up questions from stdin
    #[arg(long)]
    follow_up: bool,

    /// Print the symptom catalog and exit
    #[arg(long)]
    list_symptoms: bool,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cdss=info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_catalog() {
    for category in SymptomCategory::ALL {
        println!("{category}:");
        for symptom in category.symptoms() {
            println!("  - {symptom}");
        }
    }
}

fn build_consultant(cli: &Cli) -> Result<Consultant, ConsultError> {
    let mut settings = Settings::load(&cli.secrets)?;
    if let Some(model) = &cli.model {
        settings.llm.model = Some(model.clone());
    }
    if let Some(retries) = cli.retries {
        settings.llm.retries = Some(retries);
    }
    let consultant = Consultant::from_settings(&settings)?;
    tracing::debug!(
        "Using model {} ({} retries)",
        consultant.config().model,
        consultant.config().retry.max_retries
    );
    Ok(consultant)
}

fn print_recommendation(rec: &Recommendation, raw: bool) {
    if raw {
        println!("{rec}");
        return;
    }
    for section in rec.sections() {
        println!("## {}\n{}\n", section.label, section.text());
    }
}

fn prompt_for_question() -> Result<(), String> {
    eprint!("follow-up> ");
    io::stderr().flush().map_err(|e| e.to_string())
}

/// Answer one question per non-blank line of `input` until it ends.
async fn follow_up_loop<R>(
    consultant: &Consultant,
    session: &mut Session,
    input: R,
) -> Result<(), String>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    prompt_for_question()?;
    while let Some(question) = lines
        .next_line()
        .await
        .map_err(|e| format!("failed to read stdin: {e}"))?
    {
        if !question.trim().is_empty() {
            match consultant.ask_follow_up(session, &question).await {
                Ok(answer) => println!("{answer}\n"),
                Err(e) if e.is_recoverable() => eprintln!("Error: {}", e.user_message()),
                Err(e) => return Err(e.user_message()),
            }
        }
        prompt_for_question()?;
    }
    eprintln!("\n--- {} log entries ---", session.history().len());
    Ok(())
}

async fn run(cli: Cli) -> Result<(), String> {
    let consultant = build_consultant(&cli).map_err(|e| e.user_message())?;
    let input = ClinicalInput::new(cli.category, cli.severity)
        .with_symptoms(cli.symptoms.iter().map(String::as_str))
        .with_history(cli.history.as_str())
        .with_medications(cli.medications.as_str());

    let mut session = Session::new();
    let rec = consultant
        .generate_recommendations(&mut session, &input)
        .await
        .map_err(|e| e.user_message())?;
    print_recommendation(&rec, cli.raw);

    if cli.follow_up {
        follow_up_loop(&consultant, &mut session, BufReader::new(tokio::io::stdin())).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    if cli.list_symptoms {
        print_catalog();
        return;
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cdss::FnBackend;
    use cdss::api::RetryConfig;
    use cdss::consult::{ConsultConfig, Role};
    use cdss::error::ExternalCallError;

    fn echo_consultant() -> Consultant {
        let backend = FnBackend::new(|req: &cdss::ChatRequest| {
            let last = req.messages.last().map_or("", |m| m.content.as_str());
            if last.contains("fail") {
                Err(ExternalCallError::Timeout)
            } else {
                Ok(format!("answer {}", req.messages.len()))
            }
        });
        Consultant::new(
            Arc::new(backend),
            ConsultConfig::default().with_retry(RetryConfig::immediate(0)),
        )
    }

    #[tokio::test]
    async fn follow_up_loop_reads_lines_and_skips_blanks() {
        let consultant = echo_consultant();
        let mut session = Session::new();
        let input: &[u8] = b"First question?\n\n   \nSecond question?\n";

        follow_up_loop(&consultant, &mut session, input).await.unwrap();

        let view: Vec<(Role, &str)> = session
            .history()
            .iter()
            .map(|e| (e.role, e.text.as_str()))
            .collect();
        assert_eq!(
            view,
            vec![
                (Role::Doctor, "First question?"),
                (Role::Ai, "answer 2"),
                (Role::Doctor, "Second question?"),
                (Role::Ai, "answer 4"),
            ]
        );
    }

    #[tokio::test]
    async fn follow_up_loop_continues_after_recoverable_error() {
        let consultant = echo_consultant();
        let mut session = Session::new();
        let input: &[u8] = b"this will fail\nfine now";

        follow_up_loop(&consultant, &mut session, input).await.unwrap();

        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].text, "fine now");
    }
}
