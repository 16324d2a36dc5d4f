//! LearnPulse CLI - Command-line interface for LearnPulse
//!
//! Commands:
//! - metrics: Compute metrics for a sealed session
//! - replay: Drive the recorder from an NDJSON command script
//! - prompt: Print the analysis prompt for a sealed session
//! - analyze: Send a sealed session to the inference provider
//! - parse: Validate a saved provider response
//! - doctor: Diagnose configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use learnpulse::analysis::{
    AnalysisClient, AnalysisRequestPayload, OpenAiCompatibleProvider, PromptBuilder, ResultParser,
};
use learnpulse::config::{self, AnalysisConfig, ProviderConfig};
use learnpulse::session::{compute_metrics, replay, ActivityMetrics, ActivitySession};
use learnpulse::{AnalysisError, ConfigError, ReplayError, LEARNPULSE_VERSION, PRODUCER_NAME};

/// LearnPulse - Activity telemetry recorder and learning-pattern analysis
#[derive(Parser)]
#[command(name = "learnpulse")]
#[command(version = LEARNPULSE_VERSION)]
#[command(about = "Record activity telemetry and analyze learning patterns", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for a sealed session
    Metrics {
        /// Sealed session JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Replay an NDJSON recorder script and emit each sealed session with its metrics
    Replay {
        /// Script file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Print the analysis prompt for a sealed session
    Prompt {
        /// Sealed session JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Error pattern tags observed by the activity
        #[arg(long = "error-pattern")]
        error_patterns: Vec<String>,
    },

    /// Analyze a sealed session with the inference provider
    Analyze {
        /// Sealed session JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Error pattern tags observed by the activity
        #[arg(long = "error-pattern")]
        error_patterns: Vec<String>,

        /// Model name
        #[arg(long, env = config::ENV_MODEL, default_value = config::DEFAULT_MODEL)]
        model: String,

        /// Provider call timeout in seconds
        #[arg(long, env = config::ENV_TIMEOUT_SECS, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Validate a saved provider response
    Parse {
        /// Response text file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Response kind
        #[arg(long, value_enum, default_value = "analysis")]
        kind: ResponseKind,
    },

    /// Diagnose configuration
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum ResponseKind {
    /// Learning-pattern analysis result
    Analysis,
    /// Generated activity descriptor
    Activity,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LEARNPULSE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), LearnPulseCliError> {
    match cli.command {
        Commands::Metrics {
            input,
            output_format,
        } => cmd_metrics(&input, output_format),

        Commands::Replay {
            input,
            output_format,
        } => cmd_replay(&input, output_format),

        Commands::Prompt {
            input,
            error_patterns,
        } => cmd_prompt(&input, error_patterns),

        Commands::Analyze {
            input,
            error_patterns,
            model,
            timeout_secs,
            output_format,
        } => cmd_analyze(&input, error_patterns, model, timeout_secs, output_format),

        Commands::Parse { input, kind } => cmd_parse(&input, kind),

        Commands::Doctor { json } => cmd_doctor(json),
    }
}

fn cmd_metrics(input: &Path, output_format: OutputFormat) -> Result<(), LearnPulseCliError> {
    let session = read_sealed_session(input)?;
    let metrics = compute_metrics(&session);
    println!("{}", format_output(&[metrics], &output_format)?.trim_end());
    Ok(())
}

fn cmd_replay(input: &Path, output_format: OutputFormat) -> Result<(), LearnPulseCliError> {
    let script = read_input(input)?;
    let sessions = replay(&script)?;

    if sessions.is_empty() {
        return Err(LearnPulseCliError::NoSessions);
    }

    let records: Vec<ReplayRecord> = sessions
        .into_iter()
        .map(|session| ReplayRecord {
            metrics: compute_metrics(&session),
            session,
        })
        .collect();

    println!("{}", format_output(&records, &output_format)?.trim_end());
    Ok(())
}

fn cmd_prompt(input: &Path, error_patterns: Vec<String>) -> Result<(), LearnPulseCliError> {
    let session = read_sealed_session(input)?;
    let payload = build_payload(&session, error_patterns);
    let prompt = PromptBuilder::analysis_prompt(&payload.activity_results, &payload.interaction_data)?;
    println!("{prompt}");
    Ok(())
}

fn cmd_analyze(
    input: &Path,
    error_patterns: Vec<String>,
    model: String,
    timeout_secs: u64,
    output_format: OutputFormat,
) -> Result<(), LearnPulseCliError> {
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            var: config::ENV_TIMEOUT_SECS,
            value: timeout_secs.to_string(),
        }
        .into());
    }

    let session = read_sealed_session(input)?;
    let payload = build_payload(&session, error_patterns);

    let provider_config = ProviderConfig::from_env()?;
    let provider = Arc::new(OpenAiCompatibleProvider::from_config(&provider_config));
    let analysis_config = AnalysisConfig::default()
        .with_model(model)
        .with_timeout(Duration::from_secs(timeout_secs));
    let client = AnalysisClient::with_config(provider, analysis_config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(
        client.analyze(&payload.activity_results, &payload.interaction_data),
    )?;

    println!("{}", format_output(&[result], &output_format)?.trim_end());
    Ok(())
}

fn cmd_parse(input: &Path, kind: ResponseKind) -> Result<(), LearnPulseCliError> {
    let raw = read_input(input)?;
    let output = match kind {
        ResponseKind::Analysis => serde_json::to_string_pretty(&ResultParser::parse(&raw)?)?,
        ResponseKind::Activity => {
            serde_json::to_string_pretty(&ResultParser::parse_activity(&raw)?)?
        }
    };
    println!("{output}");
    Ok(())
}

fn cmd_doctor(json: bool) -> Result<(), LearnPulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("LearnPulse version {}", LEARNPULSE_VERSION),
    });

    match ProviderConfig::from_env() {
        Ok(provider) => {
            checks.push(api_key_check(&provider));
            checks.push(DoctorCheck {
                name: "endpoint".to_string(),
                status: CheckStatus::Ok,
                message: OpenAiCompatibleProvider::from_config(&provider)
                    .endpoint()
                    .to_string(),
            });
        }
        Err(e @ ConfigError::MissingVar(_)) => checks.push(DoctorCheck {
            name: "api_key".to_string(),
            status: CheckStatus::Error,
            message: format!("{e} (or {})", config::ENV_FALLBACK_API_KEY),
        }),
        Err(e) => checks.push(DoctorCheck {
            name: "endpoint".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    match AnalysisConfig::from_env() {
        Ok(analysis) => checks.push(DoctorCheck {
            name: "analysis".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "model {} with {}s timeout",
                analysis.model,
                analysis.timeout.as_secs()
            ),
        }),
        Err(e) => checks.push(DoctorCheck {
            name: "analysis".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass files with --input)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: LEARNPULSE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("LearnPulse Doctor Report");
        println!("========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(LearnPulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn api_key_check(provider: &ProviderConfig) -> DoctorCheck {
    if provider.uses_fallback_key() {
        DoctorCheck {
            name: "api_key".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "Using {}; set {} to scope the key to LearnPulse",
                config::ENV_FALLBACK_API_KEY,
                config::ENV_API_KEY
            ),
        }
    } else {
        DoctorCheck {
            name: "api_key".to_string(),
            status: CheckStatus::Ok,
            message: format!("Provider API key is set ({})", provider.api_key_var),
        }
    }
}

fn read_input(input: &Path) -> Result<String, LearnPulseCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_sealed_session(input: &Path) -> Result<ActivitySession, LearnPulseCliError> {
    let session: ActivitySession = serde_json::from_str(&read_input(input)?)?;
    if !session.is_sealed() {
        return Err(LearnPulseCliError::UnsealedSession(session.session_id));
    }
    Ok(session)
}

fn build_payload(session: &ActivitySession, error_patterns: Vec<String>) -> AnalysisRequestPayload {
    let metrics = compute_metrics(session);
    let payload = AnalysisRequestPayload::from_session(session, &metrics);
    AnalysisRequestPayload {
        activity_results: payload.activity_results.with_error_patterns(error_patterns),
        ..payload
    }
}

fn format_output<T: serde::Serialize>(
    records: &[T],
    format: &OutputFormat,
) -> Result<String, LearnPulseCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => match records {
            [single] => Ok(serde_json::to_string(single)?),
            _ => Ok(serde_json::to_string(records)?),
        },
        OutputFormat::JsonPretty => match records {
            [single] => Ok(serde_json::to_string_pretty(single)?),
            _ => Ok(serde_json::to_string_pretty(records)?),
        },
    }
}

// Error types

#[derive(Debug)]
enum LearnPulseCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Replay(ReplayError),
    Analysis(AnalysisError),
    Config(ConfigError),
    UnsealedSession(String),
    NoSessions,
    DoctorFailed,
}

impl From<io::Error> for LearnPulseCliError {
    fn from(e: io::Error) -> Self {
        LearnPulseCliError::Io(e)
    }
}

impl From<serde_json::Error> for LearnPulseCliError {
    fn from(e: serde_json::Error) -> Self {
        LearnPulseCliError::Json(e)
    }
}

impl From<ReplayError> for LearnPulseCliError {
    fn from(e: ReplayError) -> Self {
        LearnPulseCliError::Replay(e)
    }
}

impl From<AnalysisError> for LearnPulseCliError {
    fn from(e: AnalysisError) -> Self {
        LearnPulseCliError::Analysis(e)
    }
}

impl From<ConfigError> for LearnPulseCliError {
    fn from(e: ConfigError) -> Self {
        LearnPulseCliError::Config(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<LearnPulseCliError> for CliError {
    fn from(e: LearnPulseCliError) -> Self {
        match e {
            LearnPulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            LearnPulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Input must be a sealed session as produced by the recorder".to_string()),
            },
            LearnPulseCliError::Replay(e) => CliError {
                code: "REPLAY_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Each line needs an RFC3339 \"at\" and a recorder \"op\"".to_string()),
            },
            LearnPulseCliError::Analysis(e) => {
                let (code, hint) = match &e {
                    AnalysisError::Service(_) => (
                        "ANALYSIS_SERVICE_ERROR",
                        "Check network access and provider status",
                    ),
                    AnalysisError::Timeout(_) => (
                        "ANALYSIS_TIMEOUT",
                        "Increase --timeout-secs or retry later",
                    ),
                    AnalysisError::Malformed(_) => (
                        "MALFORMED_ANALYSIS",
                        "The provider reply failed validation; retry the request",
                    ),
                    AnalysisError::Encoding(_) => {
                        ("ENCODING_ERROR", "Input could not be serialized")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            LearnPulseCliError::Config(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'learnpulse doctor' for details".to_string()),
            },
            LearnPulseCliError::UnsealedSession(id) => CliError {
                code: "UNSEALED_SESSION".to_string(),
                message: format!("Session {id} has not been ended"),
                hint: Some("Metrics and analysis require a sealed session".to_string()),
            },
            LearnPulseCliError::NoSessions => CliError {
                code: "NO_SESSIONS".to_string(),
                message: "Script did not seal any session".to_string(),
                hint: Some("Ensure the script contains start and end commands".to_string()),
            },
            LearnPulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ReplayRecord {
    session: ActivitySession,
    metrics: ActivityMetrics,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Debug, PartialEq, serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(vars: &[(&str, &str)]) -> ProviderConfig {
        ProviderConfig::from_lookup(|name| {
            vars.iter()
                .find(|(var, _)| *var == name)
                .map(|(_, value)| value.to_string())
        })
        .unwrap()
    }

    #[test]
    fn test_fallback_key_is_a_warning() {
        let check = api_key_check(&provider(&[(config::ENV_FALLBACK_API_KEY, "sk-openai")]));
        assert_eq!(check.status, CheckStatus::Warning);
        assert!(check.message.contains(config::ENV_API_KEY));
    }

    #[test]
    fn test_primary_key_is_ok() {
        let check = api_key_check(&provider(&[(config::ENV_API_KEY, "sk-test")]));
        assert_eq!(check.status, CheckStatus::Ok);
        assert!(!check.message.contains("sk-test"));
    }
}
