//! Headless client for the upload form.
//!
//! Runs the same form controller a browser would: validates the file, submits
//! it through the relay (or straight to the backend), saves a returned PDF and
//! prints a JSON result.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use resume_relay::form::cli::{read_file, submit_with_retries, SubmitOptions, SubmitResult};
use resume_relay::form::controller::FormController;
use resume_relay::form::download::DirectorySink;
use resume_relay::form::state::{FormState, Notice, NoticeLevel};
use resume_relay::form::transport::{Endpoint, HttpTransport};

#[derive(Debug, Parser)]
#[command(name = "resume-submit", version, about = "Submit a resume PDF for optimization")]
struct Args {
    /// Resume to upload.
    #[arg(long)]
    file: PathBuf,

    /// Target job role, e.g. "Backend Developer".
    #[arg(long)]
    role: Option<String>,

    /// Free-text instructions (at most 500 characters).
    #[arg(long, default_value = "")]
    instructions: String,

    /// Relay origin.
    #[arg(long, env = "RELAY_URL", default_value = "http://localhost:3000")]
    relay_url: String,

    /// Call the backend at this base URL directly. Takes precedence over `--relay-url`.
    #[arg(long, env = "API_BASE_URL")]
    direct_url: Option<String>,

    /// Allow submitting without a target role.
    #[arg(long)]
    role_optional: bool,

    /// Directory a returned PDF is saved into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// How many times to retry after a failed submission.
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 180)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("resume_relay=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<bool> {
    let endpoint = match &args.direct_url {
        Some(base) => Endpoint::Direct(base.clone()),
        None => Endpoint::Relay(args.relay_url.clone()),
    };
    let transport = HttpTransport::new(&endpoint, Duration::from_secs(args.timeout_secs))
        .context("failed to build HTTP client")?;
    let mut controller = FormController::new(
        FormState::new(!args.role_optional),
        transport,
        DirectorySink::new(&args.out_dir),
    );

    let file = read_file(&args.file).await?;
    let options = SubmitOptions {
        role: args.role,
        instructions: args.instructions,
        retries: args.retries,
    };
    let result = submit_with_retries(&mut controller, file, options, print_notice).await;

    match &result {
        SubmitResult::Rejected(rejection) => eprintln!("{rejection}"),
        SubmitResult::Structured(json) => println!("{}", serde_json::to_string_pretty(json)?),
        SubmitResult::Saved(Some(path)) => println!("{}", path.display()),
        SubmitResult::Saved(None) | SubmitResult::NotSubmitted | SubmitResult::Failed(_) => {}
    }
    Ok(result.is_success())
}

fn print_notice(notice: Notice) {
    match notice.level {
        NoticeLevel::Error => eprintln!("✗ {}", notice.message),
        NoticeLevel::Success => eprintln!("✓ {}", notice.message),
        NoticeLevel::Info => eprintln!("  {}", notice.message),
    }
}
