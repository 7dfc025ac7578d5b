//! Command-line interface.
//!
//! | Command | Does |
//! |---------|------|
//! | `generate --prompt <P>` | Generates one image and prints the result envelope |
//! | `auth setup` | Opens a visible browser for a manual Google sign-in |
//! | `auth status` | Reports whether the saved session is usable |
//! | `auth clear` | Deletes the saved session and browser profile |
//!
//! Every command prints one JSON object on stdout. Logs go to stderr.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use gemini_image_driver::artifact::Artifact;
use gemini_image_driver::envelope::Envelope;
use gemini_image_driver::generation::{GenerationOrchestrator, GenerationRequest, GenerationResult};
use gemini_image_driver::session::{AuthVerifier, LoginAssistant, SessionStore};
use gemini_image_driver::templating::{PromptTemplater, ReferenceImageTemplater, apply_template};
use gemini_image_driver::{Config, Result};

// ============================================================================
// Arguments
// ============================================================================

/// Generate images with Gemini through a real Firefox session.
#[derive(Parser, Debug)]
#[command(name = "gemini-image", version)]
pub struct Cli {
    /// Directory holding the session, profile and default output
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Firefox binary (defaults to $FIREFOX_BINARY, then `firefox` on PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub firefox: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one image
    Generate(GenerateArgs),

    /// Manage the saved Google session
    #[command(subcommand)]
    Auth(AuthCommand),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// What to draw
    #[arg(short, long)]
    pub prompt: String,

    /// Output file (defaults to a random name in the output directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Seconds to wait for the image after submitting
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub show_browser: bool,

    /// Image whose style the prompt should follow
    #[arg(long, value_name = "IMAGE")]
    pub reference_image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Sign in manually in a visible browser
    Setup {
        /// Minutes to wait for the sign-in
        #[arg(long, value_name = "MINUTES")]
        timeout: Option<u64>,
    },

    /// Show whether the saved session is usable
    Status,

    /// Delete the saved session and browser profile
    Clear,
}

impl Cli {
    /// Configuration from flags, then environment, then defaults.
    ///
    /// # Errors
    ///
    /// Returns configuration validation errors.
    pub fn config(&self) -> Result<Config> {
        let mut builder = Config::builder();
        if let Some(dir) = &self.data_dir {
            builder = builder.data_dir(dir);
        }
        if let Some(binary) = &self.firefox {
            builder = builder.firefox_binary(binary);
        }
        builder.from_env().build()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Runs the parsed command; returns the process exit code.
pub async fn run(cli: Cli) -> i32 {
    let config = match cli.config() {
        Ok(config) => config,
        Err(e) => return emit_envelope(&Envelope::error(e.to_string())),
    };

    match cli.command {
        Command::Generate(args) => generate(&config, args).await,
        Command::Auth(AuthCommand::Setup { timeout }) => {
            let timeout = timeout.map_or(config.login_timeout(), minutes);
            auth_setup(&config, timeout).await
        }
        Command::Auth(AuthCommand::Status) => auth_status(&config),
        Command::Auth(AuthCommand::Clear) => auth_clear(&config),
    }
}

/// `m` minutes, saturating at [`Duration::MAX`].
fn minutes(m: u64) -> Duration {
    m.checked_mul(60).map_or(Duration::MAX, Duration::from_secs)
}

// ============================================================================
// generate
// ============================================================================

async fn generate(config: &Config, args: GenerateArgs) -> i32 {
    let templater = args.reference_image.as_ref().map(ReferenceImageTemplater::new);
    let prompt = apply_template(
        templater.as_ref().map(|t| t as &dyn PromptTemplater),
        &args.prompt,
    );

    let timeout = args
        .timeout
        .map_or(config.default_timeout(), Duration::from_secs);
    let request = match GenerationRequest::new(prompt, timeout, args.show_browser) {
        Ok(request) => request,
        Err(e) => return emit_envelope(&Envelope::error(e.to_string())),
    };

    let envelope = match GenerationOrchestrator::new(config.clone()).run(&request).await {
        GenerationResult::Success(artifact) => {
            let path = args
                .output
                .unwrap_or_else(|| default_output_path(config.output_dir(), &artifact));
            match write_artifact(&path, &artifact).await {
                Ok(()) => {
                    info!(path = %path.display(), "Image saved");
                    Envelope::success(&path, request.prompt(), &artifact)
                }
                Err(e) => Envelope::error(format!("Could not write {}: {e}", path.display())),
            }
        }
        GenerationResult::Failure(failure) => Envelope::failure(&failure),
    };

    emit_envelope(&envelope)
}

/// `<dir>/<12 hex chars>.<ext>`.
fn default_output_path(dir: &Path, artifact: &Artifact) -> PathBuf {
    let id = Uuid::new_v4().simple().to_string();
    dir.join(format!("{}.{}", &id[..12], artifact.extension()))
}

async fn write_artifact(path: &Path, artifact: &Artifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, artifact.bytes()).await?;
    Ok(())
}

// ============================================================================
// auth
// ============================================================================

#[derive(Debug, Serialize)]
struct StatusReport {
    authenticated: bool,
    reason: String,
    cookie_count: usize,
    identity_cookie_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    age_hours: Option<u64>,
    stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_date: Option<String>,
    state_file: PathBuf,
}

async fn auth_setup(config: &Config, timeout: Duration) -> i32 {
    let store = SessionStore::new(config);

    match LoginAssistant::new(config, &store).run(timeout).await {
        Ok(outcome) => {
            let report = serde_json::json!({
                "success": outcome.verdict.authenticated,
                "email": outcome.metadata.email,
                "auth_date": outcome.metadata.auth_date,
                "cookie_count": outcome.verdict.cookie_count,
                "identity_cookie_count": outcome.verdict.identity_cookie_count,
            });
            emit(&report);
            i32::from(!outcome.verdict.authenticated)
        }
        Err(e) => emit_envelope(&Envelope::error(format!("Sign-in failed: {e}"))),
    }
}

fn auth_status(config: &Config) -> i32 {
    let store = SessionStore::new(config);
    let verdict = AuthVerifier::new().verify(store.load().as_ref(), SystemTime::now());

    // Metadata only decorates a positive verdict.
    let metadata = verdict
        .authenticated
        .then(|| store.load_metadata())
        .flatten();

    let report = StatusReport {
        authenticated: verdict.authenticated,
        reason: verdict.reason.to_string(),
        cookie_count: verdict.cookie_count,
        identity_cookie_count: verdict.identity_cookie_count,
        age_hours: verdict.age.map(|age| age.as_secs() / 3600),
        stale: verdict.stale,
        email: metadata.as_ref().map(|m| m.email.clone()),
        auth_date: metadata.map(|m| m.auth_date),
        state_file: store.state_file().to_path_buf(),
    };
    emit(&report);
    i32::from(!verdict.authenticated)
}

fn auth_clear(config: &Config) -> i32 {
    match SessionStore::new(config).clear() {
        Ok(report) => {
            emit(&serde_json::json!({
                "success": true,
                "removed": report.removed_anything(),
                "state_file": report.state_file,
                "metadata_file": report.metadata_file,
                "profile_dir": report.profile_dir,
            }));
            0
        }
        Err(e) => emit_envelope(&Envelope::error(e.to_string())),
    }
}

// ============================================================================
// Output
// ============================================================================

fn emit_envelope(envelope: &Envelope) -> i32 {
    emit(envelope);
    envelope.exit_code()
}

fn emit<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "Could not serialize result"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use gemini_image_driver::artifact::ExtractionTier;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "gemini-image",
            "generate",
            "--prompt",
            "a red fox",
            "--timeout",
            "90",
            "--show-browser",
            "--data-dir",
            "/tmp/gi",
        ])
        .expect("parse");

        assert_eq!(cli.data_dir.as_deref(), Some(Path::new("/tmp/gi")));
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.prompt, "a red fox");
        assert_eq!(args.timeout, Some(90));
        assert!(args.show_browser);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_login_minutes_saturate() {
        assert_eq!(minutes(5), Duration::from_secs(300));
        assert_eq!(minutes(u64::MAX), Duration::MAX);

        let cli = Cli::try_parse_from([
            "gemini-image",
            "auth",
            "setup",
            "--timeout",
            "18446744073709551615",
        ])
        .expect("parse");
        let Command::Auth(AuthCommand::Setup { timeout }) = cli.command else {
            panic!("expected auth setup");
        };
        assert_eq!(timeout.map(minutes), Some(Duration::MAX));
    }

    #[test]
    fn test_parse_auth() {
        let cli = Cli::try_parse_from(["gemini-image", "-v", "auth", "setup", "--timeout", "5"])
            .expect("parse");
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Auth(AuthCommand::Setup { timeout: Some(5) })
        ));

        assert!(Cli::try_parse_from(["gemini-image", "generate"]).is_err());
    }

    #[test]
    fn test_default_output_path() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let artifact = Artifact::new(png.to_vec(), ExtractionTier::Screenshot);

        let path = default_output_path(Path::new("/out"), &artifact);

        assert_eq!(path.parent(), Some(Path::new("/out")));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        let stem = path.file_stem().and_then(|s| s.to_str()).expect("stem");
        assert_eq!(stem.len(), 12);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_write_artifact_creates_parents() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("nested/dir/fox.png");
        let artifact = Artifact::new(vec![1, 2, 3], ExtractionTier::Screenshot);

        write_artifact(&path, &artifact).await.expect("write");

        assert_eq!(std::fs::read(&path).expect("read"), vec![1, 2, 3]);
    }
}
