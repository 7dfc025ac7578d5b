//! Generation state machine.
//!
//! ```text
//! Start → NavigateHome → CheckAuth ─┬─ sign-in page ──────────────→ Failed(Unauthenticated)
//!                                   └→ ActivateImageMode → LocateInput ─┬─ no input → Failed(ElementNotFound)
//!                                                                       └→ SubmitPrompt → Poll ─┬─ refusal → Failed(GenerationDeclined)
//!                                                                                               ├─ deadline → Failed(TimedOut)
//!                                                                                               └→ ImageFound → Extract → Done
//! ```
//!
//! [`drive`] runs the machine against any [`Page`]; it never returns an
//! error, every fault ends in [`GenerationState::Failed`].
//! [`GenerationOrchestrator::run`] wraps it with the saved-session check and
//! the browser lifecycle.

// ============================================================================
// Imports
// ============================================================================

use std::time::{Duration, SystemTime};

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use url::Url;

use crate::artifact::ArtifactExtractor;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::page::{Page, PageElement};
use crate::resolver::{ElementResolver, LogicalTarget};
use crate::session::{AuthVerifier, BrowserSession, SessionRecord, SessionStore};

use super::refusal::{RESPONSE_CONTAINERS, find_refusal};
use super::request::{FailureKind, GenerationFailure, GenerationRequest, GenerationResult};
use super::state::GenerationState;

// ============================================================================
// Constants
// ============================================================================

/// Prefix that asks for an image when the mode switch is missing.
pub const IMAGE_DIRECTIVE: &str = "画像を生成してください: ";

/// Interval between progress logs while polling.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(30);

// ============================================================================
// GenerationOrchestrator
// ============================================================================

/// Runs generation requests against the saved session.
#[derive(Debug, Clone)]
pub struct GenerationOrchestrator {
    config: Config,
    store: SessionStore,
    verifier: AuthVerifier,
}

impl GenerationOrchestrator {
    /// Creates an orchestrator using `config`'s data directory.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let store = SessionStore::new(&config);
        Self {
            config,
            store,
            verifier: AuthVerifier::new(),
        }
    }

    /// The session store in use.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Generates one image.
    ///
    /// No browser is launched unless the saved session verifies. The browser
    /// is closed on every path.
    pub async fn run(&self, request: &GenerationRequest) -> GenerationResult {
        let record = self.store.load();
        let verdict = self.verifier.verify(record.as_ref(), SystemTime::now());
        if !verdict.authenticated {
            info!(reason = %verdict.reason, "Saved session is not usable");
            return GenerationResult::failure(
                FailureKind::Unauthenticated,
                format!(
                    "Not signed in ({}); run `gemini-image auth setup` first",
                    verdict.reason
                ),
            );
        }

        let launched = BrowserSession::launch(&self.config, &self.store, request.show_ui()).await;
        let session = match launched {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Browser session could not start");
                return GenerationResult::Failure(GenerationFailure::from_error(&e));
            }
        };

        let result = drive(session.current_page(), request, &self.config).await;

        if result.is_success() {
            self.refresh_record(&session).await;
        }

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser");
        }
        result
    }

    /// Replaces the saved record with the live cookies, if they still verify.
    async fn refresh_record(&self, session: &BrowserSession) {
        let cookies = match session.cookies().await {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!(error = %e, "Could not read cookies to refresh session");
                return;
            }
        };

        let record = SessionRecord::from_cookies(cookies);
        if !self.verifier.verify(Some(&record), SystemTime::now()).authenticated {
            debug!("Live cookies do not verify; keeping saved session");
            return;
        }

        if let Err(e) = self.store.save(&record) {
            warn!(error = %e, "Failed to refresh saved session");
        }
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// Runs one generation on `page`.
pub async fn drive<P: Page>(page: &P, request: &GenerationRequest, config: &Config) -> GenerationResult {
    let machine = Machine {
        page,
        resolver: ElementResolver::new(page),
        request,
        config,
    };

    let mut state = GenerationState::Start;
    loop {
        let from = state.name();
        let next = machine.step(state).await;
        debug!(from, to = next.name(), "Generation step");

        state = match next {
            GenerationState::Done(artifact) => return GenerationResult::Success(artifact),
            GenerationState::Failed(failure) => {
                info!(kind = %failure.kind, message = %failure.message, "Generation failed");
                return GenerationResult::Failure(failure);
            }
            next => next,
        };
    }
}

struct Machine<'a, P: Page> {
    page: &'a P,
    resolver: ElementResolver<'a, P>,
    request: &'a GenerationRequest,
    config: &'a Config,
}

impl<P: Page> Machine<'_, P> {
    /// The transition function.
    async fn step(&self, state: GenerationState<P::Element>) -> GenerationState<P::Element> {
        match state {
            GenerationState::Start => GenerationState::NavigateHome,
            GenerationState::NavigateHome => self.navigate_home().await,
            GenerationState::CheckAuth => self.check_auth().await,
            GenerationState::ActivateImageMode => self.activate_image_mode().await,
            GenerationState::LocateInput { prompt } => self.locate_input(prompt).await,
            GenerationState::SubmitPrompt { prompt, input } => {
                self.submit(prompt, input.element()).await
            }
            GenerationState::Poll { submitted } => self.poll(&submitted).await,
            GenerationState::ImageFound(image) => {
                info!(matcher = %image.matcher(), "Generated image found");
                GenerationState::Extract(image)
            }
            GenerationState::Extract(image) => {
                match ArtifactExtractor.extract(self.page, image.element()).await {
                    Ok(artifact) => GenerationState::Done(artifact),
                    Err(e) => failed(
                        FailureKind::DownloadError,
                        format!("Image was generated but could not be extracted: {e}"),
                    ),
                }
            }
            terminal @ (GenerationState::Done(_) | GenerationState::Failed(_)) => terminal,
        }
    }

    async fn navigate_home(&self) -> GenerationState<P::Element> {
        let timing = self.config.timing();

        if let Err(e) = self.page.goto(self.config.app_url().as_str()).await {
            return browser_failure("Could not open the application", &e);
        }
        sleep(timing.settle_delay).await;

        let chat_url = self.config.chat_url();
        let current = self.page.current_url().await.unwrap_or_default();
        if !is_fresh_chat(&current, &chat_url) {
            debug!(url = %current, "Opening a new chat");
            if let Err(e) = self.page.goto(chat_url.as_str()).await {
                return browser_failure("Could not open a new chat", &e);
            }
            sleep(timing.settle_delay).await;
        }

        GenerationState::CheckAuth
    }

    async fn check_auth(&self) -> GenerationState<P::Element> {
        match self.page.current_url().await {
            Ok(url) if is_sign_in_url(&url) => failed(
                FailureKind::Unauthenticated,
                "Redirected to Google sign-in; run `gemini-image auth setup` again",
            ),
            Ok(_) => GenerationState::ActivateImageMode,
            Err(e) => browser_failure("Could not read the page URL", &e),
        }
    }

    async fn activate_image_mode(&self) -> GenerationState<P::Element> {
        let prompt = self.request.prompt();

        if let Some(switch) = self.resolver.resolve(LogicalTarget::ImageModeSwitch).await {
            match switch.element().click().await {
                Ok(()) => {
                    info!("Image mode activated");
                    sleep(self.config.timing().mode_switch_delay).await;
                    return GenerationState::LocateInput {
                        prompt: prompt.to_string(),
                    };
                }
                Err(e) => warn!(error = %e, "Image mode switch could not be clicked"),
            }
        } else {
            warn!("Image mode switch not found; asking for an image in the prompt");
        }

        GenerationState::LocateInput {
            prompt: format!("{IMAGE_DIRECTIVE}{prompt}"),
        }
    }

    async fn locate_input(&self, prompt: String) -> GenerationState<P::Element> {
        match self.resolver.resolve(LogicalTarget::PromptInput).await {
            Some(input) => GenerationState::SubmitPrompt { prompt, input },
            None => failed(
                FailureKind::ElementNotFound,
                "Prompt input not found; the page layout may have changed",
            ),
        }
    }

    async fn submit(&self, prompt: String, input: &P::Element) -> GenerationState<P::Element> {
        if let Err(e) = input.click().await {
            return input_failure("click", &e);
        }
        sleep(self.config.timing().input_delay()).await;
        if let Err(e) = input.fill(&prompt).await {
            return input_failure("fill", &e);
        }

        let sent = match self.resolver.resolve(LogicalTarget::SendControl).await {
            Some(send) => match send.element().click().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Send control could not be clicked");
                    false
                }
            },
            None => {
                warn!("Send control not found; pressing Enter");
                false
            }
        };

        if !sent && let Err(e) = input.press_enter().await {
            return input_failure("submit", &e);
        }

        info!(chars = prompt.chars().count(), "Prompt submitted");
        GenerationState::Poll { submitted: prompt }
    }

    async fn poll(&self, submitted: &str) -> GenerationState<P::Element> {
        let interval = self.config.timing().poll_interval;
        let timeout = self.request.timeout();
        let started = Instant::now();
        // `None` when the timeout is past the clock's range: wait indefinitely.
        let deadline = started.checked_add(timeout);
        let mut next_progress = started + PROGRESS_INTERVAL;
        let echoes = [submitted, self.request.prompt()];

        loop {
            if let Some(image) = self.resolver.resolve(LogicalTarget::GeneratedImage).await {
                return GenerationState::ImageFound(image);
            }

            match response_text(self.page).await {
                Ok(text) => {
                    if let Some(phrase) = find_refusal(&text, &echoes) {
                        return failed(
                            FailureKind::GenerationDeclined,
                            format!("Gemini declined to generate the image (matched {phrase:?})"),
                        );
                    }
                }
                Err(e) if e.is_connection_error() => {
                    return browser_failure("Lost the browser while waiting", &e);
                }
                Err(e) => debug!(error = %e, "Could not read the reply"),
            }

            let now = Instant::now();
            if deadline.is_some_and(|deadline| now >= deadline) {
                return failed(
                    FailureKind::TimedOut,
                    format!("No image after {}s", timeout.as_secs()),
                );
            }
            if now >= next_progress {
                info!(elapsed_secs = (now - started).as_secs(), "Still waiting for the image");
                next_progress += PROGRESS_INTERVAL;
            }

            sleep(deadline.map_or(interval, |deadline| interval.min(deadline - now))).await;
        }
    }
}

/// Text of the model's replies, empty until the first one renders.
///
/// Only [`RESPONSE_CONTAINERS`] are read; the sidebar and the composer
/// never reach the refusal scan. The first container matcher with nodes wins.
async fn response_text<P: Page>(page: &P) -> Result<String> {
    for matcher in RESPONSE_CONTAINERS {
        let nodes = match page.query_all(matcher).await {
            Ok(nodes) => nodes,
            Err(e) if e.is_connection_error() => return Err(e),
            Err(e) => {
                debug!(%matcher, error = %e, "Reply query failed");
                continue;
            }
        };
        if nodes.is_empty() {
            continue;
        }

        let mut texts = Vec::with_capacity(nodes.len());
        for node in &nodes {
            match node.text().await {
                Ok(text) => texts.push(text),
                Err(e) if e.is_connection_error() => return Err(e),
                Err(e) => debug!(error = %e, "Reply node unreadable"),
            }
        }
        return Ok(texts.join("\n"));
    }
    Ok(String::new())
}

fn failed<E>(kind: FailureKind, message: impl Into<String>) -> GenerationState<E> {
    GenerationState::Failed(GenerationFailure::new(kind, message))
}

fn browser_failure<E>(context: &str, error: &Error) -> GenerationState<E> {
    failed(FailureKind::Browser, format!("{context}: {error}"))
}

fn input_failure<E>(action: &str, error: &Error) -> GenerationState<E> {
    if error.is_stale_reference() {
        failed(
            FailureKind::ElementNotFound,
            format!("Prompt input disappeared before {action}"),
        )
    } else {
        browser_failure(&format!("Could not {action} the prompt input"), error)
    }
}

// ============================================================================
// URL Predicates
// ============================================================================

/// Google's sign-in flow.
#[must_use]
fn is_sign_in_url(url: &str) -> bool {
    url.contains("accounts.google.com") || url.to_lowercase().contains("signin")
}

/// The empty chat page, as opposed to an old conversation or another page.
#[must_use]
fn is_fresh_chat(url: &str, chat_url: &Url) -> bool {
    Url::parse(url).is_ok_and(|parsed| {
        parsed.host_str() == chat_url.host_str()
            && parsed.path().trim_end_matches('/') == chat_url.path().trim_end_matches('/')
    })
}

// ============================================================================
// Tests
// ============================================================================
