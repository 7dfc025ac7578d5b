//! In-memory [`Page`] for tests.
//!
//! Nodes can be scheduled to appear at an offset from the moment
//! the page was created, measured on the tokio clock, so paused-clock tests
//! can script a whole generation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::browser::BoundingBox;
use crate::error::{Error, Result};
use crate::protocol::{Cookie, PartialCookie};

use super::{Matcher, Page, PageElement};

// ============================================================================
// Call Log
// ============================================================================

/// Side effects observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Goto(String),
    Click(String),
    Fill(String, String),
    Enter(String),
    Screenshot(String),
    Fetch(String),
    SetCookie(String),
}

type CallLog = Arc<Mutex<Vec<Call>>>;

// ============================================================================
// FakeElement
// ============================================================================

#[derive(Debug, Clone)]
struct ElementSpec {
    name: String,
    visible: bool,
    bbox: Option<BoundingBox>,
    attributes: HashMap<String, String>,
    text: String,
    screenshot: Option<Vec<u8>>,
    stale: bool,
}

/// A scripted node.
#[derive(Debug, Clone)]
pub(crate) struct FakeElement {
    spec: Arc<ElementSpec>,
    log: CallLog,
}

impl FakeElement {
    /// A visible 120x40 node.
    pub(crate) fn visible(name: &str) -> Self {
        Self {
            spec: Arc::new(ElementSpec {
                name: name.to_string(),
                visible: true,
                bbox: Some(BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: 120.0,
                    height: 40.0,
                }),
                attributes: HashMap::new(),
                text: String::new(),
                screenshot: None,
                stale: false,
            }),
            log: CallLog::default(),
        }
    }

    /// A large generated image served from `src`.
    pub(crate) fn image(name: &str, src: &str) -> Self {
        Self::visible(name).with_size(512.0, 512.0).with_attr("src", src)
    }

    pub(crate) fn hidden(self) -> Self {
        self.map(|s| s.visible = false)
    }

    pub(crate) fn with_size(self, width: f64, height: f64) -> Self {
        self.map(|s| {
            s.bbox = Some(BoundingBox {
                x: 0.0,
                y: 0.0,
                width,
                height,
            });
        })
    }

    pub(crate) fn without_box(self) -> Self {
        self.map(|s| s.bbox = None)
    }

    pub(crate) fn with_attr(self, name: &str, value: &str) -> Self {
        self.map(|s| {
            s.attributes.insert(name.to_string(), value.to_string());
        })
    }

    pub(crate) fn with_text(self, text: &str) -> Self {
        self.map(|s| s.text = text.to_string())
    }

    pub(crate) fn with_screenshot(self, png: &[u8]) -> Self {
        self.map(|s| s.screenshot = Some(png.to_vec()))
    }

    /// Every call fails as if the node was detached by a re-render.
    pub(crate) fn stale(self) -> Self {
        self.map(|s| s.stale = true)
    }

    pub(crate) fn name(&self) -> &str {
        &self.spec.name
    }

    fn map(self, f: impl FnOnce(&mut ElementSpec)) -> Self {
        let mut spec = (*self.spec).clone();
        f(&mut spec);
        Self {
            spec: Arc::new(spec),
            log: self.log,
        }
    }

    fn check(&self) -> Result<()> {
        if self.spec.stale {
            Err(Error::remote("no such node", self.spec.name.clone()))
        } else {
            Ok(())
        }
    }

    fn record(&self, call: Call) {
        self.log.lock().push(call);
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn is_visible(&self) -> Result<bool> {
        self.check()?;
        Ok(self.spec.visible)
    }

    async fn bounding_box(&self) -> Result<Option<BoundingBox>> {
        self.check()?;
        Ok(self.spec.bbox)
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.spec.attributes.get(name).cloned())
    }

    async fn text(&self) -> Result<String> {
        self.check()?;
        Ok(self.spec.text.clone())
    }

    async fn click(&self) -> Result<()> {
        self.check()?;
        self.record(Call::Click(self.spec.name.clone()));
        Ok(())
    }

    async fn fill(&self, text: &str) -> Result<()> {
        self.check()?;
        self.record(Call::Fill(self.spec.name.clone(), text.to_string()));
        Ok(())
    }

    async fn press_enter(&self) -> Result<()> {
        self.check()?;
        self.record(Call::Enter(self.spec.name.clone()));
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.check()?;
        self.record(Call::Screenshot(self.spec.name.clone()));
        self.spec
            .screenshot
            .clone()
            .ok_or_else(|| Error::remote("unable to capture screen", "element not rendered"))
    }
}

// ============================================================================
// FakePage
// ============================================================================

struct Scheduled<T> {
    at: Duration,
    item: T,
}

/// A scripted page.
pub(crate) struct FakePage {
    start: Instant,
    url: Mutex<String>,
    redirect: Option<String>,
    elements: HashMap<Matcher, Vec<Scheduled<FakeElement>>>,
    failing: HashSet<Matcher>,
    fetches: HashMap<String, Vec<u8>>,
    jar: Mutex<Vec<PartialCookie>>,
    rejected_cookies: HashSet<String>,
    disconnect_at_cookie: Option<String>,
    log: CallLog,
}

impl FakePage {
    /// An empty page whose clock starts now.
    pub(crate) fn new() -> Self {
        Self {
            start: Instant::now(),
            url: Mutex::new("about:blank".to_string()),
            redirect: None,
            elements: HashMap::new(),
            failing: HashSet::new(),
            fetches: HashMap::new(),
            jar: Mutex::new(Vec::new()),
            rejected_cookies: HashSet::new(),
            disconnect_at_cookie: None,
            log: CallLog::default(),
        }
    }

    /// Every navigation lands on `url` instead.
    pub(crate) fn with_redirect(mut self, url: &str) -> Self {
        self.redirect = Some(url.to_string());
        self
    }

    /// Adds a node matched by `matcher` from the start.
    pub(crate) fn with_element(self, matcher: Matcher, element: FakeElement) -> Self {
        self.with_element_at(matcher, Duration::ZERO, element)
    }

    /// Adds a node matched by `matcher` once `at` has elapsed.
    pub(crate) fn with_element_at(
        mut self,
        matcher: Matcher,
        at: Duration,
        element: FakeElement,
    ) -> Self {
        let element = FakeElement {
            spec: element.spec,
            log: Arc::clone(&self.log),
        };
        self.elements
            .entry(matcher)
            .or_default()
            .push(Scheduled { at, item: element });
        self
    }

    /// Writing the cookie `name` is refused by the browser.
    pub(crate) fn with_rejected_cookie(mut self, name: &str) -> Self {
        self.rejected_cookies.insert(name.to_string());
        self
    }

    /// The connection drops while writing the cookie `name`.
    pub(crate) fn with_disconnect_at_cookie(mut self, name: &str) -> Self {
        self.disconnect_at_cookie = Some(name.to_string());
        self
    }

    /// Queries for `matcher` fail like an invalid selector would.
    pub(crate) fn with_failing_query(mut self, matcher: Matcher) -> Self {
        self.failing.insert(matcher);
        self
    }

    /// In-page downloads of `url` return `bytes`; others fail.
    pub(crate) fn with_fetch(mut self, url: &str, bytes: &[u8]) -> Self {
        self.fetches.insert(url.to_string(), bytes.to_vec());
        self
    }

    /// Snapshot of the side effects so far.
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.log.lock().clone()
    }

    /// Names of the cookies accepted so far, in order.
    pub(crate) fn cookie_names(&self) -> Vec<String> {
        self.jar.lock().iter().map(|c| c.name.clone()).collect()
    }

    /// Texts passed to `fill`, in order.
    pub(crate) fn filled(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Fill(_, text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn elapsed(&self) -> Duration {
        Instant::now().duration_since(self.start)
    }
}

#[async_trait]
impl Page for FakePage {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> Result<()> {
        self.log.lock().push(Call::Goto(url.to_string()));
        let landed = self.redirect.clone().unwrap_or_else(|| url.to_string());
        *self.url.lock() = landed;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.lock().clone())
    }

    async fn query_all(&self, matcher: &Matcher) -> Result<Vec<FakeElement>> {
        if self.failing.contains(matcher) {
            return Err(Error::script_error(format!("invalid selector: {matcher}")));
        }

        let now = self.elapsed();
        Ok(self
            .elements
            .get(matcher)
            .into_iter()
            .flatten()
            .filter(|scheduled| scheduled.at <= now)
            .map(|scheduled| scheduled.item.clone())
            .collect())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.log.lock().push(Call::Fetch(url.to_string()));
        self.fetches
            .get(url)
            .cloned()
            .ok_or_else(|| Error::script_error(format!("TypeError: NetworkError when attempting to fetch {url}")))
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        Ok(self
            .jar
            .lock()
            .iter()
            .map(|c| Cookie {
                name: c.name.clone(),
                value: c.value.clone(),
                domain: c.domain.clone(),
                path: c.path.clone().unwrap_or_else(|| "/".to_string()),
                http_only: c.http_only,
                secure: c.secure,
                same_site: c.same_site.clone(),
                expiry: c.expiry,
            })
            .collect())
    }

    async fn set_cookie(&self, cookie: PartialCookie) -> Result<()> {
        self.log.lock().push(Call::SetCookie(cookie.name.clone()));
        if self.disconnect_at_cookie.as_deref() == Some(cookie.name.as_str()) {
            return Err(Error::ConnectionClosed);
        }
        if self.rejected_cookies.contains(&cookie.name) {
            return Err(Error::remote("unable to set cookie", cookie.name));
        }
        self.jar.lock().push(cookie);
        Ok(())
    }
}
