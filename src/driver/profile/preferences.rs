//! `user.js` preference sets.
//!
//! Firefox reads `user.js` on every start and copies each
//! `user_pref("name", value);` line into `prefs.js`, so rewriting it on
//! launch keeps automation settings pinned even in a long-lived profile.
//!
//! # Example
//!
//! ```
//! use gemini_image_driver::driver::profile::UserPrefs;
//!
//! let prefs = UserPrefs::new()
//!     .set("browser.startup.page", 0)
//!     .set("intl.accept_languages", "ja,en-US");
//!
//! assert!(prefs.render().contains(r#"user_pref("browser.startup.page", 0);"#));
//! ```

// ============================================================================
// Constants
// ============================================================================

/// Preference replacing the `User-Agent` header and `navigator.userAgent`.
pub const USER_AGENT_PREF: &str = "general.useragent.override";

// ============================================================================
// PrefValue
// ============================================================================

/// A preference value: boolean, integer or string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// String value.
    Str(String),
}

impl PrefValue {
    /// JavaScript literal for the value. Strings use JSON escaping.
    #[must_use]
    pub fn to_js(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Str(s) => serde_json::Value::String(s.clone()).to_string(),
        }
    }
}

impl From<bool> for PrefValue {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PrefValue {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PrefValue {
    #[inline]
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for PrefValue {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PrefValue {
    #[inline]
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

// ============================================================================
// UserPrefs
// ============================================================================

/// Ordered preference set; a later `set` of the same key replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPrefs {
    entries: Vec<(String, PrefValue)>,
}

impl UserPrefs {
    /// Creates an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a preference.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Looks up a preference.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PrefValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of preferences.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no preference is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the `user.js` body.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("// Written by gemini-image-driver on every launch\n\n");
        for (key, value) in &self.entries {
            out.push_str(&format!("user_pref(\"{key}\", {});\n", value.to_js()));
        }
        out
    }

    /// Preferences for a persistent profile driven over WebDriver BiDi.
    ///
    /// Login cookies live in this profile, so nothing here clears history,
    /// cookies or site data on shutdown.
    #[must_use]
    pub fn automation_defaults() -> Self {
        Self::new()
            // BiDi only, no CDP
            .set("remote.active-protocols", 1)
            .set("remote.prefs.recommended", true)
            // Quiet startup
            .set("browser.startup.page", 0)
            .set("browser.startup.homepage_override.mstone", "ignore")
            .set("browser.shell.checkDefaultBrowser", false)
            .set("browser.aboutwelcome.enabled", false)
            .set("browser.sessionstore.resume_from_crash", false)
            .set("toolkit.startup.max_resumed_crashes", -1)
            .set("browser.warnOnQuit", false)
            .set("browser.tabs.warnOnClose", false)
            // No password manager prompt over the login form
            .set("signon.rememberSignons", false)
            // No background noise
            .set("app.update.disabledForTesting", true)
            .set("datareporting.policy.dataSubmissionEnabled", false)
            .set("toolkit.telemetry.enabled", false)
            .set("app.normandy.enabled", false)
            .set("browser.newtabpage.enabled", false)
            // Hide navigator.webdriver
            .set("dom.webdriver.enabled", false)
    }

    /// Same set with the user agent overridden when `user_agent` is given.
    #[must_use]
    pub fn with_user_agent(self, user_agent: Option<&str>) -> Self {
        match user_agent {
            Some(agent) => self.set(USER_AGENT_PREF, agent),
            None => self,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_escaping() {
        let value = PrefValue::from(r#"say "hi" \ bye"#);
        assert_eq!(value.to_js(), r#""say \"hi\" \\ bye""#);
    }

    #[test]
    fn test_set_replaces_existing() {
        let prefs = UserPrefs::new().set("a.b", 1).set("a.b", false);
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs.get("a.b"), Some(&PrefValue::Bool(false)));
    }

    #[test]
    fn test_render_lines() {
        let rendered = UserPrefs::new().set("x.y", true).set("x.z", "v").render();
        assert!(rendered.contains("user_pref(\"x.y\", true);\n"));
        assert!(rendered.contains("user_pref(\"x.z\", \"v\");\n"));
    }

    #[test]
    fn test_defaults_enable_bidi() {
        let prefs = UserPrefs::automation_defaults();
        assert_eq!(prefs.get("remote.active-protocols"), Some(&PrefValue::Int(1)));
        assert!(!prefs.is_empty());
    }

    #[test]
    fn test_defaults_hide_webdriver_flag() {
        let prefs = UserPrefs::automation_defaults();
        assert_eq!(prefs.get("dom.webdriver.enabled"), Some(&PrefValue::Bool(false)));
        assert!(prefs.get(USER_AGENT_PREF).is_none());
    }

    #[test]
    fn test_user_agent_override() {
        let agent = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
        let prefs = UserPrefs::automation_defaults().with_user_agent(Some(agent));

        assert_eq!(prefs.get(USER_AGENT_PREF), Some(&PrefValue::from(agent)));
        assert!(prefs.render().contains(&format!(
            "user_pref(\"general.useragent.override\", \"{agent}\");"
        )));
        assert_eq!(
            UserPrefs::new().with_user_agent(None),
            UserPrefs::new()
        );
    }
}
