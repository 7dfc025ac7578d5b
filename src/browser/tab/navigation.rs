//! Tab navigation methods.

use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::protocol::{BrowsingContextCommand, Command, ReadinessState};

use super::Tab;

/// Upper bound for a navigation to reach `DOMContentLoaded`.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// Tab - Navigation
// ============================================================================

impl Tab {
    /// Navigates to a URL and waits for `DOMContentLoaded`.
    ///
    /// # Errors
    ///
    /// Returns an error if navigation fails or times out.
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!(url = %url, context = %self.inner.context, "Navigating");

        let command = Command::BrowsingContext(BrowsingContextCommand::Navigate {
            context: self.inner.context.clone(),
            url: url.to_string(),
            wait: ReadinessState::Interactive,
        });

        self.send_command_with_timeout(command, NAVIGATION_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Gets the current URL.
    pub async fn get_url(&self) -> Result<String> {
        let value = self.evaluate("location.href").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}
