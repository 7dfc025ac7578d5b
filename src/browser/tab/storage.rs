//! Cookie methods.

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, Cookie, PartialCookie, StorageCommand};

use super::Tab;

// ============================================================================
// Tab - Storage (Cookies)
// ============================================================================

impl Tab {
    /// Reads every cookie in the browser's default user context.
    pub async fn get_all_cookies(&self) -> Result<Vec<Cookie>> {
        let result = self
            .send_command(Command::Storage(StorageCommand::GetCookies {}))
            .await?;

        let cookies = result.get("cookies").cloned().unwrap_or(Value::Null);
        let cookies: Vec<Cookie> = match cookies {
            Value::Null => Vec::new(),
            other => serde_json::from_value(other)
                .map_err(|e| Error::protocol(format!("Malformed cookie list: {e}")))?,
        };

        debug!(count = cookies.len(), "Got cookies");
        Ok(cookies)
    }

    /// Writes a cookie into the browser.
    pub async fn set_cookie(&self, cookie: PartialCookie) -> Result<()> {
        debug!(name = %cookie.name, domain = %cookie.domain, "Setting cookie");

        self.send_command(Command::Storage(StorageCommand::SetCookie { cookie }))
            .await?;
        Ok(())
    }
}
