//! Downloads from inside the page.
//!
//! Requests run in the page realm, so they carry the signed-in session's
//! cookies the same way the page's own `<img>` loads do.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, ScriptCommand, Target, remote};

use super::Tab;

/// Upper bound for a single in-page download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetches `url` with credentials, retrying without them when the first
/// attempt fails (CORS rejects credentialed requests to some CDNs), and
/// returns the body as base64.
const FETCH_BASE64: &str = r#"async (url) => {
    const attempt = async (credentials) => {
        const res = await fetch(url, { credentials });
        if (!res.ok) {
            throw new Error('HTTP ' + res.status);
        }
        const buf = new Uint8Array(await res.arrayBuffer());
        let bin = '';
        for (let i = 0; i < buf.length; i += 0x8000) {
            bin += String.fromCharCode.apply(null, buf.subarray(i, i + 0x8000));
        }
        return btoa(bin);
    };
    try {
        return await attempt('include');
    } catch (e) {
        return await attempt('omit');
    }
}"#;

impl Tab {
    /// Downloads `url` from the page's origin and returns the body.
    ///
    /// # Errors
    ///
    /// - [`Error::ScriptError`] if both attempts fail (network or HTTP status)
    /// - [`Error::RequestTimeout`] if the download takes too long
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let command = Command::Script(ScriptCommand::CallFunction {
            function_declaration: FETCH_BASE64.to_string(),
            arguments: vec![remote::local_string(url)],
            target: Target {
                context: self.inner.context.clone(),
            },
            await_promise: true,
        });

        let result = self.send_command_with_timeout(command, FETCH_TIMEOUT).await?;
        let encoded = match remote::to_json(&remote::unwrap_evaluate_result(result)?) {
            Value::String(s) => s,
            _ => return Err(Error::protocol("Fetch returned no body")),
        };

        let bytes = Base64Standard
            .decode(encoded)
            .map_err(|e| Error::protocol(format!("Invalid base64 body: {e}")))?;

        debug!(url, bytes = bytes.len(), "Fetched in page");
        Ok(bytes)
    }
}
