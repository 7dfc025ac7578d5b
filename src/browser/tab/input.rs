//! Keyboard input.

use tracing::debug;

use crate::error::Result;
use crate::protocol::{Command, InputCommand};

use super::Tab;

impl Tab {
    /// Presses and releases a key in the focused element.
    ///
    /// `key` is a WebDriver key value such as [`crate::protocol::KEY_ENTER`].
    pub async fn press_key(&self, key: &str) -> Result<()> {
        debug!(context = %self.inner.context, "Pressing key");

        let command = Command::Input(InputCommand::key_press(self.inner.context.clone(), key));
        self.send_command(command).await?;
        Ok(())
    }
}
