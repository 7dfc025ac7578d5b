//! JavaScript execution methods.

use serde_json::Value;
use tracing::trace;

use crate::error::Result;
use crate::protocol::{Command, ScriptCommand, Target, remote};

use super::Tab;

// ============================================================================
// Tab - Script Execution
// ============================================================================

impl Tab {
    /// Evaluates an expression in the page and returns it as plain JSON.
    ///
    /// Promises are awaited. Nodes come back as `{"sharedId": ...}`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let title = tab.evaluate("document.title").await?;
    /// ```
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        let remote_value = self.evaluate_raw(expression).await?;
        Ok(remote::to_json(&remote_value))
    }

    /// Evaluates an expression and returns the untouched `RemoteValue`.
    pub(crate) async fn evaluate_raw(&self, expression: &str) -> Result<Value> {
        trace!(context = %self.inner.context, len = expression.len(), "Evaluating script");

        let command = Command::Script(ScriptCommand::Evaluate {
            expression: expression.to_string(),
            target: self.target(),
            await_promise: true,
        });

        remote::unwrap_evaluate_result(self.send_command(command).await?)
    }

    /// Calls a function declaration with `LocalValue` arguments, returning
    /// plain JSON.
    pub async fn call_function(&self, declaration: &str, arguments: Vec<Value>) -> Result<Value> {
        let remote_value = self.call_function_raw(declaration, arguments).await?;
        Ok(remote::to_json(&remote_value))
    }

    /// Calls a function declaration and returns the untouched `RemoteValue`.
    pub(crate) async fn call_function_raw(
        &self,
        declaration: &str,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        trace!(context = %self.inner.context, args = arguments.len(), "Calling function");

        let command = Command::Script(ScriptCommand::CallFunction {
            function_declaration: declaration.to_string(),
            arguments,
            target: self.target(),
            await_promise: true,
        });

        remote::unwrap_evaluate_result(self.send_command(command).await?)
    }

    /// Realm target for this tab.
    fn target(&self) -> Target {
        Target {
            context: self.inner.context.clone(),
        }
    }
}
