//! Hot patching of the paused script.

use crate::inspector::protocol::{ScriptId, SetScriptSourceResult};
use crate::inspector::rpc::Connection;
use crate::inspector::{Error, Session};
use crate::bi_info;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

/// Status reported by the runtime for a successfully applied patch.
const STATUS_OK: &str = "Ok";

#[derive(Debug, Clone, PartialEq)]
pub enum ReloadOutcome {
    Applied {
        status: String,
        /// The call stack was restarted, user may need to step out/in.
        stack_changed: bool,
    },
    /// Runtime refused the new source (syntax error, unsupported live edit).
    Rejected(String),
}

impl<C: Connection> Session<C> {
    /// Replace the source of a script with `source`.
    pub fn set_script_source(
        &mut self,
        script_id: &ScriptId,
        source: &str,
    ) -> Result<ReloadOutcome, Error> {
        let result: SetScriptSourceResult = self.call_as(
            "Debugger.setScriptSource",
            json!({
                "scriptId": script_id,
                "scriptSource": source,
            }),
        )?;

        if let Some(exception) = result.exception_details {
            let line = exception.line_number + 1;
            return Ok(ReloadOutcome::Rejected(format!(
                "{} (line {line})",
                exception.description()
            )));
        }

        match result.status {
            Some(status) if status != STATUS_OK => Ok(ReloadOutcome::Rejected(status)),
            status => Ok(ReloadOutcome::Applied {
                status: status.unwrap_or_else(|| STATUS_OK.to_string()),
                stack_changed: result.stack_changed,
            }),
        }
    }

    /// Read a source file of the paused script from disk and submit it as a replacement.
    pub fn reload(&mut self) -> Result<(PathBuf, ReloadOutcome), Error> {
        let ctx = self.pause_context()?;
        let (Some(file), script_id) = (ctx.file.clone(), ctx.script_id.clone()) else {
            return Err(Error::NothingToReload);
        };
        if script_id.0.is_empty() {
            return Err(Error::NothingToReload);
        }

        let source = fs::read_to_string(&file).map_err(|e| Error::SourceFile(file.clone(), e))?;
        bi_info!(target: "inspector", "reload {}", file.display());

        let outcome = self.set_script_source(&script_id, &source)?;
        Ok((file, outcome))
    }
}
