//! Pause event handling: script registry, frame selection and the live pause context.

use crate::inspector::protocol::{CallFrame, CallFrameId, PausedEvent, Scope, ScopeKind, ScriptId};
use crate::inspector::Error;
use std::collections::HashMap;
use std::path::PathBuf;

/// Mapping from script id to its source url, filled while the runtime parses scripts.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    scripts: HashMap<ScriptId, String>,
}

impl ScriptRegistry {
    /// Remember script url. Registry is append-only, first reported url wins.
    pub fn register(&mut self, id: ScriptId, url: String) {
        self.scripts.entry(id).or_insert(url);
    }

    pub fn url(&self, id: &ScriptId) -> Option<&str> {
        self.scripts.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Place where the debugee stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct PauseContext {
    /// Number of a pause this context belongs to.
    pub epoch: u64,
    pub call_frame_id: CallFrameId,
    pub script_id: ScriptId,
    pub function_name: String,
    /// Path of a source file if url of the script points to a local file.
    pub file: Option<PathBuf>,
    pub url: String,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// Scopes, innermost first.
    pub scope_chain: Vec<Scope>,
}

impl PauseContext {
    /// Scopes whose variables are visible at the pause location, global scope excluded.
    pub fn local_scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scope_chain
            .iter()
            .take_while(|scope| scope.kind != ScopeKind::Global)
    }

    /// Human-readable location: file path or url and line number.
    pub fn location(&self) -> String {
        let source = self
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| self.url.clone());
        format!("{source}:{}", self.line)
    }
}

/// Return frame where user code called the pause trigger: a frame immediately after trigger
/// function frame. If there is no such frame the first reported frame is used.
pub fn select_frame<'a>(frames: &'a [CallFrame], trigger: &str) -> Option<&'a CallFrame> {
    frames
        .iter()
        .position(|frame| frame.function_name == trigger)
        .and_then(|trigger_pos| frames.get(trigger_pos + 1))
        .or_else(|| frames.first())
}

/// Convert script url into a local path.
/// Urls with a `file` scheme are converted, plain paths are taken as is,
/// any other scheme (`node:internal/..`, `http://..`) has no local path.
pub fn url_to_path(script_url: &str) -> Option<PathBuf> {
    if script_url.is_empty() {
        return None;
    }

    match url::Url::parse(script_url) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        // windows drive letters are parsed as a single letter scheme
        Ok(url) if url.scheme().len() > 1 => None,
        _ => Some(PathBuf::from(script_url)),
    }
}

/// Turns pause events into [`PauseContext`], at most one context is alive.
#[derive(Debug)]
pub struct PauseController {
    trigger: String,
    epoch: u64,
    current: Option<PauseContext>,
}

impl PauseController {
    /// Create controller, `trigger` is a name of the function that requests a pause.
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            epoch: 0,
            current: None,
        }
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Number of pause events seen so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current(&self) -> Option<&PauseContext> {
        self.current.as_ref()
    }

    /// Build a new context from pause event, previous context is replaced.
    pub fn on_pause(
        &mut self,
        event: PausedEvent,
        scripts: &ScriptRegistry,
    ) -> Result<&PauseContext, Error> {
        self.current = None;

        let frame = select_frame(&event.call_frames, &self.trigger).ok_or(Error::EmptyStack)?;
        let url = if frame.url.is_empty() {
            scripts
                .url(&frame.location.script_id)
                .unwrap_or_default()
                .to_string()
        } else {
            frame.url.clone()
        };

        self.epoch += 1;
        let ctx = PauseContext {
            epoch: self.epoch,
            call_frame_id: frame.call_frame_id.clone(),
            script_id: frame.location.script_id.clone(),
            function_name: frame.function_name.clone(),
            file: url_to_path(&url),
            url,
            line: frame.location.line_number + 1,
            column: frame.location.column_number + 1,
            scope_chain: frame.scope_chain.clone(),
        };

        Ok(self.current.insert(ctx))
    }

    /// Drop current context, its call frame id is useless after resume.
    pub fn invalidate(&mut self) {
        self.current = None;
    }
}
