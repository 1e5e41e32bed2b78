//! Inspector session: a single debug connection to a paused runtime.
//!
//! [`Session`] owns the [`rpc::Transport`], the [`pause::ScriptRegistry`] and the
//! [`pause::PauseController`]. Unsolicited events are routed through a method name -> handler
//! table that is built when a session is created. Events are never applied in the middle of a
//! request: they are queued by the transport and dispatched with [`Session::dispatch_events`],
//! so a command always runs against the pause context it started with.

mod error;
pub mod evaluate;
pub mod patch;
pub mod pause;
pub mod protocol;
pub mod rpc;
pub mod tracer;
pub mod ws;

pub use error::Error;
pub use evaluate::Evaluation;
pub use patch::ReloadOutcome;
pub use pause::PauseContext;

use crate::inspector::pause::{PauseController, ScriptRegistry};
use crate::inspector::protocol::{PausedEvent, ScriptParsedEvent};
use crate::inspector::rpc::{Connection, ConnectionState, Transport};
use crate::{bi_debug, bi_info, bi_warn};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub const DEFAULT_TRIGGER: &str = "pauseHere";

/// Observer of session level events.
pub trait EventHook {
    /// Called when the debugee stops. `first` is true for the very first pause of a session.
    fn on_pause(&self, ctx: &PauseContext, first: bool) -> anyhow::Result<()>;
    /// Called when the debugee resumes execution.
    fn on_resume(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no pause seen yet.
    Waiting,
    Paused,
    /// Debugee continues execution, session is over.
    Resumed,
    Closed,
}

type EventHandler<C> = fn(&mut Session<C>, Value) -> Result<(), Error>;

pub struct Session<C: Connection> {
    transport: Transport<C>,
    scripts: ScriptRegistry,
    pause: PauseController,
    hooks: Box<dyn EventHook>,
    handlers: HashMap<&'static str, EventHandler<C>>,
    state: SessionState,
}

impl<C: Connection> Session<C> {
    /// Create a session over a transport, `trigger` is a name of the pause trigger function.
    pub fn new(transport: Transport<C>, trigger: &str, hooks: impl EventHook + 'static) -> Self {
        let mut handlers: HashMap<&'static str, EventHandler<C>> = HashMap::new();
        handlers.insert("Debugger.scriptParsed", Self::on_script_parsed);
        handlers.insert("Debugger.paused", Self::on_paused);
        handlers.insert("Debugger.resumed", Self::on_resumed);

        Self {
            transport,
            scripts: ScriptRegistry::default(),
            pause: PauseController::new(trigger),
            hooks: Box::new(hooks),
            handlers,
            state: SessionState::Waiting,
        }
    }

    /// Resume the debugee each time the `flag` is raised.
    pub fn set_interrupt(&mut self, flag: Arc<AtomicBool>) {
        self.transport.set_interrupt(flag, "Debugger.resume");
    }

    /// Enable debugger and runtime notifications and let the debugee proceed
    /// if it waits for a client.
    pub fn open(&mut self) -> Result<(), Error> {
        self.transport.open();
        for method in [
            "Debugger.enable",
            "Runtime.enable",
            "Runtime.runIfWaitingForDebugger",
        ] {
            self.transport.notify(method, json!({}))?;
        }
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    /// Number of pauses seen so far.
    pub fn epoch(&self) -> u64 {
        self.pause.epoch()
    }

    /// Return the current pause context.
    pub fn pause_context(&self) -> Result<&PauseContext, Error> {
        self.pause.current().ok_or(Error::NotPaused)
    }

    /// Send a request and wait for its result.
    pub fn call(&mut self, method: &str, params: Value) -> Result<Value, Error> {
        match self.transport.call(method, params) {
            Err(Error::ConnectionClosed) => {
                self.pause.invalidate();
                self.state = SessionState::Closed;
                Err(Error::ConnectionClosed)
            }
            result => result,
        }
    }

    /// Send a request and deserialize its result.
    pub fn call_as<T: DeserializeOwned>(&mut self, method: &str, params: Value) -> Result<T, Error> {
        let result = self.call(method, params)?;
        Ok(serde_json::from_value(result)?)
    }

    /// Apply all queued events.
    pub fn dispatch_events(&mut self) -> Result<(), Error> {
        while let Some(event) = self.transport.next_event() {
            let Some(handler) = self.handlers.get(event.method.as_str()).copied() else {
                bi_debug!(target: "inspector", "skip event {}", event.method);
                continue;
            };

            if let Err(e) = handler(self, event.params) {
                if e.is_fatal() {
                    return Err(e);
                }
                bi_warn!(target: "inspector", "handle {}: {e:#}", event.method);
            }
        }
        Ok(())
    }

    /// Read messages until the debugee pauses.
    pub fn wait_for_pause(&mut self) -> Result<(), Error> {
        loop {
            self.dispatch_events()?;
            match self.state {
                SessionState::Paused => return Ok(()),
                SessionState::Resumed | SessionState::Closed => return Err(Error::ConnectionClosed),
                SessionState::Waiting => {}
            }
            if let Err(e) = self.transport.poll() {
                self.state = SessionState::Closed;
                return Err(e);
            }
        }
    }

    /// Resume the debugee and wait until the runtime confirms it.
    /// A connection closed by the runtime counts as confirmation.
    pub fn resume(&mut self) -> Result<(), Error> {
        match self.call("Debugger.resume", json!({})) {
            Ok(_) => {}
            Err(Error::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        }

        loop {
            self.dispatch_events()?;
            if self.state != SessionState::Paused {
                return Ok(());
            }
            match self.transport.poll() {
                Ok(_) => {}
                Err(Error::ConnectionClosed) => {
                    self.pause.invalidate();
                    self.state = SessionState::Closed;
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn close(&mut self) {
        self.transport.close();
        self.pause.invalidate();
        self.state = SessionState::Closed;
    }

    fn on_script_parsed(&mut self, params: Value) -> Result<(), Error> {
        let event: ScriptParsedEvent = serde_json::from_value(params)?;
        if !event.url.is_empty() {
            self.scripts.register(event.script_id, event.url);
        }
        Ok(())
    }

    fn on_paused(&mut self, params: Value) -> Result<(), Error> {
        let event: PausedEvent = serde_json::from_value(params)?;
        let ctx = self.pause.on_pause(event, &self.scripts)?;
        self.state = SessionState::Paused;

        bi_info!(target: "inspector", "paused at {}", ctx.location());
        self.hooks
            .on_pause(ctx, ctx.epoch == 1)
            .map_err(Error::Hook)
    }

    fn on_resumed(&mut self, _: Value) -> Result<(), Error> {
        if self.state != SessionState::Paused {
            bi_debug!(target: "inspector", "resume without pause");
            return Ok(());
        }

        self.pause.invalidate();
        self.state = SessionState::Resumed;
        self.hooks.on_resume().map_err(Error::Hook)
    }
}

impl<C: Connection> Drop for Session<C> {
    fn drop(&mut self) {
        if self.transport.state() != ConnectionState::Closed {
            self.transport.close();
        }
    }
}
