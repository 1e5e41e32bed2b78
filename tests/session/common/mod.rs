use breakin::inspector::rpc::{Connection, Transport};
use breakin::inspector::{Error, EventHook, PauseContext, Session};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

pub const TRIGGER: &str = "pauseHere";
pub const SCRIPT_ID: &str = "42";
pub const CALLER_FRAME: &str = "frame-caller";

/// Message produced by a mock runtime in response to a request.
pub enum Reply {
    Result(Value),
    Error(&'static str),
    Event(&'static str, Value),
}

type Responder = Box<dyn FnMut(&str, &Value) -> Vec<Reply>>;

/// Requests received by a mock runtime.
#[derive(Clone, Default)]
pub struct RequestLog(Rc<RefCell<Vec<(String, Value)>>>);

impl RequestLog {
    pub fn methods(&self) -> Vec<String> {
        self.0.borrow().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn params_of(&self, method: &str) -> Vec<Value> {
        self.0
            .borrow()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.params_of(method).len()
    }
}

/// Scripted runtime: every request is answered by a responder, connection is considered
/// closed when there is nothing left to read.
pub struct MockConnection {
    log: RequestLog,
    inbox: VecDeque<String>,
    responder: Responder,
}

impl MockConnection {
    pub fn new(responder: impl FnMut(&str, &Value) -> Vec<Reply> + 'static) -> (Self, RequestLog) {
        let log = RequestLog::default();
        let conn = Self {
            log: log.clone(),
            inbox: VecDeque::new(),
            responder: Box::new(responder),
        };
        (conn, log)
    }
}

impl Connection for MockConnection {
    fn send(&mut self, frame: &str) -> Result<(), Error> {
        let request: Value = serde_json::from_str(frame).unwrap();
        let id = request["id"].as_u64().unwrap();
        let method = request["method"].as_str().unwrap().to_string();
        let params = request["params"].clone();
        self.log.0.borrow_mut().push((method.clone(), params.clone()));

        for reply in (self.responder)(&method, &params) {
            let message = match reply {
                Reply::Result(result) => json!({"id": id, "result": result}),
                Reply::Error(message) => {
                    json!({"id": id, "error": {"code": -32000, "message": message}})
                }
                Reply::Event(method, params) => json!({"method": method, "params": params}),
            };
            self.inbox.push_back(message.to_string());
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<Option<String>, Error> {
        self.inbox.pop_front().map(Some).ok_or(Error::ConnectionClosed)
    }
}

#[derive(Clone, Default)]
pub struct TestInfo {
    /// (epoch, line, first) of every pause.
    pub pauses: Rc<RefCell<Vec<(u64, u32, bool)>>>,
    pub resumes: Rc<RefCell<usize>>,
}

#[derive(Default)]
pub struct TestHooks {
    info: TestInfo,
}

impl TestHooks {
    pub fn new(info: TestInfo) -> Self {
        Self { info }
    }
}

impl EventHook for TestHooks {
    fn on_pause(&self, ctx: &PauseContext, first: bool) -> anyhow::Result<()> {
        self.info
            .pauses
            .borrow_mut()
            .push((ctx.epoch, ctx.line, first));
        Ok(())
    }

    fn on_resume(&self) -> anyhow::Result<()> {
        *self.info.resumes.borrow_mut() += 1;
        Ok(())
    }
}

pub fn scope(kind: &str, object_id: &str) -> Value {
    json!({"type": kind, "object": {"type": "object", "objectId": object_id}})
}

pub fn frame(id: &str, function: &str, url: &str, line: u32, scopes: Vec<Value>) -> Value {
    json!({
        "callFrameId": id,
        "functionName": function,
        "location": {"scriptId": SCRIPT_ID, "lineNumber": line, "columnNumber": 4},
        "url": url,
        "scopeChain": scopes,
    })
}

pub fn default_scopes() -> Vec<Value> {
    vec![
        scope("local", "scope-local"),
        scope("closure", "scope-closure"),
        scope("global", "scope-global"),
    ]
}

/// Stack of a `handler` function paused by a trigger call at line 10 (0-based 9).
pub fn paused_in(url: &str, scopes: Vec<Value>) -> Value {
    json!({
        "reason": "other",
        "callFrames": [
            frame("frame-trigger", TRIGGER, "file:///srv/breakin.js", 2, vec![]),
            frame(CALLER_FRAME, "handler", url, 9, scopes),
            frame("frame-main", "main", url, 30, vec![]),
        ],
    })
}

/// Runtime that pauses as soon as the client lets it run, other requests are delegated
/// to `responder` (unanswered requests get an empty result).
pub fn paused_runtime(
    pause: Value,
    mut responder: impl FnMut(&str, &Value) -> Option<Vec<Reply>> + 'static,
) -> impl FnMut(&str, &Value) -> Vec<Reply> + 'static {
    move |method, params| {
        if let Some(replies) = responder(method, params) {
            return replies;
        }
        match method {
            "Runtime.runIfWaitingForDebugger" => vec![
                Reply::Result(json!({})),
                Reply::Event("Debugger.paused", pause.clone()),
            ],
            "Debugger.resume" => vec![
                Reply::Result(json!({})),
                Reply::Event("Debugger.resumed", json!({})),
            ],
            _ => vec![Reply::Result(json!({}))],
        }
    }
}

/// Open a session and wait for the first pause.
pub fn paused_session(
    responder: impl FnMut(&str, &Value) -> Vec<Reply> + 'static,
) -> (Session<MockConnection>, RequestLog, TestInfo) {
    let (conn, log) = MockConnection::new(responder);
    let info = TestInfo::default();
    let mut session = Session::new(Transport::new(conn), TRIGGER, TestHooks::new(info.clone()));
    session.open().unwrap();
    session.wait_for_pause().unwrap();
    (session, log, info)
}
