use crate::common::{
    default_scopes, frame, paused_in, paused_runtime, paused_session, MockConnection, Reply,
    TestHooks, TestInfo, CALLER_FRAME, SCRIPT_ID, TRIGGER,
};
use breakin::inspector::protocol::ScopeKind;
use breakin::inspector::rpc::Transport;
use breakin::inspector::{Error, Session, SessionState};
use serde_json::json;
use std::path::PathBuf;

#[test]
fn test_session_open_and_pause() {
    let (session, log, info) =
        paused_session(paused_runtime(paused_in("file:///srv/app.js", default_scopes()), |_, _| None));

    assert_eq!(
        log.methods(),
        vec![
            "Debugger.enable",
            "Runtime.enable",
            "Runtime.runIfWaitingForDebugger"
        ]
    );
    assert_eq!(session.state(), SessionState::Paused);
    assert_eq!(session.epoch(), 1);

    let ctx = session.pause_context().unwrap();
    assert_eq!(ctx.call_frame_id.0, CALLER_FRAME);
    assert_eq!(ctx.script_id.0, SCRIPT_ID);
    assert_eq!(ctx.function_name, "handler");
    assert_eq!(ctx.file, Some(PathBuf::from("/srv/app.js")));
    assert_eq!(ctx.line, 10);
    assert_eq!(ctx.column, 5);
    assert_eq!(ctx.location(), "/srv/app.js:10");

    let kinds: Vec<_> = ctx.local_scopes().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![ScopeKind::Local, ScopeKind::Closure]);

    assert_eq!(*info.pauses.borrow(), vec![(1, 10, true)]);
}

#[test]
fn test_pause_url_from_script_registry() {
    let pause = paused_in("", default_scopes());
    let responder = move |method: &str, _: &serde_json::Value| match method {
        "Runtime.runIfWaitingForDebugger" => vec![
            Reply::Event(
                "Debugger.scriptParsed",
                json!({"scriptId": "7", "url": ""}),
            ),
            Reply::Event(
                "Debugger.scriptParsed",
                json!({"scriptId": SCRIPT_ID, "url": "file:///srv/lib.js"}),
            ),
            Reply::Result(json!({})),
            Reply::Event("Debugger.paused", pause.clone()),
        ],
        _ => vec![Reply::Result(json!({}))],
    };
    let (session, _, _) = paused_session(responder);

    // scripts without url are not registered
    assert_eq!(session.scripts().len(), 1);
    let ctx = session.pause_context().unwrap();
    assert_eq!(ctx.url, "file:///srv/lib.js");
    assert_eq!(ctx.file, Some(PathBuf::from("/srv/lib.js")));
}

#[test]
fn test_pause_without_trigger_frame() {
    let pause = json!({
        "callFrames": [
            frame("frame-0", "tick", "node:internal/timers", 5, vec![]),
            frame("frame-1", "run", "file:///srv/app.js", 1, vec![]),
        ],
    });
    let (session, _, _) = paused_session(paused_runtime(pause, |_, _| None));

    let ctx = session.pause_context().unwrap();
    assert_eq!(ctx.call_frame_id.0, "frame-0");
    assert_eq!(ctx.file, None);
    assert_eq!(ctx.location(), "node:internal/timers:6");
}

#[test]
fn test_empty_stack_pause_is_skipped() {
    let responder = move |method: &str, _: &serde_json::Value| match method {
        "Runtime.runIfWaitingForDebugger" => vec![
            Reply::Result(json!({})),
            Reply::Event("Debugger.paused", json!({"callFrames": []})),
            Reply::Event("Debugger.paused", paused_in("file:///srv/app.js", vec![])),
        ],
        _ => vec![Reply::Result(json!({}))],
    };
    let (session, _, info) = paused_session(responder);

    assert_eq!(session.epoch(), 1);
    assert_eq!(*info.pauses.borrow(), vec![(1, 10, true)]);
}

#[test]
fn test_resume() {
    let (mut session, log, info) =
        paused_session(paused_runtime(paused_in("file:///srv/app.js", default_scopes()), |_, _| None));

    session.resume().unwrap();

    assert_eq!(log.count("Debugger.resume"), 1);
    assert_eq!(session.state(), SessionState::Resumed);
    assert!(matches!(session.pause_context(), Err(Error::NotPaused)));
    assert!(matches!(session.evaluate("1"), Err(Error::NotPaused)));
    assert_eq!(*info.resumes.borrow(), 1);
}

#[test]
fn test_resume_when_runtime_disconnects() {
    let (mut session, _, info) = paused_session(paused_runtime(
        paused_in("file:///srv/app.js", default_scopes()),
        |method, _| (method == "Debugger.resume").then(Vec::new),
    ));

    // closed connection means the debugee is not paused anymore
    session.resume().unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.pause_context().is_err());
    assert_eq!(*info.resumes.borrow(), 0);
}

#[test]
fn test_repause_replaces_context() {
    let second = json!({
        "callFrames": [
            frame("frame-trigger-2", TRIGGER, "file:///srv/breakin.js", 2, vec![]),
            frame("frame-caller-2", "handler", "file:///srv/app.js", 19, default_scopes()),
        ],
    });
    let (mut session, _, info) = paused_session(paused_runtime(
        paused_in("file:///srv/app.js", default_scopes()),
        move |method, _| {
            (method == "Debugger.setScriptSource").then(|| {
                vec![
                    Reply::Result(json!({"status": "Ok", "stackChanged": true})),
                    Reply::Event("Debugger.resumed", json!({})),
                    Reply::Event("Debugger.paused", second.clone()),
                ]
            })
        },
    ));

    let script_id = session.pause_context().unwrap().script_id.clone();
    session.set_script_source(&script_id, "f()").unwrap();
    // events are applied only on dispatch
    assert_eq!(session.pause_context().unwrap().call_frame_id.0, CALLER_FRAME);

    session.dispatch_events().unwrap();
    assert_eq!(session.state(), SessionState::Paused);
    assert_eq!(session.epoch(), 2);
    let ctx = session.pause_context().unwrap();
    assert_eq!(ctx.call_frame_id.0, "frame-caller-2");
    assert_eq!(ctx.line, 20);

    assert_eq!(*info.pauses.borrow(), vec![(1, 10, true), (2, 20, false)]);
    assert_eq!(*info.resumes.borrow(), 1);
}

#[test]
fn test_connection_closed_before_pause() {
    let (conn, _) = MockConnection::new(|_, _| vec![]);
    let info = TestInfo::default();
    let mut session = Session::new(Transport::new(conn), TRIGGER, TestHooks::new(info.clone()));
    session.open().unwrap();

    assert!(matches!(session.wait_for_pause(), Err(Error::ConnectionClosed)));
    assert_eq!(session.state(), SessionState::Closed);
    assert!(info.pauses.borrow().is_empty());
}

#[test]
fn test_resumed_without_pause_is_ignored() {
    let responder = move |method: &str, _: &serde_json::Value| match method {
        "Runtime.runIfWaitingForDebugger" => vec![
            Reply::Result(json!({})),
            Reply::Event("Debugger.resumed", json!({})),
            Reply::Event("Debugger.paused", paused_in("file:///srv/app.js", vec![])),
        ],
        _ => vec![Reply::Result(json!({}))],
    };
    let (session, _, info) = paused_session(responder);

    assert_eq!(session.state(), SessionState::Paused);
    assert_eq!(*info.resumes.borrow(), 0);
}
