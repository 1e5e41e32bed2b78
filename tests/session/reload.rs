use crate::common::{default_scopes, paused_in, paused_runtime, paused_session, Reply, SCRIPT_ID};
use breakin::inspector::{Error, ReloadOutcome};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

fn source_file(name: &str, text: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("breakin-reload-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn file_url(path: &std::path::Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}

fn patch_runtime(
    url: &str,
    reply: impl Fn() -> Vec<Reply> + 'static,
) -> impl FnMut(&str, &Value) -> Vec<Reply> + 'static {
    paused_runtime(paused_in(url, default_scopes()), move |method, _| {
        (method == "Debugger.setScriptSource").then(&reply)
    })
}

#[test]
fn test_reload_applied() {
    let source = "function handler() {\n    return 2;\n}\n";
    let path = source_file("applied.js", source);
    let (mut session, log, _) = paused_session(patch_runtime(&file_url(&path), || {
        vec![Reply::Result(json!({"status": "Ok", "stackChanged": true}))]
    }));

    let (file, outcome) = session.reload().unwrap();
    assert_eq!(file, path);
    assert_eq!(
        outcome,
        ReloadOutcome::Applied {
            status: "Ok".to_string(),
            stack_changed: true
        }
    );

    let params = log.params_of("Debugger.setScriptSource");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0]["scriptId"], SCRIPT_ID);
    assert_eq!(params[0]["scriptSource"], source);
}

#[test]
fn test_reload_without_status() {
    let path = source_file("no_status.js", "let a = 1;");
    let (mut session, _, _) =
        paused_session(patch_runtime(&file_url(&path), || vec![Reply::Result(json!({}))]));

    let (_, outcome) = session.reload().unwrap();
    assert_eq!(
        outcome,
        ReloadOutcome::Applied {
            status: "Ok".to_string(),
            stack_changed: false
        }
    );
}

#[test]
fn test_reload_rejected() {
    let path = source_file("syntax.js", "function handler( {");
    let (mut session, _, _) = paused_session(patch_runtime(&file_url(&path), || {
        vec![Reply::Result(json!({
            "exceptionDetails": {
                "text": "Uncaught SyntaxError: Unexpected token '{'",
                "lineNumber": 0,
                "columnNumber": 18,
            },
        }))]
    }));

    let (_, outcome) = session.reload().unwrap();
    assert_eq!(
        outcome,
        ReloadOutcome::Rejected("Uncaught SyntaxError: Unexpected token '{' (line 1)".to_string())
    );

    let path = source_file("blocked.js", "let a = 2;");
    let (mut session, _, _) = paused_session(patch_runtime(&file_url(&path), || {
        vec![Reply::Result(json!({"status": "BlockedByActiveFunction"}))]
    }));
    let (_, outcome) = session.reload().unwrap();
    assert_eq!(
        outcome,
        ReloadOutcome::Rejected("BlockedByActiveFunction".to_string())
    );
}

#[test]
fn test_reload_protocol_error() {
    let path = source_file("protocol.js", "let a = 3;");
    let (mut session, _, _) = paused_session(patch_runtime(&file_url(&path), || {
        vec![Reply::Error("LiveEdit failed")]
    }));

    let err = session.reload().unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
    assert!(!err.is_fatal());
}

#[test]
fn test_reload_missing_file() {
    let path = std::env::temp_dir().join("breakin-reload-no-such-file.js");
    let (mut session, log, _) = paused_session(patch_runtime(&file_url(&path), || {
        unreachable!("nothing to submit")
    }));

    let err = session.reload().unwrap_err();
    assert!(matches!(err, Error::SourceFile(ref p, _) if *p == path));
    assert_eq!(log.count("Debugger.setScriptSource"), 0);
    assert!(session.pause_context().is_ok());
}

#[test]
fn test_reload_without_source_file() {
    let (mut session, log, _) = paused_session(patch_runtime("node:internal/main", || {
        unreachable!("nothing to submit")
    }));

    assert!(matches!(session.reload(), Err(Error::NothingToReload)));
    assert_eq!(log.count("Debugger.setScriptSource"), 0);
}
