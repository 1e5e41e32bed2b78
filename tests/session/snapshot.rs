use crate::common::{default_scopes, paused_in, paused_runtime, paused_session, scope, Reply};
use breakin::inspector::Error;
use breakin::snapshot::{self, Strategy, SERIALIZER_JS};
use breakin::ui::command::snap;
use serde_json::{json, Value};
use std::fs;

fn property(name: &str, value: Value) -> Value {
    json!({"name": name, "value": value, "enumerable": true, "isOwn": true})
}

fn object(object_id: &str) -> Value {
    json!({"type": "object", "className": "Object", "description": "Object", "objectId": object_id})
}

/// Scope variables: `user` and `count` in a local scope, shadowed `count` and `cfg` in a closure.
fn scope_properties(object_id: &str) -> Option<Value> {
    let props = match object_id {
        "scope-local" => json!([
            property("user", object("o-user")),
            property("count", json!({"type": "number", "value": 3, "description": "3"})),
        ]),
        "scope-closure" => json!([
            property("count", json!({"type": "number", "value": 9, "description": "9"})),
            property("cfg", object("o-cfg")),
            property("log", json!({"type": "function", "description": "function log() {}", "objectId": "o-log"})),
        ]),
        "scope-global" => unreachable!("global scope is never captured"),
        _ => return None,
    };
    Some(json!({ "result": props }))
}

fn in_context_runtime() -> impl FnMut(&str, &Value) -> Vec<Reply> + 'static {
    paused_runtime(
        paused_in("file:///srv/app.js", default_scopes()),
        |method, params| match method {
            "Runtime.getProperties" => {
                scope_properties(params["objectId"].as_str().unwrap()).map(|r| vec![Reply::Result(r)])
            }
            "Runtime.callFunctionOn" => {
                assert_eq!(params["functionDeclaration"], SERIALIZER_JS);
                let reply = match params["objectId"].as_str().unwrap() {
                    "o-user" => Reply::Result(json!({
                        "result": {"type": "string", "value": "{ name: \"ann\", self: /* Circular(user) */ null }"},
                    })),
                    "o-log" => Reply::Result(json!({
                        "result": {"type": "string", "value": "() => { /* function */ }"},
                    })),
                    _ => Reply::Result(json!({
                        "result": {"type": "object", "subtype": "error", "objectId": "e-1"},
                        "exceptionDetails": {
                            "text": "Uncaught",
                            "exception": {"type": "object", "subtype": "error", "description": "TypeError: proxy trap */ failed"},
                        },
                    })),
                };
                Some(vec![reply])
            }
            _ => None,
        },
    )
}

#[test]
fn test_generate_in_context() {
    let (mut session, log, _) = paused_session(in_context_runtime());

    let fixture = snapshot::generate(&mut session, Strategy::InContext).unwrap();
    let bindings = fixture
        .bindings
        .iter()
        .map(|b| (b.name.as_str(), b.literal.as_deref().map_err(String::as_str)))
        .collect::<Vec<_>>();
    assert_eq!(
        bindings,
        vec![
            ("user", Ok("{ name: \"ann\", self: /* Circular(user) */ null }")),
            ("count", Ok("3")),
            ("cfg", Err("TypeError: proxy trap */ failed")),
            ("log", Ok("() => { /* function */ }")),
        ]
    );
    assert!(fixture
        .header
        .as_deref()
        .unwrap()
        .starts_with("Snapshot of /srv/app.js:10"));

    // single request per variable with a handle, the name is a root path
    let calls = log.params_of("Runtime.callFunctionOn");
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0]["arguments"], json!([{"value": "user"}]));
    assert_eq!(calls[0]["returnByValue"], true);

    let text = fixture.render();
    assert!(text.contains("import { test, expect } from 'vitest';"));
    assert!(text.contains("    const count = 3;\n"));
    assert!(text.contains(
        "    const cfg = undefined; /* serialization error: TypeError: proxy trap * / failed */\n"
    ));
    assert!(text.ends_with("    // Add assertions here\n});\n"));
}

#[test]
fn test_snap_command_writes_fixture() {
    let (mut session, _, _) = paused_session(in_context_runtime());
    let path = std::env::temp_dir().join(format!("breakin-snap-{}.test.js", std::process::id()));

    let report = snap::Handler::new(&mut session, Strategy::InContext)
        .handle(&path)
        .unwrap();
    assert_eq!(report.path, path);
    assert_eq!(report.captured, 4);
    assert_eq!(report.failed, vec!["cfg".to_string()]);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("// Snapshot of /srv/app.js:10"));
    assert!(text.contains("const user = { name: \"ann\", self: /* Circular(user) */ null };"));
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_snap_command_unwritable_file() {
    let (mut session, _, _) = paused_session(in_context_runtime());
    let path = std::env::temp_dir().join("breakin-no-such-dir").join("snap.test.js");

    let err = snap::Handler::new(&mut session, Strategy::InContext)
        .handle(&path)
        .unwrap_err();
    assert!(matches!(
        err,
        breakin::ui::command::CommandError::Handle(Error::FixtureFile(ref p, _)) if *p == path
    ));
}

#[test]
fn test_generate_client_side() {
    let (mut session, log, _) = paused_session(paused_runtime(
        paused_in("file:///srv/app.js", vec![scope("local", "scope-local")]),
        |method, params| {
            let object_id = params["objectId"].as_str().unwrap_or_default();
            match method {
                "Runtime.getProperties" => {
                    let props = match object_id {
                        "scope-local" => json!([
                            property("node", object("o-node")),
                            property("list", json!({"type": "object", "subtype": "array", "objectId": "o-list"})),
                            property("when", json!({"type": "object", "subtype": "date", "objectId": "o-date"})),
                            property("re", json!({"type": "object", "subtype": "regexp", "description": "/ab+c/gi", "objectId": "o-re"})),
                        ]),
                        // node.parent refers back to node through a different handle
                        "o-node" => json!([
                            property("id", json!({"type": "number", "value": 1})),
                            property("parent", object("o-node-again")),
                            property("__proto__", object("o-proto")),
                            {"name": "hidden", "value": {"type": "number", "value": 2}, "enumerable": false, "isOwn": true},
                            {"name": "lazy", "enumerable": true, "isOwn": true},
                        ]),
                        "o-node-again" => json!([]),
                        "o-list" => json!([
                            property("0", json!({"type": "string", "value": "a"})),
                            property("2", json!({"type": "boolean", "value": true})),
                            {"name": "length", "value": {"type": "number", "value": 3}, "enumerable": false, "isOwn": true},
                        ]),
                        _ => json!([]),
                    };
                    Some(vec![Reply::Result(json!({ "result": props }))])
                }
                "Runtime.callFunctionOn" => {
                    let declaration = params["functionDeclaration"].as_str().unwrap();
                    let value = if declaration.contains("toISOString") {
                        json!("2024-01-02T03:04:05.000Z")
                    } else if object_id == "o-node-again" {
                        // identity check against the first visited object
                        assert_eq!(params["arguments"][0], json!({"objectId": "o-node"}));
                        json!(0)
                    } else {
                        json!(-1)
                    };
                    Some(vec![Reply::Result(json!({"result": {"type": "string", "value": value}}))])
                }
                _ => None,
            }
        },
    ));

    let fixture = snapshot::generate(&mut session, Strategy::Client).unwrap();
    let literals = fixture
        .bindings
        .iter()
        .map(|b| (b.name.as_str(), b.literal.clone().unwrap()))
        .collect::<Vec<_>>();
    assert_eq!(
        literals,
        vec![
            ("node", "{ id: 1, parent: /* Circular(node) */ null }".to_string()),
            ("list", r#"["a", undefined, true]"#.to_string()),
            ("when", r#"new Date("2024-01-02T03:04:05.000Z")"#.to_string()),
            ("re", "/ab+c/gi".to_string()),
        ]
    );
    assert_eq!(log.count("Runtime.callFunctionOn"), 2);
}

#[test]
fn test_generate_without_scopes() {
    let (mut session, _, _) = paused_session(paused_runtime(
        paused_in("file:///srv/app.js", vec![]),
        |_, _| None,
    ));

    assert!(matches!(
        snapshot::generate(&mut session, Strategy::InContext),
        Err(Error::NoScopeInfo)
    ));
}

#[test]
fn test_generate_connection_lost() {
    let (mut session, _, _) = paused_session(paused_runtime(
        paused_in("file:///srv/app.js", default_scopes()),
        |method, params| match method {
            "Runtime.getProperties" => {
                scope_properties(params["objectId"].as_str().unwrap()).map(|r| vec![Reply::Result(r)])
            }
            // runtime is gone
            "Runtime.callFunctionOn" => Some(vec![]),
            _ => None,
        },
    ));

    let err = snapshot::generate(&mut session, Strategy::InContext).unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed));
    assert!(err.is_fatal());
}
