use crate::common::{default_scopes, paused_in, paused_runtime, paused_session, Reply, CALLER_FRAME};
use breakin::inspector::protocol::Primitive;
use breakin::inspector::{Error, Evaluation, SessionState};
use serde_json::{json, Value};

fn evaluation_runtime(
    mut on_evaluate: impl FnMut(&str) -> Vec<Reply> + 'static,
    mut on_call_function: impl FnMut(&Value) -> Vec<Reply> + 'static,
) -> impl FnMut(&str, &Value) -> Vec<Reply> + 'static {
    paused_runtime(
        paused_in("file:///srv/app.js", default_scopes()),
        move |method, params| match method {
            "Debugger.evaluateOnCallFrame" => {
                Some(on_evaluate(params["expression"].as_str().unwrap()))
            }
            "Runtime.callFunctionOn" => Some(on_call_function(params)),
            _ => None,
        },
    )
}

#[test]
fn test_evaluate_primitive() {
    let (mut session, log, _) = paused_session(evaluation_runtime(
        |expr| match expr {
            "count" => vec![Reply::Result(
                json!({"result": {"type": "number", "value": 42, "description": "42"}}),
            )],
            "name" => vec![Reply::Result(
                json!({"result": {"type": "string", "value": "ann"}}),
            )],
            "missing" => vec![Reply::Result(json!({"result": {"type": "undefined"}}))],
            "nothing" => vec![Reply::Result(
                json!({"result": {"type": "object", "subtype": "null", "value": null}}),
            )],
            _ => vec![Reply::Result(
                json!({"result": {"type": "number", "unserializableValue": "NaN", "description": "NaN"}}),
            )],
        },
        |_| unreachable!("primitives are transmitted inline"),
    ));

    assert_eq!(
        session.evaluate("count").unwrap(),
        Evaluation::Primitive(Primitive::Value(json!(42)))
    );
    assert_eq!(
        session.evaluate("name").unwrap(),
        Evaluation::Primitive(Primitive::Value(json!("ann")))
    );
    assert_eq!(
        session.evaluate("missing").unwrap(),
        Evaluation::Primitive(Primitive::Undefined)
    );
    assert_eq!(
        session.evaluate("nothing").unwrap(),
        Evaluation::Primitive(Primitive::Null)
    );
    assert_eq!(
        session.evaluate("0/0").unwrap(),
        Evaluation::Primitive(Primitive::Unserializable("NaN".to_string()))
    );

    let params = log.params_of("Debugger.evaluateOnCallFrame");
    assert_eq!(params.len(), 5);
    assert_eq!(params[0]["callFrameId"], CALLER_FRAME);
    assert_eq!(params[0]["includeCommandLineAPI"], true);
    assert_eq!(params[0]["generatePreview"], true);
}

#[test]
fn test_evaluate_thrown_exception() {
    let (mut session, _, _) = paused_session(evaluation_runtime(
        |_| {
            vec![Reply::Result(json!({
                "result": {"type": "object", "subtype": "error", "objectId": "err-1"},
                "exceptionDetails": {
                    "text": "Uncaught",
                    "lineNumber": 0,
                    "exception": {
                        "type": "object",
                        "subtype": "error",
                        "description": "ReferenceError: nope is not defined\n    at eval",
                    },
                },
            }))]
        },
        |_| vec![],
    ));

    let err = session.evaluate("nope").unwrap_err();
    assert!(!err.is_fatal());
    assert!(
        matches!(err, Error::Evaluation(ref d) if d.starts_with("ReferenceError: nope is not defined"))
    );
    // the loop goes on
    assert_eq!(session.state(), SessionState::Paused);
    assert!(session.pause_context().is_ok());
}

#[test]
fn test_evaluate_error_object() {
    let (mut session, log, _) = paused_session(evaluation_runtime(
        |_| {
            vec![Reply::Result(json!({
                "result": {
                    "type": "object",
                    "subtype": "error",
                    "className": "Error",
                    "description": "Error: boom\n    at handler (/srv/app.js:3:9)",
                    "objectId": "err-2",
                },
            }))]
        },
        |_| vec![],
    ));

    assert_eq!(
        session.evaluate("new Error('boom')").unwrap(),
        Evaluation::Error("Error: boom\n    at handler (/srv/app.js:3:9)".to_string())
    );
    assert_eq!(log.count("Runtime.callFunctionOn"), 0);
}

#[test]
fn test_evaluate_complex_value() {
    let (mut session, log, _) = paused_session(evaluation_runtime(
        |expr| {
            let object_id = if expr == "user" { "obj-user" } else { "obj-map" };
            vec![Reply::Result(json!({
                "result": {"type": "object", "className": "Object", "description": "Object", "objectId": object_id},
            }))]
        },
        |params| match params["objectId"].as_str() {
            Some("obj-user") => vec![Reply::Result(json!({
                "result": {"type": "object", "value": {"name": "ann", "tags": ["a"]}},
            }))],
            _ => vec![Reply::Error("Object couldn't be returned by value")],
        },
    ));

    assert_eq!(
        session.evaluate("user").unwrap(),
        Evaluation::ByValue(json!({"name": "ann", "tags": ["a"]}))
    );
    // value without json representation falls back to its description
    assert_eq!(
        session.evaluate("map").unwrap(),
        Evaluation::Described("Object".to_string())
    );

    let params = log.params_of("Runtime.callFunctionOn");
    assert_eq!(params[0]["objectId"], "obj-user");
    assert_eq!(params[0]["returnByValue"], true);
    assert_eq!(params[0]["functionDeclaration"], "function() { return this; }");
}

#[test]
fn test_evaluate_protocol_error() {
    let (mut session, _, _) = paused_session(evaluation_runtime(
        |_| vec![Reply::Error("Invalid call frame")],
        |_| vec![],
    ));

    let err = session.evaluate("1 +").unwrap_err();
    assert!(matches!(err, Error::Protocol(ref e) if e.message == "Invalid call frame"));
    assert!(!err.is_fatal());
    assert_eq!(session.state(), SessionState::Paused);
}

#[test]
fn test_variable_names() {
    let (mut session, log, _) = paused_session(paused_runtime(
        paused_in("file:///srv/app.js", default_scopes()),
        |method, params| {
            if method != "Runtime.getProperties" {
                return None;
            }
            let props = match params["objectId"].as_str().unwrap() {
                "scope-local" => json!([
                    {"name": "a", "value": {"type": "number", "value": 1}, "enumerable": true},
                    {"name": "b", "value": {"type": "number", "value": 2}, "enumerable": true},
                ]),
                "scope-closure" => json!([
                    {"name": "b", "value": {"type": "number", "value": 3}, "enumerable": true},
                    {"name": "c", "value": {"type": "undefined"}, "enumerable": true},
                ]),
                _ => unreachable!("global scope is never enumerated"),
            };
            Some(vec![Reply::Result(json!({ "result": props }))])
        },
    ));

    assert_eq!(session.variable_names().unwrap(), vec!["a", "b", "c"]);
    let params = log.params_of("Runtime.getProperties");
    assert_eq!(params.len(), 2);
    assert_eq!(params[0]["ownProperties"], true);
}
