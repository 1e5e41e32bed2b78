//! Snapshot generator: capture variables of the paused frame as a test fixture.

pub mod fixture;
pub mod remote;
pub mod serialize;

use crate::inspector::protocol::RemoteObject;
use crate::inspector::rpc::Connection;
use crate::inspector::{Error, Session};
use crate::snapshot::fixture::{Binding, Fixture};
use crate::snapshot::remote::RemoteGraph;
use crate::{bi_debug, bi_warn};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Value};
use strum_macros::{Display, EnumString};

/// Where values are turned into source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// A single request per variable, serializer runs inside the runtime.
    #[default]
    #[strum(serialize = "in-context")]
    InContext,
    /// Client walks the object graph with a request per object.
    #[strum(serialize = "client")]
    Client,
}

/// Serializer function evaluated with `this` bound to a captured value, the only argument
/// is a root path for circular reference markers. Follows the same rules as
/// [`serialize::serialize`].
pub const SERIALIZER_JS: &str = r#"function (root) {
    'use strict';
    const seen = new Map();
    const identifier = /^[A-Za-z_$][A-Za-z0-9_$]*$/;

    function serialize(v, path) {
        if (v === undefined) return 'undefined';
        if (v === null) return 'null';
        switch (typeof v) {
            case 'function': return '() => { /* function */ }';
            case 'string': return JSON.stringify(v);
            case 'symbol': return JSON.stringify(String(v));
            case 'bigint': return String(v) + 'n';
            case 'number': return Object.is(v, -0) ? '-0' : String(v);
            case 'boolean': return String(v);
        }
        if (v instanceof Date) {
            return isNaN(v.getTime()) ? 'new Date(NaN)' : 'new Date(' + JSON.stringify(v.toISOString()) + ')';
        }
        if (v instanceof RegExp) return String(v);

        if (seen.has(v)) return '/* Circular(' + seen.get(v).split('*/').join('* /') + ') */ null';
        seen.set(v, path);

        if (Array.isArray(v)) {
            const items = [];
            for (let i = 0; i < v.length; i++) {
                items.push(serialize(v[i], path + '[' + i + ']'));
            }
            return '[' + items.join(', ') + ']';
        }

        const parts = [];
        for (const key in v) {
            if (key === '__proto__') continue;
            let value;
            try {
                value = v[key];
            } catch (e) {
                continue;
            }
            const k = identifier.test(key) ? key : JSON.stringify(key);
            parts.push(k + ': ' + serialize(value, path + '.' + key));
        }
        return parts.length ? '{ ' + parts.join(', ') + ' }' : '{}';
    }

    return serialize(this, root);
}"#;

/// Collect variables visible in the paused frame, inner scopes first.
/// A name shadowed by an inner scope is taken from the inner scope.
pub fn collect_bindings<C: Connection>(
    session: &mut Session<C>,
) -> Result<IndexMap<String, RemoteObject>, Error> {
    let ctx = session.pause_context()?;
    if ctx.scope_chain.is_empty() {
        return Err(Error::NoScopeInfo);
    }
    let scopes = ctx
        .local_scopes()
        .filter_map(|scope| scope.object.object_id.clone())
        .collect::<Vec<_>>();

    let mut bindings = IndexMap::new();
    for object_id in scopes {
        for prop in session.own_properties(&object_id)? {
            if let Some(value) = prop.value {
                bindings.entry(prop.name).or_insert(value);
            }
        }
    }
    Ok(bindings)
}

/// Serialize a single value as javascript source text.
pub fn serialize_value<C: Connection>(
    session: &mut Session<C>,
    name: &str,
    value: &RemoteObject,
    strategy: Strategy,
) -> Result<String, Error> {
    match (strategy, &value.object_id) {
        (Strategy::InContext, Some(object_id)) => {
            let result = session.call_function_on(
                object_id,
                SERIALIZER_JS,
                vec![json!({ "value": name })],
                true,
            )?;
            if let Some(exception) = result.exception_details {
                return Err(Error::Evaluation(exception.description()));
            }
            match result.result.value {
                Some(Value::String(text)) => Ok(text),
                _ => Err(Error::Evaluation(format!(
                    "serializer returned {}",
                    result.result.describe()
                ))),
            }
        }
        // values without a handle are primitives, they need no requests
        _ => serialize::serialize(&mut RemoteGraph::new(session), value, name),
    }
}

/// Capture variables of the paused frame into a fixture.
///
/// A variable that cannot be serialized becomes an `undefined` binding annotated with
/// an error. Only a lost connection aborts the generation.
pub fn generate<C: Connection>(
    session: &mut Session<C>,
    strategy: Strategy,
) -> Result<Fixture, Error> {
    let location = session.pause_context()?.location();
    let variables = collect_bindings(session)?;
    bi_debug!(target: "snapshot", "capture {} variables with {strategy} serializer", variables.len());

    let mut bindings = Vec::with_capacity(variables.len());
    for (name, value) in variables {
        let literal = match serialize_value(session, &name, &value, strategy) {
            Ok(literal) => Ok(literal),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                bi_warn!(target: "snapshot", "serialize {name}: {e:#}");
                Err(e.to_string())
            }
        };
        bindings.push(Binding { name, literal });
    }

    Ok(Fixture {
        header: Some(format!(
            "Snapshot of {location}, captured {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )),
        bindings,
    })
}
