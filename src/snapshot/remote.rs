//! [`ValueSource`] over remote objects of a paused runtime.

use crate::inspector::protocol::{Primitive, PropertyDescriptor, RemoteObject, RemoteType};
use crate::inspector::rpc::Connection;
use crate::inspector::{Error, Session};
use crate::snapshot::serialize::{Node, Property, ValueSource};
use serde_json::{json, Value};
use std::collections::HashMap;

const DATE_ISO_FUNCTION: &str =
    "function() { return isNaN(this.getTime()) ? null : this.toISOString(); }";

const IDENTITY_FUNCTION: &str = r#"function() {
    for (let i = 0; i < arguments.length; i++) {
        if (arguments[i] === this) return i;
    }
    return -1;
}"#;

/// Literal for a date with invalid time value.
pub const INVALID_DATE: &str = "new Date(NaN)";

/// Walks remote objects with a request per visited object.
///
/// Remote object ids are not stable (the same value fetched twice gets two ids),
/// so object identity is checked inside the runtime.
pub struct RemoteGraph<'a, C: Connection> {
    session: &'a mut Session<C>,
}

impl<'a, C: Connection> RemoteGraph<'a, C> {
    pub fn new(session: &'a mut Session<C>) -> Self {
        Self { session }
    }

    fn own_properties(&mut self, remote: &RemoteObject) -> Result<Vec<PropertyDescriptor>, Error> {
        match remote.object_id {
            Some(ref object_id) => self.session.own_properties(object_id),
            None => Ok(vec![]),
        }
    }

    fn date(&mut self, remote: &RemoteObject) -> Result<Node<RemoteObject>, Error> {
        let Some(ref object_id) = remote.object_id else {
            return Ok(Node::Literal(remote.describe()));
        };

        let result = self
            .session
            .call_function_on(object_id, DATE_ISO_FUNCTION, vec![], true)?;
        if let Some(exception) = result.exception_details {
            return Err(Error::Evaluation(exception.description()));
        }

        match result.result.value {
            Some(Value::String(iso)) => Ok(Node::Date(iso)),
            _ => Ok(Node::Literal(INVALID_DATE.to_string())),
        }
    }

    fn array(&mut self, remote: &RemoteObject) -> Result<Node<RemoteObject>, Error> {
        let mut items = HashMap::new();
        let mut len = 0;
        for prop in self.own_properties(remote)? {
            if prop.name == "length" {
                len = prop
                    .value
                    .as_ref()
                    .and_then(|v| v.value.as_ref())
                    .and_then(Value::as_u64)
                    .unwrap_or_default() as usize;
            } else if let Ok(idx) = prop.name.parse::<usize>() {
                items.insert(idx, prop.value.unwrap_or_default());
            }
        }

        // holes and accessors are rendered as undefined
        let items = (0..len)
            .map(|idx| items.remove(&idx).unwrap_or_default())
            .collect();
        Ok(Node::Array(items))
    }

    fn object(&mut self, remote: &RemoteObject) -> Result<Node<RemoteObject>, Error> {
        let props = self
            .own_properties(remote)?
            .into_iter()
            .filter(|prop| prop.enumerable && prop.symbol.is_none())
            .map(|prop| Property {
                key: prop.name,
                value: prop.value,
            })
            .collect();
        Ok(Node::Object(props))
    }
}

fn primitive_node(primitive: Primitive) -> Node<RemoteObject> {
    match primitive {
        Primitive::Undefined => Node::Undefined,
        Primitive::Null => Node::Null,
        Primitive::Value(Value::String(s)) => Node::String(s),
        Primitive::Value(v) => Node::Literal(v.to_string()),
        Primitive::Unserializable(lit) => Node::Literal(lit),
        Primitive::Symbol(description) => Node::String(description),
    }
}

impl<C: Connection> ValueSource for RemoteGraph<'_, C> {
    type Handle = RemoteObject;

    fn inspect(&mut self, remote: &RemoteObject) -> Result<Node<RemoteObject>, Error> {
        if let Some(primitive) = remote.primitive() {
            return Ok(primitive_node(primitive));
        }

        match remote.kind {
            RemoteType::Function => Ok(Node::Function),
            RemoteType::Object => match remote.subtype.as_deref() {
                Some("date") => self.date(remote),
                Some("regexp") => Ok(Node::RegExp(remote.describe())),
                Some("array") => self.array(remote),
                _ if remote.object_id.is_some() => self.object(remote),
                _ => Ok(Node::Literal(remote.describe())),
            },
            _ => Ok(Node::Literal(remote.describe())),
        }
    }

    fn find_same(
        &mut self,
        remote: &RemoteObject,
        seen: &[RemoteObject],
    ) -> Result<Option<usize>, Error> {
        let Some(ref object_id) = remote.object_id else {
            return Ok(None);
        };
        if seen.is_empty() {
            return Ok(None);
        }

        let arguments = seen
            .iter()
            .map(|h| match h.object_id {
                Some(ref id) => json!({ "objectId": id }),
                None => json!({}),
            })
            .collect();
        let result = self
            .session
            .call_function_on(object_id, IDENTITY_FUNCTION, arguments, true)?;
        if let Some(exception) = result.exception_details {
            return Err(Error::Evaluation(exception.description()));
        }

        let idx = result.result.value.as_ref().and_then(Value::as_i64);
        Ok(idx.and_then(|idx| usize::try_from(idx).ok()))
    }
}
