//! Expression evaluation in the paused frame and remote object access.

use crate::inspector::protocol::{
    EvaluationResult, PropertiesResult, PropertyDescriptor, Primitive, RemoteObject,
    RemoteObjectId,
};
use crate::inspector::rpc::Connection;
use crate::inspector::{Error, Session};
use crate::muted_error;
use serde_json::{json, Value};

const SELF_FUNCTION: &str = "function() { return this; }";

/// Result of an expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Value transmitted inline.
    Primitive(Primitive),
    /// Expression result is an error object (not thrown), contains error description.
    Error(String),
    /// Json representation of a complex value.
    ByValue(Value),
    /// Value without by-value representation: description or type of the remote object.
    Described(String),
}

impl<C: Connection> Session<C> {
    /// Evaluate expression in the call frame of current pause context.
    pub fn evaluate(&mut self, expression: &str) -> Result<Evaluation, Error> {
        let call_frame_id = self.pause_context()?.call_frame_id.clone();

        let result: EvaluationResult = self.call_as(
            "Debugger.evaluateOnCallFrame",
            json!({
                "callFrameId": call_frame_id,
                "expression": expression,
                "includeCommandLineAPI": true,
                "generatePreview": true,
            }),
        )?;
        if let Some(exception) = result.exception_details {
            return Err(Error::Evaluation(exception.description()));
        }

        let remote = result.result;
        if remote.is_error() {
            return Ok(Evaluation::Error(remote.describe()));
        }
        if let Some(primitive) = remote.primitive() {
            return Ok(Evaluation::Primitive(primitive));
        }

        Ok(self.value_of(&remote))
    }

    /// Fetch by-value representation of a complex object, fallback to its description.
    fn value_of(&mut self, remote: &RemoteObject) -> Evaluation {
        let by_value = remote.object_id.as_ref().and_then(|object_id| {
            muted_error!(self.call_function_on(object_id, SELF_FUNCTION, vec![], true))
        });

        match by_value {
            Some(EvaluationResult {
                result:
                    RemoteObject {
                        value: Some(value), ..
                    },
                exception_details: None,
            }) => Evaluation::ByValue(value),
            _ => Evaluation::Described(remote.describe()),
        }
    }

    /// Call a function with `this` bound to a remote object.
    /// Each of `arguments` is a `Runtime.CallArgument` json object.
    pub fn call_function_on(
        &mut self,
        object_id: &RemoteObjectId,
        function: &str,
        arguments: Vec<Value>,
        return_by_value: bool,
    ) -> Result<EvaluationResult, Error> {
        self.call_as(
            "Runtime.callFunctionOn",
            json!({
                "objectId": object_id,
                "functionDeclaration": function,
                "arguments": arguments,
                "returnByValue": return_by_value,
            }),
        )
    }

    /// Return own properties of a remote object.
    pub fn own_properties(
        &mut self,
        object_id: &RemoteObjectId,
    ) -> Result<Vec<PropertyDescriptor>, Error> {
        let props: PropertiesResult = self.call_as(
            "Runtime.getProperties",
            json!({
                "objectId": object_id,
                "ownProperties": true,
            }),
        )?;
        if let Some(exception) = props.exception_details {
            return Err(Error::Evaluation(exception.description()));
        }
        Ok(props.result)
    }

    /// Return names of variables visible in the paused frame (global scope excluded),
    /// inner scopes first, without duplicates.
    pub fn variable_names(&mut self) -> Result<Vec<String>, Error> {
        let scopes = self
            .pause_context()?
            .local_scopes()
            .filter_map(|scope| scope.object.object_id.clone())
            .collect::<Vec<_>>();

        let mut names = indexmap::IndexSet::new();
        for object_id in scopes {
            for prop in self.own_properties(&object_id)? {
                names.insert(prop.name);
            }
        }
        Ok(names.into_iter().collect())
    }
}
