//! Wire types of the inspector protocol (a subset of the Chrome DevTools Protocol).
//!
//! Only the fields the session actually reads are modeled, everything else is ignored on
//! deserialization.

use crate::inspector::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

pub type RequestId = u64;

/// Identifier of a parsed script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ScriptId(pub String);

/// Identifier of a call frame, valid until the debugee resumes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CallFrameId(pub String);

/// Handle of a value that lives inside the debugee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RemoteObjectId(pub String);

/// Outgoing request envelope.
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub id: RequestId,
    pub method: &'a str,
    pub params: Value,
}

/// Error payload reported by the remote for a failed request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProtocolError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)?;
        if let Some(ref data) = self.data {
            write!(f, ": {data}")?;
        }
        Ok(())
    }
}

/// Unsolicited notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub method: String,
    pub params: Value,
}

/// Any message received from the remote.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Response {
        id: RequestId,
        outcome: Result<Value, ProtocolError>,
    },
    Event(Event),
}

#[derive(Deserialize)]
struct RawInbound {
    id: Option<RequestId>,
    result: Option<Value>,
    error: Option<ProtocolError>,
    method: Option<String>,
    #[serde(default)]
    params: Value,
}

impl Inbound {
    /// Parse a text frame into a response or an event.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let raw: RawInbound = serde_json::from_str(text)?;
        match (raw.id, raw.method) {
            (Some(id), _) => {
                let outcome = match raw.error {
                    Some(err) => Err(err),
                    None => Ok(raw.result.unwrap_or_else(|| Value::Object(Default::default()))),
                };
                Ok(Inbound::Response { id, outcome })
            }
            (None, Some(method)) => Ok(Inbound::Event(Event {
                method,
                params: raw.params,
            })),
            (None, None) => Err(Error::UnrecognizedMessage(text.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteType {
    Object,
    Function,
    #[default]
    Undefined,
    String,
    Number,
    Boolean,
    Symbol,
    Bigint,
    #[serde(other)]
    Unknown,
}

impl Display for RemoteType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RemoteType::Object => "object",
            RemoteType::Function => "function",
            RemoteType::Undefined => "undefined",
            RemoteType::String => "string",
            RemoteType::Number => "number",
            RemoteType::Boolean => "boolean",
            RemoteType::Symbol => "symbol",
            RemoteType::Bigint => "bigint",
            RemoteType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Mirror object referencing a value of the debugee.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub kind: RemoteType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unserializable_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
}

/// Value transmitted inline with a [`RemoteObject`].
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Undefined,
    Null,
    /// Json-representable primitive: string, number or boolean.
    Value(Value),
    /// Primitive without json representation, like `NaN`, `-0` or `10n`.
    Unserializable(String),
    /// Symbol description, like `Symbol(tag)`.
    Symbol(String),
}

impl RemoteObject {
    pub fn is_subtype(&self, subtype: &str) -> bool {
        self.subtype.as_deref() == Some(subtype)
    }

    pub fn is_error(&self) -> bool {
        self.kind == RemoteType::Object && self.is_subtype("error")
    }

    /// Return inline primitive value if remote object carries one.
    pub fn primitive(&self) -> Option<Primitive> {
        if let Some(ref unserializable) = self.unserializable_value {
            return Some(Primitive::Unserializable(unserializable.clone()));
        }

        match self.kind {
            RemoteType::Undefined => Some(Primitive::Undefined),
            RemoteType::Object if self.is_subtype("null") => Some(Primitive::Null),
            RemoteType::String | RemoteType::Number | RemoteType::Boolean => {
                Some(self.value.clone().map_or(Primitive::Null, Primitive::Value))
            }
            RemoteType::Symbol => Some(Primitive::Symbol(
                self.description.clone().unwrap_or_else(|| "Symbol()".to_string()),
            )),
            _ => None,
        }
    }

    /// Human-readable fallback: object description or its type tag.
    pub fn describe(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.kind.to_string())
    }
}

/// Details of an exception thrown while executing a request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub line_number: u32,
    #[serde(default)]
    pub column_number: u32,
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    pub fn description(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .unwrap_or_else(|| self.text.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub script_id: ScriptId,
    pub line_number: u32,
    #[serde(default)]
    pub column_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeKind {
    Global,
    Local,
    With,
    Closure,
    Catch,
    Block,
    Script,
    Eval,
    Module,
    WasmExpressionStack,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub kind: ScopeKind,
    pub object: RemoteObject,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    pub call_frame_id: CallFrameId,
    #[serde(default)]
    pub function_name: String,
    pub location: Location,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub scope_chain: Vec<Scope>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedEvent {
    pub call_frames: Vec<CallFrame>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptParsedEvent {
    pub script_id: ScriptId,
    #[serde(default)]
    pub url: String,
}

/// Result of `Debugger.evaluateOnCallFrame` and `Runtime.callFunctionOn`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub result: RemoteObject,
    pub exception_details: Option<ExceptionDetails>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,
    pub value: Option<RemoteObject>,
    #[serde(default)]
    pub enumerable: bool,
    #[serde(default)]
    pub is_own: bool,
    /// Set for symbol-keyed properties.
    pub symbol: Option<RemoteObject>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertiesResult {
    pub result: Vec<PropertyDescriptor>,
    pub exception_details: Option<ExceptionDetails>,
}

/// Result of `Debugger.setScriptSource`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScriptSourceResult {
    #[serde(default)]
    pub stack_changed: bool,
    pub status: Option<String>,
    pub exception_details: Option<ExceptionDetails>,
}

/// Entry of the endpoint discovery listing (`/json/list`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub web_socket_debugger_url: Option<String>,
}
