//! Recursive serializer that turns a (possibly cyclic) value graph into javascript source text.
//!
//! The serializer does not know where values live. A [`ValueSource`] describes a value
//! behind a handle and answers identity questions, so the same rules apply to values
//! fetched from a remote runtime and to in-memory test graphs.

use crate::inspector::Error;
use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder for function values.
pub const FUNCTION_PLACEHOLDER: &str = "() => { /* function */ }";
/// Property that is never serialized.
pub const PROTO_KEY: &str = "__proto__";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("must compile"));

/// Shape of a single value.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<H> {
    Undefined,
    Null,
    Function,
    String(String),
    /// Primitive rendered in its natural text form (numbers, booleans, bigints, symbols).
    Literal(String),
    /// Date with ISO timestamp.
    Date(String),
    /// Regular expression in literal form.
    RegExp(String),
    Array(Vec<H>),
    Object(Vec<Property<H>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property<H> {
    pub key: String,
    /// `None` if property access throws, such property is dropped.
    pub value: Option<H>,
}

/// Source of values for serialization.
pub trait ValueSource {
    type Handle: Clone;

    /// Describe a value behind the handle.
    fn inspect(&mut self, handle: &Self::Handle) -> Result<Node<Self::Handle>, Error>;

    /// Return index of the handle from `seen` that refers to the same value as `handle`.
    fn find_same(
        &mut self,
        handle: &Self::Handle,
        seen: &[Self::Handle],
    ) -> Result<Option<usize>, Error>;
}

/// Render circular reference marker, a path can't close the marker comment.
pub fn circular_marker(path: &str) -> String {
    format!("/* Circular({}) */ null", path.replace("*/", "* /"))
}

/// Render object key, keys that are not valid identifiers are quoted.
pub fn render_key(key: &str) -> String {
    if IDENTIFIER_RE.is_match(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Render string literal.
pub fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Serialize value behind a `handle`, `root` is a root path used in circular reference markers.
pub fn serialize<S: ValueSource>(
    source: &mut S,
    handle: &S::Handle,
    root: &str,
) -> Result<String, Error> {
    Serializer {
        source,
        seen: vec![],
        paths: vec![],
    }
    .serialize(handle, root)
}

struct Serializer<'a, S: ValueSource> {
    source: &'a mut S,
    /// Every visited container, never popped: shared references are marked too.
    seen: Vec<S::Handle>,
    paths: Vec<String>,
}

impl<S: ValueSource> Serializer<'_, S> {
    fn serialize(&mut self, handle: &S::Handle, path: &str) -> Result<String, Error> {
        let node = self.source.inspect(handle)?;

        let text = match node {
            Node::Undefined => "undefined".to_string(),
            Node::Null => "null".to_string(),
            Node::Function => FUNCTION_PLACEHOLDER.to_string(),
            Node::String(s) => quote(&s),
            Node::Literal(lit) => lit,
            Node::Date(iso) => format!("new Date({})", quote(&iso)),
            Node::RegExp(re) => re,
            Node::Array(items) => {
                if let Some(idx) = self.source.find_same(handle, &self.seen)? {
                    return Ok(circular_marker(&self.paths[idx]));
                }
                self.mark(handle, path);

                let items = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.serialize(item, &format!("{path}[{i}]")))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("[{}]", items.join(", "))
            }
            Node::Object(props) => {
                if let Some(idx) = self.source.find_same(handle, &self.seen)? {
                    return Ok(circular_marker(&self.paths[idx]));
                }
                self.mark(handle, path);

                let mut parts = vec![];
                for prop in props {
                    if prop.key == PROTO_KEY {
                        continue;
                    }
                    let Some(value) = prop.value else {
                        continue;
                    };
                    let value = self.serialize(&value, &format!("{path}.{}", prop.key))?;
                    parts.push(format!("{}: {value}", render_key(&prop.key)));
                }

                if parts.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", parts.join(", "))
                }
            }
        };

        Ok(text)
    }

    fn mark(&mut self, handle: &S::Handle, path: &str) {
        self.seen.push(handle.clone());
        self.paths.push(path.to_string());
    }
}
