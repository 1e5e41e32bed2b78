use crate::inspector::protocol::Primitive;
use crate::inspector::Evaluation;
use crate::ui::config::Theme;
use crate::ui::syntax;
use crate::ui::syntax::StylizedLine;
use serde_json::Value;
use syntect::util::as_24_bit_terminal_escaped;

const TAB: &str = "\t";

/// Render evaluation result, complex values are rendered on multiple lines and highlighted.
pub fn render_evaluation(evaluation: &Evaluation, theme: Theme) -> anyhow::Result<String> {
    let text = match evaluation {
        Evaluation::Primitive(primitive) => render_primitive(primitive),
        Evaluation::Error(description) => return Ok(description.clone()),
        Evaluation::ByValue(value) => render_value(value, 0),
        Evaluation::Described(description) => description.clone(),
    };

    let syntax_renderer = syntax::js_syntax_renderer();
    let mut line_renderer = syntax_renderer.line_renderer(theme);
    Ok(text
        .lines()
        .map(|l| -> anyhow::Result<String> {
            let line = match line_renderer.render_line(l)? {
                StylizedLine::NoneStyle(l) => l.to_string(),
                StylizedLine::Stylized(segments) => {
                    let line = as_24_bit_terminal_escaped(&segments, false);
                    format!("{line}\x1b[0m")
                }
            };
            Ok(line)
        })
        .collect::<anyhow::Result<Vec<_>>>()?
        .join("\n"))
}

pub fn render_primitive(primitive: &Primitive) -> String {
    match primitive {
        Primitive::Undefined => "undefined".to_string(),
        Primitive::Null => "null".to_string(),
        Primitive::Value(value) => render_value(value, 0),
        Primitive::Unserializable(lit) => lit.clone(),
        Primitive::Symbol(description) => description.clone(),
    }
}

fn quote(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n");
    format!("'{escaped}'")
}

pub fn render_value(value: &Value, depth: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => {
            let tabs = TAB.repeat(depth + 1);
            let items = items
                .iter()
                .map(|v| format!("{tabs}{}", render_value(v, depth + 1)))
                .collect::<Vec<_>>();
            format!("[\n{}\n{}]", items.join(",\n"), TAB.repeat(depth))
        }
        Value::Object(members) if members.is_empty() => "{}".to_string(),
        Value::Object(members) => {
            let tabs = TAB.repeat(depth + 1);
            let members = members
                .iter()
                .map(|(k, v)| format!("{tabs}{k}: {}", render_value(v, depth + 1)))
                .collect::<Vec<_>>();
            format!("{{\n{}\n{}}}", members.join(",\n"), TAB.repeat(depth))
        }
    }
}
