use crate::ui::config::Theme;
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::SyntaxSet;

pub struct JsCodeLineRenderer<'a> {
    syntax_set: &'a SyntaxSet,
    highlighter: Option<HighlightLines<'a>>,
}

/// Stylized line representation.
pub enum StylizedLine<'a> {
    /// No styling needed.
    NoneStyle(&'a str),
    /// `syntect` stylized line, list of stylized line segments.
    Stylized(Vec<(Style, &'a str)>),
}

impl JsCodeLineRenderer<'_> {
    /// Prettify javascript code-line if needed.
    pub fn render_line<'s>(&mut self, line: &'s str) -> anyhow::Result<StylizedLine<'s>> {
        match &mut self.highlighter {
            None => Ok(StylizedLine::NoneStyle(line)),
            Some(h) => Ok(StylizedLine::Stylized(
                h.highlight_line(line, self.syntax_set)?,
            )),
        }
    }
}

pub struct JsCodeRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Default for JsCodeRenderer {
    fn default() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }
}

impl JsCodeRenderer {
    const JS_EXT: &'static str = "js";

    pub fn line_renderer(&self, theme: Theme) -> JsCodeLineRenderer {
        let plain = JsCodeLineRenderer {
            syntax_set: &self.syntax_set,
            highlighter: None,
        };

        let Some(theme) = theme
            .to_syntect_name()
            .and_then(|name| self.theme_set.themes.get(name))
        else {
            return plain;
        };
        let Some(syntax_ref) = self.syntax_set.find_syntax_by_extension(Self::JS_EXT) else {
            return plain;
        };

        JsCodeLineRenderer {
            syntax_set: &self.syntax_set,
            highlighter: Some(HighlightLines::new(syntax_ref, theme)),
        }
    }
}

static RENDERER: OnceLock<JsCodeRenderer> = OnceLock::new();

/// Return current source code renderer.
pub fn js_syntax_renderer() -> &'static JsCodeRenderer {
    RENDERER.get_or_init(JsCodeRenderer::default)
}
