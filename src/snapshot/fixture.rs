use crate::inspector::Error;
use std::fs;
use std::path::Path;

/// Single captured variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    /// Source text of the value or a serialization error.
    pub literal: Result<String, String>,
}

impl Binding {
    fn render(&self) -> String {
        match self.literal {
            Ok(ref literal) => format!("const {} = {literal};", self.name),
            Err(ref e) => format!(
                "const {} = undefined; /* serialization error: {} */",
                self.name,
                e.replace("*/", "* /")
            ),
        }
    }
}

/// Test file reconstructing captured bindings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fixture {
    /// Free text put into a leading comment.
    pub header: Option<String>,
    pub bindings: Vec<Binding>,
}

impl Fixture {
    pub fn render(&self) -> String {
        let mut text = String::new();
        if let Some(ref header) = self.header {
            for line in header.lines() {
                text.push_str(&format!("// {line}\n"));
            }
        }

        text.push_str("import { test, expect } from 'vitest';\n\n");
        text.push_str("test('snapshot state', () => {\n");
        for binding in &self.bindings {
            text.push_str(&format!("    {}\n", binding.render()));
        }
        if !self.bindings.is_empty() {
            text.push('\n');
        }
        text.push_str("    // Add assertions here\n");
        text.push_str("});\n");
        text
    }

    pub fn write(&self, path: &Path) -> Result<(), Error> {
        fs::write(path, self.render()).map_err(|e| Error::FixtureFile(path.to_path_buf(), e))
    }
}
