use crate::inspector::{EventHook, PauseContext};
use crate::ui::console::file::FileView;
use crate::ui::console::print::style::{ErrorView, FilePathView, FunctionNameView, PauseView};
use crate::ui::console::print::Printer;
use std::rc::Rc;

pub struct TerminalHook {
    file_view: Rc<FileView>,
    printer: Printer,
    context_lines: usize,
}

impl TerminalHook {
    pub fn new(printer: Printer, fv: Rc<FileView>, context_lines: usize) -> Self {
        Self {
            file_view: fv,
            printer,
            context_lines,
        }
    }
}

/// Render source code around the pause location.
pub fn render_context(
    file_view: &FileView,
    ctx: &PauseContext,
    bounds: usize,
) -> anyhow::Result<String> {
    match ctx.file {
        Some(ref file) => file_view.render_context(file, ctx.line, bounds),
        None => Ok(format!("{}\n", ErrorView::from("Could not determine location."))),
    }
}

impl EventHook for TerminalHook {
    fn on_pause(&self, ctx: &PauseContext, first: bool) -> anyhow::Result<()> {
        let source = ctx
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ctx.url.clone());
        let function = match ctx.function_name.as_str() {
            "" => "<anonymous>",
            name => name,
        };

        self.printer.print(format!(
            "\n{} {}:{} ({})",
            PauseView::from("Paused at"),
            FilePathView::from(source),
            ctx.line,
            FunctionNameView::from(function),
        ));

        if first {
            self.printer
                .print(render_context(&self.file_view, ctx, self.context_lines)?);
        }
        Ok(())
    }

    fn on_resume(&self) -> anyhow::Result<()> {
        self.printer.print(PauseView::from("Resumed"));
        Ok(())
    }
}
