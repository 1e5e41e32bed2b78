use crate::inspector::rpc::{Connection, Transport};
use crate::inspector::{Error, ReloadOutcome, Session, SessionState};
use crate::ui::command::{
    evaluate, r#continue, reload, snap, whereami, Command, CommandError, CommandResult,
};
use crate::ui::config::UIConfig;
use crate::ui::console::editor::{create_editor, CommandCompleter, RLHelper};
use crate::ui::console::file::FileView;
use crate::ui::console::help::help_for_command;
use crate::ui::console::hook::{render_context, TerminalHook};
use crate::ui::console::print::style::{ErrorView, FilePathView, KeywordView};
use crate::ui::console::print::Printer;
use crate::ui::console::variable::render_evaluation;
use crate::{bi_debug, weak_error};
use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::history::MemHistory;
use rustyline::Editor;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

mod editor;
mod file;
mod help;
pub mod hook;
pub mod print;
mod variable;

const PROMT: &str = "breakin> ";

type BIEditor = Editor<RLHelper, MemHistory>;

pub struct AppBuilder {
    config: &'static UIConfig,
}

impl AppBuilder {
    pub fn new(config: &'static UIConfig) -> Self {
        Self { config }
    }

    /// Build a console application over an established connection.
    pub fn build<C: Connection>(
        self,
        transport: Transport<C>,
    ) -> anyhow::Result<TerminalApplication<C>> {
        let mut editor = create_editor(PROMT)?;
        let completer = Arc::clone(
            &editor
                .helper_mut()
                .context("line editor without helper")?
                .completer,
        );

        let printer = Printer;
        let file_view = Rc::new(FileView::new(self.config.theme));
        let hook = TerminalHook::new(printer, file_view.clone(), self.config.context_lines);
        let session = Session::new(transport, &self.config.trigger, hook);

        Ok(TerminalApplication {
            session,
            editor,
            completer,
            file_view,
            printer,
            config: self.config,
            interrupt: Arc::new(AtomicBool::new(false)),
            hinted_epoch: 0,
        })
    }
}

pub struct TerminalApplication<C: Connection> {
    session: Session<C>,
    editor: BIEditor,
    completer: Arc<Mutex<CommandCompleter>>,
    file_view: Rc<FileView>,
    printer: Printer,
    config: &'static UIConfig,
    /// Raised by Ctrl+C outside of the line editor.
    interrupt: Arc<AtomicBool>,
    /// Pause epoch for which variable hints was collected.
    hinted_epoch: u64,
}

impl<C: Connection> TerminalApplication<C> {
    /// Wait for the first pause and run the read-eval-print loop until the debugee resumes
    /// or the connection is lost.
    pub fn run(mut self) -> anyhow::Result<()> {
        {
            let interrupt = self.interrupt.clone();
            ctrlc::set_handler(move || interrupt.store(true, Ordering::SeqCst))?;
        }
        self.session.set_interrupt(self.interrupt.clone());

        self.session.open()?;
        match self.session.wait_for_pause() {
            Ok(()) => {}
            Err(Error::ConnectionClosed) => {
                bi_debug!(target: "console", "session is over before first pause");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        loop {
            self.update_completer_variables();

            match self.editor.readline(PROMT) {
                Ok(input) => {
                    _ = self.editor.add_history_entry(&input);
                    if let Err(e) = self.handle_command(&input) {
                        if !self.handle_error(e) {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    if let Err(e) = r#continue::Handler::new(&mut self.session).handle() {
                        self.handle_error(e);
                    }
                    break;
                }
                Err(err) => {
                    self.printer.print(ErrorView::from(format!("error: {err:#}")));
                    _ = self.session.resume();
                    break;
                }
            }

            if let Err(e) = self.session.dispatch_events() {
                self.handle_error(e.into());
                break;
            }
            if matches!(
                self.session.state(),
                SessionState::Resumed | SessionState::Closed
            ) {
                break;
            }
        }

        self.session.close();
        Ok(())
    }

    /// Print an error, return false if the session can't continue.
    fn handle_error(&self, e: CommandError) -> bool {
        match e {
            CommandError::Parsing(_) => {
                self.printer.print(ErrorView::from(e));
            }
            CommandError::FileRender(_) => {
                self.printer
                    .print(ErrorView::from(format!("render file error: {e:#}")));
            }
            CommandError::Handle(Error::Evaluation(ref description)) => {
                self.printer.print(ErrorView::from(description));
            }
            CommandError::Handle(ref err) if err.is_fatal() => {
                self.printer.print(ErrorView::from("shutdown client"));
                self.printer
                    .print(ErrorView::from(format!("fatal session error: {e:#}")));
                return false;
            }
            CommandError::Handle(_) => {
                self.printer.print(ErrorView::from(format!("error: {e:#}")));
            }
        }
        true
    }

    fn update_completer_variables(&mut self) {
        let epoch = self.session.epoch();
        if epoch == self.hinted_epoch {
            return;
        }
        self.hinted_epoch = epoch;

        if let Some(vars) = weak_error!(self.session.variable_names()) {
            self.completer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .replace_var_hints(vars);
        }
    }

    fn handle_command(&mut self, cmd: &str) -> CommandResult<()> {
        match Command::parse(cmd)? {
            Command::Evaluate(expression) => {
                let evaluation = evaluate::Handler::new(&mut self.session).handle(&expression)?;
                let text = render_evaluation(&evaluation, self.config.theme)
                    .map_err(CommandError::FileRender)?;
                self.printer.print(text);
            }
            Command::Reload => {
                let (path, outcome) = reload::Handler::new(&mut self.session).handle()?;
                self.file_view.invalidate(&path);
                self.printer
                    .print(format!("Reloading {}...", FilePathView::from(path.display())));
                match outcome {
                    ReloadOutcome::Applied {
                        status,
                        stack_changed,
                    } => {
                        self.printer
                            .print(format!("Hot-fix applied! (status: {status})"));
                        if stack_changed {
                            self.printer
                                .print("Stack changed. You may need to step out/in.");
                        }
                    }
                    ReloadOutcome::Rejected(reason) => {
                        self.printer
                            .print(ErrorView::from(format!("Hot-fix failed: {reason}")));
                    }
                }
            }
            Command::Snapshot(file) => {
                let path = file.unwrap_or_else(|| self.config.snap_file.clone());
                self.printer.print(format!(
                    "Generating snapshot to {}...",
                    FilePathView::from(path.display())
                ));

                let report =
                    snap::Handler::new(&mut self.session, self.config.serializer).handle(&path)?;
                self.printer.print(format!(
                    "Snapshot saved to {} ({} variables)",
                    FilePathView::from(report.path.display()),
                    report.captured
                ));
                for name in report.failed {
                    self.printer.print(format!(
                        "{} {} was not serialized",
                        ErrorView::from("warning:"),
                        KeywordView::from(name)
                    ));
                }
            }
            Command::Continue => {
                r#continue::Handler::new(&mut self.session).handle()?;
            }
            Command::WhereAmI => {
                let ctx = whereami::Handler::new(&self.session).handle()?;
                let text = render_context(&self.file_view, ctx, self.config.context_lines)
                    .map_err(CommandError::FileRender)?;
                self.printer.print(text);
            }
            Command::Help { reason, command } => {
                if let Some(reason) = reason {
                    self.printer.print(reason);
                }
                self.printer.print(help_for_command(command.as_deref()));
            }
            Command::SkipInput => {}
        }

        Ok(())
    }
}
