use crate::ui::command::parser::{
    COMMAND_PREFIX, CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT, HELP_COMMAND, HELP_COMMAND_SHORT,
    RELOAD_COMMAND, SNAP_COMMAND, WHEREAMI_COMMAND,
};
use chumsky::prelude::{any, just};
use chumsky::text::whitespace;
use chumsky::{extra, text, Parser};
use crossterm::style::{Color, Stylize};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::HistoryHinter;
use rustyline::history::MemHistory;
use rustyline::line_buffer::LineBuffer;
use rustyline::{Changeset, CompletionType, Config, Context, Editor};
use rustyline_derive::{Helper, Hinter, Validator};
use std::borrow::Cow;
use std::borrow::Cow::{Borrowed, Owned};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use trie_rs::{Trie, TrieBuilder};

struct CommandHint {
    short: Option<String>,
    long: String,
    subcommands: Vec<String>,
}

impl CommandHint {
    fn long(&self) -> String {
        format!("{COMMAND_PREFIX}{}", self.long)
    }

    fn display_with_short(&self) -> String {
        if let Some(ref short) = self.short {
            if self.long.starts_with(short) {
                format!(
                    "{COMMAND_PREFIX}{}{}",
                    short.clone().bold().underlined(),
                    &self.long[short.len()..]
                )
            } else {
                format!(
                    "{}|{COMMAND_PREFIX}{}",
                    self.long(),
                    short.clone().bold().underlined()
                )
            }
        } else {
            self.long()
        }
    }
}

impl From<&str> for CommandHint {
    fn from(value: &str) -> Self {
        CommandHint {
            short: None,
            long: value.to_string(),
            subcommands: vec![],
        }
    }
}

impl From<(&str, &str)> for CommandHint {
    fn from((short, long): (&str, &str)) -> Self {
        CommandHint {
            short: Some(short.to_string()),
            long: long.to_string(),
            subcommands: vec![],
        }
    }
}

pub struct CommandCompleter {
    commands: Vec<CommandHint>,
    subcommand_hints: HashMap<String, Vec<String>>,
    var_hints: Trie<u8>,
}

impl CommandCompleter {
    fn new(commands: impl IntoIterator<Item = CommandHint>) -> Self {
        let commands: Vec<CommandHint> = commands.into_iter().collect();
        let subcommand_hints = commands
            .iter()
            .flat_map(|cmd| {
                let mut hints = vec![(cmd.long.clone(), cmd.subcommands.clone())];
                if let Some(ref short) = cmd.short {
                    hints.push((short.clone(), cmd.subcommands.clone()));
                }
                hints
            })
            .collect::<HashMap<String, Vec<String>>>();

        Self {
            commands,
            subcommand_hints,
            var_hints: TrieBuilder::new().build(),
        }
    }

    /// Replace names of variables visible at the pause location.
    pub fn replace_var_hints(&mut self, variables: impl IntoIterator<Item = String>) {
        let mut builder = TrieBuilder::new();
        variables.into_iter().for_each(|var| {
            builder.push(var);
        });
        self.var_hints = builder.build();
    }

    fn var_variants(&self, prefix: &str) -> Vec<String> {
        self.var_hints
            .predictive_search(prefix)
            .iter()
            .map(|var| String::from_utf8_lossy(var.as_slice()).into_owned())
            .collect()
    }
}

#[derive(Debug, PartialEq)]
enum CompletableInput<'a> {
    /// Console command with an optional argument part.
    Command(&'a str, Option<&'a str>),
    /// Expression, contains a trailing identifier.
    Expression(&'a str),
}

impl<'a> CompletableInput<'a> {
    fn recognize(line: &'a str) -> Option<CompletableInput<'a>> {
        if line.starts_with(COMMAND_PREFIX) {
            let cmd = just::<_, _, extra::Default>(COMMAND_PREFIX)
                .ignore_then(text::ident())
                .then_ignore(whitespace().at_least(1))
                .then(any().repeated().to_slice().or_not())
                .map(|(cmd, arg): (&str, Option<&str>)| CompletableInput::Command(cmd, arg));
            return cmd.parse(line).into_result().ok();
        }

        let start = line
            .char_indices()
            .rev()
            .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .map(|(pos, c)| pos + c.len_utf8())
            .unwrap_or(0);
        // property access is not completed
        if line[..start].ends_with('.') {
            return None;
        }
        Some(CompletableInput::Expression(&line[start..]))
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        match CompletableInput::recognize(line) {
            Some(CompletableInput::Command(cmd, mb_arg)) => {
                if let Some(subcommands) = self.subcommand_hints.get(cmd) {
                    let arg = mb_arg.unwrap_or_default();
                    let pos = line.len() - arg.len();
                    let subcommands = subcommands
                        .iter()
                        .filter(|&subcmd| subcmd.starts_with(arg))
                        .map(|subcmd| Pair {
                            display: subcmd.to_string(),
                            replacement: subcmd.to_string(),
                        })
                        .collect();
                    return Ok((pos, subcommands));
                }
                Ok((0, vec![]))
            }
            Some(CompletableInput::Expression(ident)) if !ident.is_empty() => {
                let pos = line.len() - ident.len();
                let pairs = self
                    .var_variants(ident)
                    .into_iter()
                    .map(|var| Pair {
                        display: var.clone(),
                        replacement: var,
                    })
                    .collect();
                Ok((pos, pairs))
            }
            None | Some(CompletableInput::Expression(_)) if !line.starts_with(COMMAND_PREFIX) => {
                Ok((0, vec![]))
            }
            _ => {
                let pairs = self
                    .commands
                    .iter()
                    .filter(|&cmd| cmd.long().starts_with(line))
                    .map(|cmd| Pair {
                        display: cmd.display_with_short(),
                        replacement: cmd.long(),
                    })
                    .collect();
                Ok((0, pairs))
            }
        }
    }
}

#[derive(Helper, Hinter, Validator)]
pub struct RLHelper {
    pub completer: Arc<Mutex<CommandCompleter>>,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    pub colored_prompt: String,
}

impl Completer for RLHelper {
    type Candidate = <CommandCompleter as Completer>::Candidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        self.completer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .complete(line, pos, ctx)
    }

    fn update(&self, line: &mut LineBuffer, start: usize, elected: &str, cl: &mut Changeset) {
        self.completer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(line, start, elected, cl)
    }
}

impl Highlighter for RLHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(format!("{}", hint.with(Color::Grey)))
    }
}

fn command_hints() -> Vec<CommandHint> {
    let commands = [RELOAD_COMMAND, SNAP_COMMAND, CONTINUE_COMMAND, WHEREAMI_COMMAND, HELP_COMMAND];

    vec![
        RELOAD_COMMAND.into(),
        SNAP_COMMAND.into(),
        (CONTINUE_COMMAND_SHORT, CONTINUE_COMMAND).into(),
        WHEREAMI_COMMAND.into(),
        CommandHint {
            short: Some(HELP_COMMAND_SHORT.to_string()),
            long: HELP_COMMAND.to_string(),
            subcommands: commands.iter().map(ToString::to_string).collect(),
        },
    ]
}

pub fn create_editor(promt: &str) -> anyhow::Result<Editor<RLHelper, MemHistory>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let h = RLHelper {
        completer: Arc::new(Mutex::new(CommandCompleter::new(command_hints()))),
        hinter: HistoryHinter {},
        colored_prompt: format!("{}", promt.with(Color::Blue)),
    };

    let mut editor = Editor::with_history(config, MemHistory::new())?;
    editor.set_helper(Some(h));
    Ok(editor)
}
