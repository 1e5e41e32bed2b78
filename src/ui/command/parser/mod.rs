use super::{Command, CommandError, CommandResult};
use std::path::PathBuf;

/// Prefix of the console commands, input without it is an expression.
pub const COMMAND_PREFIX: char = '.';

pub const RELOAD_COMMAND: &str = "reload";
pub const SNAP_COMMAND: &str = "snap";
pub const CONTINUE_COMMAND: &str = "continue";
pub const CONTINUE_COMMAND_SHORT: &str = "c";
pub const WHEREAMI_COMMAND: &str = "whereami";
pub const HELP_COMMAND: &str = "help";
pub const HELP_COMMAND_SHORT: &str = "h";

use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, text, Boxed, Parser};

type Err<'a> = extra::Err<Rich<'a, char>>;

fn command<'a, I>(ctx: &'static str, inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: chumsky::Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).labelled(ctx).boxed()
}

impl Command {
    /// Parse input string into command.
    pub fn parse(input: &str) -> CommandResult<Command> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Command::SkipInput);
        }

        match input.strip_prefix(COMMAND_PREFIX) {
            // fractional number literal like `.5 * 2`
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => {
                Ok(Command::Evaluate(input.to_string()))
            }
            Some(rest) => Self::parser()
                .parse(rest)
                .into_result()
                .map_err(|e| CommandError::Parsing(e[0].to_string())),
            None => Ok(Command::Evaluate(input.to_string())),
        }
    }

    fn parser<'a>() -> impl chumsky::Parser<'a, &'a str, Command, Err<'a>> {
        let op = |sym| just(sym).padded();
        let op2 = |full, short| op(full).or(op(short));

        let reload = op(RELOAD_COMMAND).to(Command::Reload);

        let snap = just(SNAP_COMMAND)
            .ignore_then(
                text::whitespace()
                    .at_least(1)
                    .ignore_then(any().repeated().to_slice())
                    .or_not(),
            )
            .map(|file: Option<&str>| {
                let file = file.map(str::trim).filter(|f| !f.is_empty());
                Command::Snapshot(file.map(PathBuf::from))
            })
            .boxed();

        let r#continue = op2(CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT).to(Command::Continue);

        let whereami = op(WHEREAMI_COMMAND).to(Command::WhereAmI);

        let help = op2(HELP_COMMAND, HELP_COMMAND_SHORT)
            .ignore_then(text::ident().or_not())
            .map(|s| Command::Help {
                command: s.map(ToOwned::to_owned),
                reason: None,
            })
            .padded()
            .boxed();

        choice((
            command(RELOAD_COMMAND, reload),
            command(SNAP_COMMAND, snap),
            command(CONTINUE_COMMAND, r#continue),
            command(WHEREAMI_COMMAND, whereami),
            command(HELP_COMMAND, help),
        ))
        .map_err(|e| {
            let span = e.span();
            if span.start == 0 && span.end == 0 {
                Rich::custom(*e.span(), "type .help for list of commands")
            } else {
                e
            }
        })
    }
}

#[test]
fn test_parser() {
    struct TestCase {
        inputs: Vec<&'static str>,
        command_matcher: fn(result: Result<Command, CommandError>),
    }
    let cases = vec![
        TestCase {
            inputs: vec!["", "   ", "\t"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::SkipInput);
            },
        },
        TestCase {
            inputs: vec!["user.name", "  user.name  "],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Evaluate("user.name".to_string()));
            },
        },
        TestCase {
            inputs: vec![".5 + 1"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Evaluate(".5 + 1".to_string()));
            },
        },
        TestCase {
            inputs: vec![".reload", " .reload ", ".reload  "],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Reload);
            },
        },
        TestCase {
            inputs: vec![".snap", " .snap  "],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Snapshot(None));
            },
        },
        TestCase {
            inputs: vec![".snap out.test.js", ".snap   out.test.js  "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Snapshot(Some(PathBuf::from("out.test.js")))
                );
            },
        },
        TestCase {
            inputs: vec![".snap fixtures/my snap.test.js"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Snapshot(Some(PathBuf::from("fixtures/my snap.test.js")))
                );
            },
        },
        TestCase {
            inputs: vec![".continue", ".c", " .c "],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Continue);
            },
        },
        TestCase {
            inputs: vec![".whereami", ".whereami "],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::WhereAmI);
            },
        },
        TestCase {
            inputs: vec![".help", ".h"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Help { command: None, reason: None }
                ));
            },
        },
        TestCase {
            inputs: vec![".help snap", ".h  snap "],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Help { command: Some(cmd), reason: None } if cmd == "snap"
                ));
            },
        },
        TestCase {
            inputs: vec![".snapshot", ".cont", ".reload now", ".whereami 1", ".quit", "."],
            command_matcher: |result| {
                assert!(matches!(result, Err(CommandError::Parsing(_))));
            },
        },
    ];

    for case in cases {
        for input in case.inputs {
            let result = Command::parse(input);
            (case.command_matcher)(result);
        }
    }
}
