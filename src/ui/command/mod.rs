//! An interface to an inspector session.
//! This is the most preferred way to use a session functional from UI layer.
//!
//! Contains commands and corresponding command handlers. Command is a some sort of request to
//! the paused runtime that define an action and a list of input arguments. Command handler
//! validate command, define what exactly session must to do and return result of it.

pub mod r#continue;
pub mod evaluate;
pub mod parser;
pub mod reload;
pub mod snap;
pub mod whereami;

use crate::inspector::Error;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Parsing(String),
    #[error("render error: \n{0}")]
    FileRender(anyhow::Error),
    #[error(transparent)]
    Handle(#[from] Error),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// External commands that can be processed by the console.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Evaluate expression in the paused frame.
    Evaluate(String),
    Reload,
    /// Write a fixture into file, default file used if none.
    Snapshot(Option<PathBuf>),
    Continue,
    WhereAmI,
    SkipInput,
    Help {
        command: Option<String>,
        reason: Option<String>,
    },
}
