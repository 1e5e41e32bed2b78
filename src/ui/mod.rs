//! Interactive client: console commands, configuration and the terminal application.

pub mod command;
pub mod config;
pub mod console;
mod syntax;
