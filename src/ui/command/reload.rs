use crate::inspector::rpc::Connection;
use crate::inspector::{ReloadOutcome, Session};
use crate::ui::command;
use std::path::PathBuf;

pub struct Handler<'a, C: Connection> {
    session: &'a mut Session<C>,
}

impl<'a, C: Connection> Handler<'a, C> {
    pub fn new(session: &'a mut Session<C>) -> Self {
        Self { session }
    }

    /// Hot patch the paused script, return reloaded file and patch outcome.
    pub fn handle(&mut self) -> command::CommandResult<(PathBuf, ReloadOutcome)> {
        Ok(self.session.reload()?)
    }
}
