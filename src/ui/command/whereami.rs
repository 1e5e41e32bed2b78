use crate::inspector::rpc::Connection;
use crate::inspector::{PauseContext, Session};
use crate::ui::command;

pub struct Handler<'a, C: Connection> {
    session: &'a Session<C>,
}

impl<'a, C: Connection> Handler<'a, C> {
    pub fn new(session: &'a Session<C>) -> Self {
        Self { session }
    }

    /// Return current pause location.
    pub fn handle(&self) -> command::CommandResult<&'a PauseContext> {
        Ok(self.session.pause_context()?)
    }
}
