use crate::inspector::rpc::Connection;
use crate::inspector::{Evaluation, Session};
use crate::ui::command;

pub struct Handler<'a, C: Connection> {
    session: &'a mut Session<C>,
}

impl<'a, C: Connection> Handler<'a, C> {
    pub fn new(session: &'a mut Session<C>) -> Self {
        Self { session }
    }

    pub fn handle(&mut self, expression: &str) -> command::CommandResult<Evaluation> {
        Ok(self.session.evaluate(expression.trim())?)
    }
}
