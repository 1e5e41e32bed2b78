use crate::inspector::rpc::Connection;
use crate::inspector::Session;
use crate::snapshot::{self, Strategy};
use crate::ui::command;
use std::path::{Path, PathBuf};

/// Summary of a written fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotReport {
    pub path: PathBuf,
    /// Number of captured variables.
    pub captured: usize,
    /// Names of variables that was not serialized.
    pub failed: Vec<String>,
}

pub struct Handler<'a, C: Connection> {
    session: &'a mut Session<C>,
    strategy: Strategy,
}

impl<'a, C: Connection> Handler<'a, C> {
    pub fn new(session: &'a mut Session<C>, strategy: Strategy) -> Self {
        Self { session, strategy }
    }

    pub fn handle(&mut self, path: &Path) -> command::CommandResult<SnapshotReport> {
        let fixture = snapshot::generate(self.session, self.strategy)?;
        fixture.write(path)?;

        Ok(SnapshotReport {
            path: path.to_path_buf(),
            captured: fixture.bindings.len(),
            failed: fixture
                .bindings
                .iter()
                .filter(|b| b.literal.is_err())
                .map(|b| b.name.clone())
                .collect(),
        })
    }
}
