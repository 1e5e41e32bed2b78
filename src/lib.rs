//! Pause a running process in place and hand it over to an interactive inspector session.
//!
//! The crate has two halves. [`bootstrap`] runs inside the target process: it opens the
//! runtime debug endpoint, launches the interactive client and blocks until the session
//! ends. [`inspector`], [`snapshot`] and [`ui`] make up the client: a message-correlated
//! protocol session, the fixture generator and the console on top of them.

pub mod bootstrap;
pub mod inspector;
pub mod log;
pub mod snapshot;
pub mod ui;
