use crate::inspector::protocol::ProtocolError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- transport errors ------------------------------------------
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("websocket: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("invalid target `{0}`, expected host:port")]
    InvalidTarget(String),
    #[error("malformed protocol message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unrecognized protocol message: {0}")]
    UnrecognizedMessage(String),
    #[error("connection closed")]
    ConnectionClosed,

    // --------------------------------- protocol errors -------------------------------------------
    #[error("{0}")]
    Protocol(ProtocolError),

    // --------------------------------- evaluation errors -----------------------------------------
    #[error("{0}")]
    Evaluation(String),

    // --------------------------------- pause context errors --------------------------------------
    #[error("debugee is not paused")]
    NotPaused,
    #[error("pause event without call frames")]
    EmptyStack,
    #[error("nothing to reload: current location has no source file or script")]
    NothingToReload,
    #[error("no scope information available")]
    NoScopeInfo,

    // --------------------------------- resource errors -------------------------------------------
    #[error("source file {0:?}: {1}")]
    SourceFile(PathBuf, std::io::Error),
    #[error("fixture file {0:?}: {1}")]
    FixtureFile(PathBuf, std::io::Error),

    // --------------------------------- bootstrap errors ------------------------------------------
    #[error("already running inside an interactive client")]
    NestedSession,
    #[error("acquire local port: {0}")]
    NoFreePort(std::io::Error),
    #[error("spawn interactive client {0:?}: {1}")]
    SpawnClient(PathBuf, std::io::Error),
    #[error("open debug endpoint on {0}: {1:#}")]
    EndpointOpen(String, anyhow::Error),
    #[error("pause debugee: {0:#}")]
    Pause(anyhow::Error),

    // --------------------------------- third party errors ----------------------------------------
    #[error("hook: {0}")]
    Hook(anyhow::Error),
}

impl Error {
    /// Return a hint to an interface - continue the session after error or stop the client.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::IO(_) => false,
            Error::InvalidTarget(_) => false,
            Error::Json(_) => false,
            Error::UnrecognizedMessage(_) => false,
            Error::Protocol(_) => false,
            Error::Evaluation(_) => false,
            Error::NotPaused => false,
            Error::EmptyStack => false,
            Error::NothingToReload => false,
            Error::NoScopeInfo => false,
            Error::SourceFile(_, _) => false,
            Error::FixtureFile(_, _) => false,
            Error::NestedSession => false,
            Error::NoFreePort(_) => false,
            Error::SpawnClient(_, _) => false,
            Error::EndpointOpen(_, _) => false,
            Error::Pause(_) => false,
            Error::Hook(_) => false,

            // the session cannot outlive its connection
            Error::WebSocket(_) => true,
            Error::ConnectionClosed => true,
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "inspector", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "inspector", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
