//! WebSocket connection to a debug endpoint and endpoint discovery.

use crate::inspector::protocol::TargetInfo;
use crate::inspector::rpc::Connection;
use crate::inspector::Error;
use crate::{bi_debug, bi_info};
use std::io::ErrorKind;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// How long a single [`Connection::recv`] call may block.
const READ_POLL_WINDOW: Duration = Duration::from_millis(50);

/// Validated `host:port` pair of a debug endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn parse(target: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidTarget(target.to_string());
        let (host, port) = target.trim().rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    fn listing_url(&self) -> String {
        format!("http://{}:{}/json/list", self.host, self.port)
    }
}

/// Poll the endpoint discovery listing every `interval` until some target exposes a websocket url.
pub fn discover(target: &Target, interval: Duration) -> Result<String, Error> {
    let listing = target.listing_url();
    loop {
        match reqwest::blocking::get(&listing).and_then(|resp| resp.json::<Vec<TargetInfo>>()) {
            Ok(targets) => {
                if let Some(url) = targets
                    .into_iter()
                    .find_map(|info| info.web_socket_debugger_url)
                {
                    bi_debug!(target: "transport", "discovered {url}");
                    return Ok(url);
                }
                bi_debug!(target: "transport", "{listing} has no debuggable targets yet");
            }
            Err(e) => {
                bi_debug!(target: "transport", "endpoint is not ready: {e}");
            }
        }
        thread::sleep(interval);
    }
}

pub struct WsConnection {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl WsConnection {
    pub fn open(url: &str) -> Result<Self, Error> {
        let (socket, _) = tungstenite::connect(url)?;
        match socket.get_ref() {
            MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(READ_POLL_WINDOW))?,
            _ => return Err(Error::InvalidTarget(url.to_string())),
        }
        bi_info!(target: "transport", "connected to {url}");
        Ok(Self { socket })
    }
}

/// Discover websocket url of a `host:port` endpoint and connect to it.
pub fn connect(target: &str, poll_interval: Duration) -> Result<WsConnection, Error> {
    let target = Target::parse(target)?;
    let url = discover(&target, poll_interval)?;
    WsConnection::open(&url)
}

impl Connection for WsConnection {
    fn send(&mut self, frame: &str) -> Result<(), Error> {
        self.socket.send(Message::Text(frame.to_string()))?;
        Ok(())
    }

    fn recv(&mut self) -> Result<Option<String>, Error> {
        match self.socket.read() {
            Ok(Message::Text(text)) => Ok(Some(text)),
            Ok(Message::Binary(bytes)) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Ok(Message::Close(_)) => Err(Error::ConnectionClosed),
            // ping/pong are answered by tungstenite itself
            Ok(_) => Ok(None),
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                Ok(None)
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Err(Error::ConnectionClosed)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        match self.socket.close(None) {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
