//! Request/response correlation over a message connection.

use crate::inspector::protocol::{Event, Inbound, Request, RequestId};
use crate::inspector::tracer::FileTracer;
use crate::inspector::Error;
use crate::{bi_debug, bi_warn};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

/// Message-oriented, bidirectional connection to a debug endpoint.
pub trait Connection {
    /// Write a single text frame.
    fn send(&mut self, frame: &str) -> Result<(), Error>;

    /// Read a next text frame. Return `Ok(None)` if nothing arrived during the poll window.
    fn recv(&mut self) -> Result<Option<String>, Error>;

    /// Close connection, default implementation do nothing.
    fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

type Settlement = Result<Value, Error>;

/// Handle of a request waiting for its response.
pub struct PendingCall {
    id: RequestId,
    settlement: Receiver<Settlement>,
}

impl PendingCall {
    pub fn id(&self) -> RequestId {
        self.id
    }
}

/// Out-of-band request issued when an interrupt flag is raised.
struct Interrupt {
    flag: Arc<AtomicBool>,
    method: &'static str,
}

/// Owns a connection, assigns request ids and routes inbound messages.
///
/// Responses settle the request with the same id, whatever order they arrive in. Responses
/// for unknown ids are dropped. Everything else is queued as an event until someone asks
/// for it with [`Transport::next_event`].
pub struct Transport<C: Connection> {
    conn: C,
    state: ConnectionState,
    next_id: RequestId,
    pending: HashMap<RequestId, Sender<Settlement>>,
    events: VecDeque<Event>,
    interrupt: Option<Interrupt>,
    tracer: Option<FileTracer>,
}

impl<C: Connection> Transport<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            state: ConnectionState::Connecting,
            next_id: 1,
            pending: HashMap::new(),
            events: VecDeque::new(),
            interrupt: None,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: FileTracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Issue `method` request (without waiting for a response) each time the `flag` is raised.
    pub fn set_interrupt(&mut self, flag: Arc<AtomicBool>, method: &'static str) {
        self.interrupt = Some(Interrupt { flag, method });
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Mark connection as open, requests are accepted from now on.
    pub fn open(&mut self) {
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Open;
        }
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Serialize and write a request, return a handle for its future response.
    pub fn send(&mut self, method: &str, params: Value) -> Result<PendingCall, Error> {
        if self.state == ConnectionState::Closed {
            return Err(Error::ConnectionClosed);
        }

        let id = self.next_id;
        self.next_id += 1;

        let frame = serde_json::to_string(&Request { id, method, params })?;
        let (tx, rx) = mpsc::channel();
        debug_assert!(!self.pending.contains_key(&id));
        self.pending.insert(id, tx);

        if let Some(tracer) = &self.tracer {
            tracer.outgoing(&frame);
        }
        if let Err(e) = self.conn.send(&frame) {
            self.pending.remove(&id);
            return Err(e);
        }

        bi_debug!(target: "transport", "request #{id} {method}");
        Ok(PendingCall {
            id,
            settlement: rx,
        })
    }

    /// Send a request whose response is not interesting.
    pub fn notify(&mut self, method: &str, params: Value) -> Result<RequestId, Error> {
        self.send(method, params).map(|call| call.id)
    }

    /// Block until a response for the call arrives.
    pub fn wait(&mut self, call: PendingCall) -> Result<Value, Error> {
        loop {
            match call.settlement.try_recv() {
                Ok(settlement) => return settlement,
                Err(TryRecvError::Disconnected) => return Err(Error::ConnectionClosed),
                Err(TryRecvError::Empty) => {
                    self.poll()?;
                }
            }
        }
    }

    /// Send a request and wait for its response.
    pub fn call(&mut self, method: &str, params: Value) -> Result<Value, Error> {
        let call = self.send(method, params)?;
        self.wait(call)
    }

    /// Pop the oldest queued event.
    pub fn next_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Read at most one message from a connection and route it.
    /// Return `true` if a message was received.
    pub fn poll(&mut self) -> Result<bool, Error> {
        if self.state == ConnectionState::Closed {
            return Err(Error::ConnectionClosed);
        }

        if let Some(interrupt) = &self.interrupt {
            if interrupt.flag.swap(false, Ordering::SeqCst) {
                let method = interrupt.method;
                bi_debug!(target: "transport", "interrupted, issue {method}");
                self.notify(method, Value::Object(Default::default()))?;
            }
        }

        let frame = match self.conn.recv() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(false),
            Err(e) => {
                self.teardown();
                return Err(e);
            }
        };

        if let Some(tracer) = &self.tracer {
            tracer.incoming(&frame);
        }

        match Inbound::parse(&frame) {
            Ok(inbound) => self.route(inbound),
            Err(e) => bi_warn!(target: "transport", "skip inbound message: {e:#}"),
        }
        Ok(true)
    }

    fn route(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Response { id, outcome } => match self.pending.remove(&id) {
                Some(tx) => {
                    // receiver may be dropped by `notify`, then result is ignored
                    _ = tx.send(outcome.map_err(Error::Protocol));
                }
                None => {
                    bi_debug!(target: "transport", "drop response for unknown request #{id}");
                }
            },
            Inbound::Event(event) => {
                bi_debug!(target: "transport", "event {}", event.method);
                self.events.push_back(event);
            }
        }
    }

    /// Close the connection, all pending requests are rejected.
    pub fn close(&mut self) {
        if self.state != ConnectionState::Closed {
            _ = self.conn.close();
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        self.state = ConnectionState::Closed;
        for (_, tx) in self.pending.drain() {
            _ = tx.send(Err(Error::ConnectionClosed));
        }
    }
}
