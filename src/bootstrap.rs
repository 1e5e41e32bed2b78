//! In-process side of a session: open the debug endpoint of the running runtime, launch an
//! interactive client and halt the calling thread until the client lets it go.

use crate::inspector::Error;
use crate::{bi_debug, bi_info, bi_warn, weak_error};
use nix::sys::signal::{kill, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use signal_hook::{flag, low_level};
use std::env;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Environment variable set for the interactive client process.
pub const CHILD_MARKER: &str = "BREAKIN_CHILD";

/// Debug endpoint of a host runtime (for example V8 inspector of an embedded isolate).
///
/// Methods take `&self`: endpoint may be closed from a signal watcher thread while
/// another thread is blocked in [`DebugEndpoint::open`] or [`DebugEndpoint::pause`],
/// `close` must release such a thread.
pub trait DebugEndpoint: Send + Sync {
    /// Return url of an open endpoint.
    fn url(&self) -> Option<String>;
    /// Start listening on `host:port`. If `wait` is true, block until a client attaches.
    fn open(&self, host: &str, port: u16, wait: bool) -> anyhow::Result<()>;
    fn close(&self);
    /// Halt the calling thread on a debugger statement, return when a client resumes it.
    fn pause(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Interface for the debug endpoint.
    pub host: String,
    /// Interactive client program.
    pub client: PathBuf,
    /// Arguments passed to the client before `host:port`.
    pub client_args: Vec<String>,
    /// How long a client has to exit after SIGTERM before it is killed.
    pub termination_grace: Duration,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            client: default_client(),
            client_args: vec![],
            termination_grace: Duration::from_millis(500),
        }
    }
}

fn default_client() -> PathBuf {
    const CLIENT: &str = "breakin";

    which::which(CLIENT).unwrap_or_else(|_| {
        env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CLIENT)))
            .unwrap_or_else(|| PathBuf::from(CLIENT))
    })
}

#[derive(Debug)]
pub enum PauseOutcome {
    /// Client attached and resumed the caller.
    Resumed,
    /// Pause attempt aborted, caller continues as if nothing happened.
    Skipped(Error),
}

/// Pause the calling thread and hand it over to an interactive client.
///
/// Return when the session ends. Any failure before the pause is reported as
/// [`PauseOutcome::Skipped`], the spawned client (if any) is terminated.
pub fn pause_here(endpoint: Arc<dyn DebugEndpoint>, cfg: &BootstrapConfig) -> PauseOutcome {
    match try_pause_here(endpoint, cfg) {
        Ok(()) => PauseOutcome::Resumed,
        Err(e) => {
            bi_warn!(target: "bootstrap", "pause skipped: {e:#}");
            PauseOutcome::Skipped(e)
        }
    }
}

fn try_pause_here(endpoint: Arc<dyn DebugEndpoint>, cfg: &BootstrapConfig) -> Result<(), Error> {
    if env::var_os(CHILD_MARKER).is_some() {
        return Err(Error::NestedSession);
    }

    if let Some(url) = endpoint.url() {
        bi_info!(target: "bootstrap", "debug endpoint already open at {url}, close it");
        endpoint.close();
    }

    let port = free_port(&cfg.host)?;
    let target = format!("{}:{port}", cfg.host);
    let child = spawn_client(cfg, &target)?;

    bi_info!(target: "bootstrap", "waiting for a client on {target}");
    let guard = SessionGuard::install(Teardown {
        endpoint: endpoint.clone(),
        child: Mutex::new(Some(child)),
        grace: cfg.termination_grace,
        done: AtomicBool::new(false),
    });

    endpoint
        .open(&cfg.host, port, true)
        .map_err(|e| Error::EndpointOpen(target, e))?;

    endpoint.pause().map_err(Error::Pause)?;
    drop(guard);
    Ok(())
}

/// Ask the OS for an unused local port.
fn free_port(host: &str) -> Result<u16, Error> {
    let listener = TcpListener::bind((host, 0)).map_err(Error::NoFreePort)?;
    let port = listener.local_addr().map_err(Error::NoFreePort)?.port();
    Ok(port)
}

fn spawn_client(cfg: &BootstrapConfig, target: &str) -> Result<Child, Error> {
    let child = Command::new(&cfg.client)
        .args(&cfg.client_args)
        .arg(target)
        .env(CHILD_MARKER, "true")
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| Error::SpawnClient(cfg.client.clone(), e))?;
    bi_debug!(target: "bootstrap", "client started, pid {}", child.id());
    Ok(child)
}

/// Release of a paused session: close the endpoint and terminate the client. Runs once.
struct Teardown {
    endpoint: Arc<dyn DebugEndpoint>,
    child: Mutex<Option<Child>>,
    grace: Duration,
    done: AtomicBool,
}

impl Teardown {
    fn run(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }

        self.endpoint.close();
        let child = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(child) = child {
            terminate(child, self.grace);
        }
    }
}

/// Send SIGTERM to a process, kill it if it still alive after `grace` period.
fn terminate(mut child: Child, grace: Duration) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }

    let pid = Pid::from_raw(child.id() as i32);
    weak_error!(kill(pid, Signal::SIGTERM), "terminate client:");

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        match child.try_wait() {
            Ok(Some(status)) => {
                bi_debug!(target: "bootstrap", "client exit with {status}");
                return;
            }
            Ok(None) => thread::sleep(Duration::from_millis(10)),
            Err(_) => break,
        }
    }

    weak_error!(child.kill(), "kill client:");
    weak_error!(child.wait(), "wait client:");
}

/// Signals that end a session.
const SESSION_SIGNALS: [i32; 3] = [SIGINT, SIGTERM, SIGHUP];

/// Signal dispositions of a process before its first session.
///
/// Signal handlers stay installed once registered. A signal that had the default disposition
/// gets an emulated default action, armed while no session is active. Ignored signals and
/// handlers installed by the host keep working as before.
struct Dispositions {
    /// Signals with the default disposition.
    defaults: Vec<i32>,
    /// True while no session is active.
    idle: Arc<AtomicBool>,
}

static DISPOSITIONS: OnceLock<Dispositions> = OnceLock::new();

impl Dispositions {
    fn get() -> &'static Dispositions {
        DISPOSITIONS.get_or_init(|| {
            let idle = Arc::new(AtomicBool::new(true));
            let mut defaults = vec![];
            for signal in SESSION_SIGNALS {
                if !has_default_disposition(signal) {
                    continue;
                }
                let armed = flag::register_conditional_default(signal, idle.clone());
                if weak_error!(armed, "arm default signal action:").is_some() {
                    defaults.push(signal);
                }
            }
            Dispositions { defaults, idle }
        })
    }

    fn is_default(&self, signal: i32) -> bool {
        self.defaults.contains(&signal)
    }
}

fn has_default_disposition(signal: i32) -> bool {
    let Ok(signal) = Signal::try_from(signal) else {
        return false;
    };
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    // previous action is restored right away, an ignoring handler runs no code
    let Ok(prev) = (unsafe { sigaction(signal, &ignore) }) else {
        return false;
    };
    weak_error!(unsafe { sigaction(signal, &prev) }, "restore signal action:");
    matches!(prev.handler(), SigHandler::SigDfl)
}

/// Scoped session resource, teardown runs on drop or when a termination signal arrives.
/// Library logging is muted while the guard is alive: the client owns the terminal.
///
/// Signal handlers of a session are removed on drop.
struct SessionGuard {
    teardown: Arc<Teardown>,
    watcher: Option<(Handle, JoinHandle<()>)>,
}

impl SessionGuard {
    fn install(teardown: Teardown) -> Self {
        let dispositions = Dispositions::get();
        let teardown = Arc::new(teardown);
        let watcher = watch_signals(teardown.clone(), dispositions);
        dispositions.idle.store(false, Ordering::SeqCst);
        crate::log::disable();
        Self { teardown, watcher }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.teardown.run();
        if let Some((handle, watcher)) = self.watcher.take() {
            handle.close();
            if watcher.join().is_err() {
                bi_warn!(target: "bootstrap", "signal watcher panicked");
            }
        }
        Dispositions::get().idle.store(true, Ordering::SeqCst);
        crate::log::enable();
    }
}

/// Register session signal handlers and start a watcher thread, the watcher stops when
/// the returned handle is closed.
fn watch_signals(
    teardown: Arc<Teardown>,
    dispositions: &'static Dispositions,
) -> Option<(Handle, JoinHandle<()>)> {
    let mut signals = weak_error!(Signals::new(SESSION_SIGNALS), "install signal handlers:")?;
    let handle = signals.handle();

    let spawned = thread::Builder::new()
        .name("breakin-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                on_signal(signal, &teardown, dispositions);
            }
        });

    match weak_error!(spawned, "spawn signal watcher:") {
        Some(watcher) => Some((handle, watcher)),
        None => {
            handle.close();
            None
        }
    }
}

fn on_signal(signal: i32, teardown: &Teardown, dispositions: &Dispositions) {
    bi_info!(target: "bootstrap", "signal {signal}, release session");
    teardown.run();

    // interrupt ends the session only, the process continues
    if signal != SIGINT && dispositions.is_default(signal) {
        weak_error!(
            low_level::emulate_default_handler(signal),
            "default signal action:"
        );
    }
}
