use anyhow::Context;
use breakin::inspector::rpc::Transport;
use breakin::inspector::tracer::FileTracer;
use breakin::inspector::ws;
use breakin::snapshot::Strategy;
use breakin::ui::config::{self, FileConfig, Theme, UIConfig};
use breakin::ui::console::AppBuilder;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Debug endpoint of a paused process, `host:port`.
    target: String,

    /// Number of source lines shown around the pause location.
    #[clap(long)]
    context_lines: Option<usize>,

    /// Default fixture file for `.snap`.
    #[clap(long)]
    snap_file: Option<PathBuf>,

    /// Name of the function that requests a pause.
    #[clap(long)]
    trigger: Option<String>,

    /// Interval between endpoint discovery attempts, in milliseconds.
    #[clap(long)]
    poll_interval_ms: Option<u64>,

    /// Where snapshot values are serialized: `in-context` or `client`.
    #[clap(long)]
    serializer: Option<String>,

    /// Syntax highlighting theme, `none` disables coloring.
    #[clap(long)]
    theme: Option<String>,

    /// Configuration file (default: ~/.config/breakin/config.toml).
    #[clap(long)]
    config: Option<PathBuf>,

    /// Append protocol traffic into a file.
    #[clap(long)]
    trace_file: Option<PathBuf>,
}

impl Args {
    fn ui_config(&self) -> anyhow::Result<UIConfig> {
        let mut config = FileConfig::from_file(self.config.as_deref())
            .unwrap_or_default()
            .apply(UIConfig::default());

        if let Some(lines) = self.context_lines {
            config.context_lines = lines;
        }
        if let Some(ref snap_file) = self.snap_file {
            config.snap_file = snap_file.clone();
        }
        if let Some(ref trigger) = self.trigger {
            config.trigger = trigger.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ref serializer) = self.serializer {
            config.serializer = Strategy::from_str(serializer)
                .with_context(|| format!("unknown serializer `{serializer}`"))?;
        }
        if let Some(ref theme) = self.theme {
            config.theme =
                Theme::from_str(theme).with_context(|| format!("unknown theme `{theme}`"))?;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    config::set(args.ui_config()?);
    let config = config::current();

    let conn = ws::connect(&args.target, config.poll_interval)
        .with_context(|| format!("connect to {}", args.target))?;

    let mut transport = Transport::new(conn);
    if let Some(ref path) = args.trace_file {
        transport = transport.with_tracer(FileTracer::new(path)?);
    }

    let app = AppBuilder::new(config).build(transport)?;
    app.run()?;

    Ok(())
}
