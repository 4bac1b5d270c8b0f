use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;

use pipemon::config::Config;
use pipemon::session::SessionSource;
use pipemon::{display, Connection, DisplayMode, SyncLoop};

#[derive(Parser, Debug)]
#[command(name = "pipemon")]
#[command(about = "Show the default PipeWire sink's volume on wob", long_about = None)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,
    /// Configuration file (default: ~/.config/pipemon/config.toml)
    #[arg(long, env = "PIPEMON_CONFIG")]
    config: Option<PathBuf>,
    /// Write to a FIFO read by a running wob instead of spawning one
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "")]
    fifo: Option<String>,
    /// Show the current volume once at startup
    #[arg(long)]
    push_initial: bool,
    /// Media class whose default node is tracked
    #[arg(long, value_name = "CLASS")]
    media_class: Option<String>,
    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(ref path) = self.fifo {
            config.display.mode = DisplayMode::Fifo;
            if !path.is_empty() {
                config.display.path = Some(path.clone());
            }
        }
        if self.push_initial {
            config.monitor.push_initial = true;
        }
        if let Some(ref class) = self.media_class {
            config.monitor.media_class = class.clone();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "pipemon", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            let code = e.downcast_ref::<pipemon::Error>().map_or(1, pipemon::Error::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())
        .map_err(pipemon::Error::from)
        .context("loading configuration")?;
    cli.apply(&mut config);

    if cli.print_config {
        print!("{}", config.to_toml().context("serializing configuration")?);
        return Ok(());
    }

    let shutdown = shutdown_signal().context("installing signal handlers")?;
    tokio::pin!(shutdown);

    let connecting = Connection::connect(&config.session);
    let Some(connection) = unless_shutdown(connecting, &mut shutdown).await else {
        return Ok(());
    };
    let mut connection = connection.map_err(pipemon::Error::from)?;

    let sink = match display::open(&config.display) {
        Ok(sink) => sink,
        Err(e) => {
            connection.close().await;
            return Err(pipemon::Error::from(e).into());
        }
    };

    let mut monitor = SyncLoop::new(sink, &config.monitor);
    let result = monitor.run(&mut connection, &config.session.plugins, &mut shutdown).await;

    monitor.close().await;
    connection.close().await;

    result.map_err(Into::into)
}

/// Resolves on the first SIGINT or SIGTERM.
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(async move {
        tokio::select! {
            _ = terminate.recv() => tracing::info!("Received SIGTERM"),
            _ = interrupt.recv() => tracing::info!("Received SIGINT"),
        }
    })
}

/// `None` when `shutdown` resolves before `fut` does.
async fn unless_shutdown<T>(fut: impl Future<Output = T>, shutdown: impl Future<Output = ()>) -> Option<T> {
    tokio::select! {
        biased;
        _ = shutdown => None,
        value = fut => Some(value),
    }
}
