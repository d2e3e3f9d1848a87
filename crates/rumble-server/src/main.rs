//! rumbled: game-controller rumble daemon.
//!
//! Listens on a TCP port for one-line commands of the form
//! `<deviceIndex> <low> <high> <durationMs>` and drives the matching
//! controller's motors for the requested time.  One command per connection,
//! handled strictly one at a time.
//!
//! # Startup
//!
//! ```text
//! main()
//!  └─ load config (file, then CLI overrides)
//!  └─ init tracing
//!  └─ --write-config: save the effective config and exit
//!  └─ run()
//!       ├─ build haptic backend
//!       ├─ DeviceRegistry::open_all     -- fails if nothing can rumble
//!       ├─ CommandServer::bind          -- devices closed again on failure
//!       ├─ install_shutdown_handler     -- Ctrl-C / SIGTERM
//!       ├─ CommandServer::run           -- until shutdown is requested
//!       └─ DeviceRegistry::close_all
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rumble_server::application::context::{ServerContext, ShutdownFlag};
use rumble_server::application::devices::DeviceRegistry;
use rumble_server::infrastructure::haptics::{build_backend, BackendKind};
use rumble_server::infrastructure::network::server::CommandServer;
use rumble_server::infrastructure::signal::install_shutdown_handler;
use rumble_server::infrastructure::storage::config::{
    config_file_path, load_config_from, load_config_or_default, save_config_to, AppConfig,
    ConfigError, TrailingInputPolicy,
};

/// rumbled - drive controller rumble motors from a TCP control port
#[derive(Parser, Debug)]
#[command(name = "rumbled")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (default: platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TCP port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// IP address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Haptic device backend
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// Number of simulated controllers for the mock backend
    #[arg(long)]
    mock_devices: Option<usize>,

    /// Reject commands with tokens after the fourth field
    #[arg(long)]
    strict: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// List discovered input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    write_config: bool,
}

impl Args {
    /// Loads the config file and layers command-line overrides on top.
    ///
    /// The second value is a tolerated load error (no platform config
    /// directory) that caused built-in defaults to be used.
    fn resolve_config(&self) -> Result<(AppConfig, Option<ConfigError>), ConfigError> {
        let (mut config, fallback) = match &self.config {
            Some(path) => (load_config_from(path)?, None),
            None => load_config_or_default()?,
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(backend) = self.backend {
            config.devices.backend = backend;
        }
        if let Some(count) = self.mock_devices {
            config.devices.mock_count = count;
        }
        if self.strict {
            config.server.trailing_input = TrailingInputPolicy::Reject;
        }
        Ok((config, fallback))
    }

    /// Saves `config` to `--config`, or to the default location.
    fn save_effective_config(&self, config: &AppConfig) -> Result<PathBuf, ConfigError> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => config_file_path()?,
        };
        save_config_to(config, &path)?;
        Ok(path)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.resolve_config();

    let level = config
        .as_ref()
        .map(|(c, _)| c.daemon.log_level.as_str())
        .unwrap_or("info");
    init_tracing(level, args.verbose);

    let config = match config {
        Ok((config, fallback)) => {
            if let Some(e) = fallback {
                warn!("{e}; using built-in defaults");
            }
            config
        }
        Err(e) => {
            error!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.write_config {
        return match args.save_effective_config(&config) {
            Ok(path) => {
                info!(path = %path.display(), "configuration written");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("failed to write configuration: {e}");
                ExitCode::FAILURE
            }
        };
    }

    match run(&args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins, then `--verbose`, then the configured level.
fn init_tracing(configured: &str, verbose: bool) {
    let fallback = if verbose { "debug" } else { configured };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: &Args, config: AppConfig) -> anyhow::Result<()> {
    info!("rumbled {} starting", env!("CARGO_PKG_VERSION"));

    let settings = config
        .server
        .to_settings()
        .context("invalid [server] configuration")?;
    let backend = build_backend(config.devices.backend, config.devices.mock_count)
        .context("failed to initialise haptic backend")?;

    if args.list_devices {
        let candidates = backend
            .discover()
            .context("failed to enumerate input devices")?;
        for c in &candidates {
            let rumble = if c.supports_rumble { "rumble" } else { "-" };
            println!("{:>3}  {:<24} {:<7} {}", c.position, c.path, rumble, c.name);
        }
        return Ok(());
    }

    let registry =
        DeviceRegistry::open_all(backend.as_ref()).context("no usable controller")?;
    for (index, name, path) in registry.describe() {
        info!(index, path, "controller {name} ready");
    }

    let server = match CommandServer::bind(&settings) {
        Ok(server) => server,
        Err(e) => {
            registry.close_all();
            return Err(e).context("failed to start command server");
        }
    };

    let shutdown = ShutdownFlag::new();
    let _signals = install_shutdown_handler(shutdown.clone());
    let mut ctx = ServerContext::new(registry, shutdown);

    info!(
        addr = %server.local_addr(),
        state = ?server.state(),
        "rumbled ready.  Press Ctrl-C to exit."
    );
    let state = server.run(&mut ctx).await;

    ctx.into_registry().close_all();
    info!(?state, "rumbled closed gracefully");
    Ok(())
}
