use clap::Parser;
use heli_exchange::protocol::{
    Exchange, ExchangeConfig, Mode, PeerDirectory, PushStrategy, TransitionStore,
};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "heli-exchange")]
#[command(about = "Exchange transitions with a DB server")]
#[command(version)]
struct Cli {
    /// DB server address (repeatable; the first one is used)
    #[arg(long = "peer")]
    peers: Vec<IpAddr>,

    #[arg(long)]
    port: Option<u16>,

    /// Role of this side: source (RX_SERVER) or sink (RX_HELI)
    #[arg(long)]
    mode: Option<Mode>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// File with one item per line to send in source mode
    #[arg(long)]
    items: Option<PathBuf>,

    /// Stream the whole store in the background instead of one item per ACK
    #[arg(long)]
    bulk: bool,
}

impl Cli {
    fn exchange_config(&self) -> Result<ExchangeConfig, String> {
        let mut config = match &self.config {
            Some(path) => ExchangeConfig::from_file(path).map_err(|e| e.to_string())?,
            None => ExchangeConfig::default(),
        };
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.bulk {
            config.push_strategy = PushStrategy::Bulk;
        }
        Ok(config)
    }

    fn load_items(&self) -> Result<TransitionStore<String>, String> {
        let Some(path) = &self.items else {
            return Ok(TransitionStore::new());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let (config, store) = match cli.exchange_config().and_then(|c| Ok((c, cli.load_items()?))) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let exchange = Exchange::new(
        config,
        Arc::new(store),
        PeerDirectory::from_peers(cli.peers.iter().copied()),
    );

    let report = match exchange.start().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Session failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("Failed to render session report: {}", e),
    }
    if exchange.config().mode == Mode::Sink {
        for item in exchange.store().drain() {
            println!("{item}");
        }
    }
    ExitCode::SUCCESS
}
