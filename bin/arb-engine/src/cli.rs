use alloy_primitives::Address;
use clap::Parser;

/// Every option is both a flag and an environment variable, per §6 — this
/// repository's catalog, endpoints, and pricing constants are framed as
/// environment configuration first, the way the teacher's testnet CLI
/// frames `-v`/`--metrics` as flags with sane defaults.
#[derive(Parser, Debug, Clone)]
#[command(name = "arb-engine", about = "Real-time cycle-arbitrage detection over constant-product AMM pools")]
pub struct Cli {
    /// Credential for both the HTTPS hydration endpoint and the WSS
    /// subscription endpoint. No default — required.
    #[clap(long, env = "INFURA_API_KEY")]
    pub infura_api_key: String,

    /// Address of the on-chain `viewPair(address[]) -> uint112[]` aggregator
    /// the Hydrator calls.
    #[clap(long, env = "UNISWAP_VIEWER_ADDRESS")]
    pub uniswap_viewer_address: Address,

    /// Broadcaster listen port.
    #[clap(long, env = "WEB_SERVER_PORT", default_value_t = 8080)]
    pub web_server_port: u16,

    /// Hydration and subscription batch size.
    #[clap(long, env = "BATCH_SIZE", default_value_t = 800)]
    pub batch_size: usize,

    /// Base hop input, in base-currency units (pre-scaling to 18 decimals).
    #[clap(long, env = "START_AMOUNT", default_value = "1")]
    pub start_amount: String,

    /// Base currency symbol rendered in every `pathDescription`.
    #[clap(long, env = "START_CURRENCY", default_value = "WETH")]
    pub start_currency: String,

    /// Per-hop fee, as a percent (e.g. `0.5` for 0.5%).
    #[clap(long, env = "FEE_PERCENT", default_value_t = 0.5)]
    pub fee_percent: f64,

    /// Catalog database filename, read by the Store at startup.
    #[clap(long, env = "DB_NAME", default_value = "defi.db")]
    pub db_name: String,

    /// Append-only log file path.
    #[clap(long, env = "LOG_FILE_NAME", default_value = "arbitrage.log")]
    pub log_file_name: String,

    /// Enables the `/metrics` Prometheus exporter.
    #[clap(long, env = "METRICS_ENABLED", default_value_t = false)]
    pub metrics_enabled: bool,

    /// Port the Prometheus exporter listens on, if enabled.
    #[clap(long, env = "METRICS_PORT", default_value_t = 6969)]
    pub metrics_port: u16
}

impl Cli {
    /// `https://mainnet.infura.io/v3/<key>` — the Hydrator's one-shot
    /// aggregator endpoint.
    pub fn https_url(&self) -> eyre::Result<url::Url> {
        Ok(format!("https://mainnet.infura.io/v3/{}", self.infura_api_key).parse()?)
    }

    /// `wss://mainnet.infura.io/ws/v3/<key>` — the Subscriber's streaming
    /// endpoint.
    pub fn wss_url(&self) -> eyre::Result<url::Url> {
        Ok(format!("wss://mainnet.infura.io/ws/v3/{}", self.infura_api_key).parse()?)
    }
}
