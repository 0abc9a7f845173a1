use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the account gateway", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Admin bearer token, if the gateway requires one.
    #[arg(short, long, env = "GATEWAY_ADMIN_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Healthy,
    Slow,
    Error,
    Flaky,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Healthy => "healthy",
            Mode::Slow => "slow",
            Mode::Error => "error",
            Mode::Flaky => "flaky",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one account
    Account {
        id: String,
        /// Skip the cache read and refresh the entry
        #[arg(long)]
        no_cache: bool,
    },
    /// Fetch several accounts concurrently
    Accounts {
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<String>,
        #[arg(long)]
        no_cache: bool,
    },
    /// Force a backend into a simulated failure mode
    Simulate {
        backend: String,
        #[arg(value_enum)]
        mode: Mode,
        #[arg(long)]
        latency_ms: Option<u64>,
        #[arg(long)]
        failure_rate: Option<f64>,
    },
    /// Drop cached entries for one account id
    Invalidate { id: String },
    /// Flush the whole cache
    InvalidateAll,
    /// Probe backend health and breaker state
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut admin_headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        admin_headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }

    let request: RequestBuilder = match cli.command {
        Commands::Account { id, no_cache } => {
            let mut req = client.get(format!("{base}/v1/accounts/{id}"));
            if no_cache {
                req = req.query(&[("noCache", "true")]);
            }
            req
        }
        Commands::Accounts { ids, no_cache } => {
            let mut req = client
                .get(format!("{base}/v1/accounts"))
                .query(&[("ids", ids.join(","))]);
            if no_cache {
                req = req.query(&[("noCache", "true")]);
            }
            req
        }
        Commands::Simulate {
            backend,
            mode,
            latency_ms,
            failure_rate,
        } => {
            let mut body = json!({ "mode": mode.as_str() });
            if let Some(latency) = latency_ms {
                body["latencyMs"] = json!(latency);
            }
            if let Some(rate) = failure_rate {
                body["failureRate"] = json!(rate);
            }
            client
                .post(format!("{base}/admin/backends/{backend}/simulate"))
                .headers(admin_headers)
                .json(&body)
        }
        Commands::Invalidate { id } => client
            .post(format!("{base}/admin/cache/invalidate/{id}"))
            .headers(admin_headers),
        Commands::InvalidateAll => client
            .post(format!("{base}/admin/cache/invalidate-all"))
            .headers(admin_headers),
        Commands::Health => client
            .get(format!("{base}/admin/health"))
            .headers(admin_headers),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{rendered}");
    } else {
        eprintln!("Error: gateway returned status {status}");
        eprintln!("{rendered}");
        std::process::exit(1);
    }
    Ok(())
}
