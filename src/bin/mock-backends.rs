//! Serves all six simulated backend account systems on local ports.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};

use account_gateway::config::{LogFormat, ObservabilityConfig};
use account_gateway::domain::AccountType;
use account_gateway::lifecycle::signals::spawn_signal_listener;
use account_gateway::observability::logging;
use account_gateway::simulator::{self, seed};
use account_gateway::Shutdown;

#[derive(Parser)]
#[command(name = "mock-backends")]
#[command(about = "Mock bank, card, loan, investment, legacy and crypto backends", long_about = None)]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// First port; families bind consecutive ports in canonical order.
    #[arg(long)]
    base_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init_logging(&ObservabilityConfig {
        log_level: "account_gateway=debug,mock_backends=info".into(),
        log_format: LogFormat::Pretty,
        metrics_enabled: false,
    });

    let shutdown = Shutdown::new();
    let mut backends = Vec::new();
    for (offset, kind) in AccountType::ALL.into_iter().enumerate() {
        let port = match args.base_port {
            Some(base) => base + offset as u16,
            None => seed::default_port(kind),
        };
        let backend = simulator::spawn(kind, SocketAddr::new(args.host, port), shutdown.subscribe()).await?;
        println!("{:<11} {}", kind.as_str(), backend.base_url());
        backends.push(backend);
    }

    spawn_signal_listener(shutdown.clone()).await?;
    for backend in backends {
        let _ = backend.handle.await;
    }
    Ok(())
}
