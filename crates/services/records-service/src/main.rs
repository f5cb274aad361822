//! Records Service - HTTP API for student records.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use records_service_lib::config::RecordsServiceConfig;
use records_service_lib::StoreKind;

#[derive(Parser)]
#[command(name = "records-service")]
#[command(about = "Student records service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long, env = "RECORDS_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "RECORDS_PORT", default_value = "3000")]
        port: u16,
        #[arg(long, value_enum, default_value = "postgres")]
        store: StoreArg,
    },
    /// Check that the store is reachable
    Check {
        #[arg(long, value_enum, default_value = "postgres")]
        store: StoreArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreArg {
    Postgres,
    Memory,
}

impl From<StoreArg> for StoreKind {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Postgres => StoreKind::Postgres,
            StoreArg::Memory => StoreKind::Memory,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, store } => {
            let mut config = RecordsServiceConfig::from_env();
            config.service.host = host;
            config.service.port = port;
            records_service_lib::run_server(store.into(), config).await?;
        }
        Commands::Check { store } => {
            records_service_lib::check_store(store.into()).await?;
        }
    }

    Ok(())
}
