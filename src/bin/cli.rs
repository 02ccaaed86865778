//! RecordVault CLI
//!
//! Interactive menu over the record vault. Configuration is read once at
//! startup; a MongoDB connection string switches to the document backend.

use clap::Parser;
use recordvault::events::spawn_event_logger;
use recordvault::menu::Menu;
use recordvault::{Config, RecordService};
use tokio::io::{stdin, stdout, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

/// RecordVault CLI
#[derive(Parser, Debug)]
#[command(name = "recordvault-cli")]
#[command(about = "Personal record vault with file or MongoDB storage")]
#[command(version)]
struct Args {
    /// Data directory (vault file, backups, export)
    #[arg(short, long, default_value = "./vault_data")]
    data_dir: String,

    /// MongoDB connection string; selects the document backend when set
    #[arg(long, env = "MONGO_URI")]
    mongo_uri: Option<String>,

    /// MongoDB database name
    #[arg(long, env = "MONGO_DB")]
    mongo_db: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr so they never interleave with the menu
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,recordvault=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("RecordVault v{}", recordvault::VERSION);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .maybe_connection_string(args.mongo_uri)
        .maybe_database_name(args.mongo_db)
        .build();

    tracing::info!("Backend: {:?}", config.backend());

    let service = match RecordService::open(config).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to open vault: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let logger = spawn_event_logger(service.events().subscribe());

    let mut menu = Menu::new(&service, BufReader::new(stdin()), stdout());
    if let Err(e) = menu.run().await {
        tracing::error!("Menu stopped: {}", e);
        std::process::exit(1);
    }

    // Dropping the service closes the bus; let the logger drain
    drop(menu);
    drop(service);
    let _ = logger.await;
}
