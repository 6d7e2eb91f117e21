use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use fdfs_client::{Client, ClientConfig, DownloadTarget, Downloaded, FileId, FileInfo};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fdfs")]
#[command(about = "Tracker/storage client operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, default_value = "client.conf", help = "Config file path (key=value or .toml)")]
    config: PathBuf,

    #[arg(long, help = "Tracker address (overrides config)")]
    tracker: Vec<String>,

    #[arg(long, default_value_t = 10, help = "Connect timeout in seconds")]
    connect_timeout: u64,

    #[arg(long, help = "Output as JSON")]
    json: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Upload a local file
    Upload { path: PathBuf },
    /// Download a file id to stdout or to --output
    Download {
        file_id: String,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Delete a file id
    Delete { file_id: String },
    /// Active-test a tracker or storage node (defaults to the first tracker)
    Ping { addr: Option<String> },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fdfs_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = if cli.config.exists() || cli.tracker.is_empty() {
        ClientConfig::load(&cli.config)?
    } else {
        ClientConfig::default()
    };
    if !cli.tracker.is_empty() {
        config.tracker_addr = cli.tracker;
    }

    let client =
        Client::new(config).with_connect_timeout(Duration::from_secs(cli.connect_timeout));

    match cli.command {
        Commands::Upload { path } => {
            let file = FileInfo::from_path(&path).await?;
            let file_id = client.upload(file).await?;
            if cli.json {
                println!("{}", serde_json::json!({ "file_id": file_id.to_string() }));
            } else {
                println!("{}", file_id);
            }
        }
        Commands::Download { file_id, output } => {
            let file_id: FileId = file_id.parse()?;
            let target = match output {
                Some(path) => DownloadTarget::File(path),
                None => DownloadTarget::buffer(),
            };
            match client.download(&file_id, target).await? {
                Downloaded::Buffer { data } => {
                    if cli.json {
                        println!("{}", buffered_download_json(&file_id, &data));
                    } else {
                        use std::io::Write;
                        std::io::stdout().write_all(&data)?;
                    }
                }
                Downloaded::File { path, size } => {
                    if cli.json {
                        println!("{}", serde_json::json!({ "path": path, "size": size }));
                    } else {
                        println!("✅ {} bytes written to {}", size, path.display());
                    }
                }
            }
        }
        Commands::Delete { file_id } => {
            let file_id: FileId = file_id.parse()?;
            client.delete(&file_id).await?;
            if cli.json {
                println!("{}", serde_json::json!({ "deleted": file_id.to_string() }));
            } else {
                println!("✅ Deleted {}", file_id);
            }
        }
        Commands::Ping { addr } => {
            let addr = match addr {
                Some(addr) => addr,
                None => client.config().primary_tracker()?.to_string(),
            };
            let result = client.active_test(&addr).await;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "addr": addr,
                        "alive": result.is_ok(),
                        "status": result.as_ref().err().and_then(|e| e.status()),
                    })
                );
            } else {
                match &result {
                    Ok(()) => println!("✅ {} is alive", addr),
                    Err(e) => println!("❌ {}: {}", addr, e),
                }
            }
            result?;
        }
        Commands::Config => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(client.config())?);
            } else {
                for addr in &client.config().tracker_addr {
                    println!("tracker_server={}", addr);
                }
                println!("maxConns={}", client.config().max_conns);
            }
        }
    }

    Ok(())
}

/// `--json` form of a download printed to stdout; the bytes are hex encoded.
fn buffered_download_json(file_id: &FileId, data: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "file_id": file_id.to_string(),
        "size": data.len(),
        "data_hex": hex::encode(data),
    })
}
