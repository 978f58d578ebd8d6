//! navtree [data_dir] [config.json]
//!
//! Opens the sidebar database, prints the current tree as JSON and exits.

use std::path::{Path, PathBuf};

use clap::Parser;
use navtree::SidebarConfig;
use navtree_host_lib::{init_logging, Host};

#[derive(Parser)]
#[command(name = "navtree", about = "Print the sidebar tree stored in a data directory", version)]
struct Args {
    /// Directory holding navtree.db and logs/
    #[arg(default_value = ".")]
    data_dir: PathBuf,

    /// JSON config file; defaults apply when omitted
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args.data_dir, args.config.as_deref()).await {
        eprintln!("navtree: {}", e);
        std::process::exit(1);
    }
}

async fn run(data_dir: &Path, config_path: Option<&Path>) -> Result<(), String> {
    let config = match config_path {
        Some(path) => SidebarConfig::load(path).map_err(|e| e.to_string())?,
        None => SidebarConfig::default(),
    };

    init_logging(&data_dir.join("logs"), &config)?;
    let _ = rolling_logger::info(&format!("Opening sidebar in {}", data_dir.display()));

    let (host, _handles) = Host::open(data_dir, &config).await.map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&*host.controller().tree()).map_err(|e| e.to_string())?;
    println!("{}", json);

    host.shutdown().await;
    Ok(())
}
