//! Classifieds marketplace server
//!
//! Serves the browse, add, detail, and buy pages over HTTP, backed by a
//! SQLite database and a directory of uploaded listing photos.

use clap::Parser;
use classifieds::{init_schema, item_count, order_count};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Classifieds marketplace server - photo listings, search, purchase inquiries
#[derive(Parser, Debug)]
#[command(name = "classifieds")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    /// Directory for uploaded listing photos
    #[arg(short, long, default_value_t = default_uploads_dir())]
    uploads_dir: String,

    /// Port to serve on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

/// Returns the default database path: ~/.local/share/classifieds/market.db
fn default_db_path() -> String {
    data_root().join("market.db").to_string_lossy().to_string()
}

/// Returns the default uploads directory: ~/.local/share/classifieds/uploads
fn default_uploads_dir() -> String {
    data_root().join("uploads").to_string_lossy().to_string()
}

fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("classifieds")
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = PathBuf::from(&args.database);
    let uploads_dir = PathBuf::from(&args.uploads_dir);

    log::info!("Starting classifieds...");
    log::info!("Database path: {}", db_path.display());
    log::info!("Uploads directory: {}", uploads_dir.display());

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create database directory: {}", e);
                std::process::exit(1);
            }
            log::info!("Created directory: {}", parent.display());
        }
    }

    // Open database connection
    let conn = match Connection::open(&db_path) {
        Ok(conn) => {
            log::info!("Opened database: {}", db_path.display());
            conn
        }
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database schema
    if let Err(e) = init_schema(&conn) {
        log::error!("Failed to initialize database schema: {}", e);
        std::process::exit(1);
    }

    match item_count(&conn) {
        Ok(count) => log::info!("Marketplace holds {} listing(s)", count),
        Err(e) => log::warn!("Failed to count listings: {}", e),
    }
    match order_count(&conn) {
        Ok(count) => log::info!("{} purchase inquiry(ies) on record", count),
        Err(e) => log::warn!("Failed to count inquiries: {}", e),
    }

    // Wrap connection in Arc<Mutex> for thread-safe sharing
    let db = Arc::new(Mutex::new(conn));

    if let Err(e) = classifieds::web::serve(db, &uploads_dir, args.port).await {
        log::error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
