use std::sync::Arc;

use clap::Parser;
use syncmark::config::{API_VERSION, Cli, Config, default_config_dir, default_config_path};
use syncmark::db::Database;
use syncmark::handler::{AppState, ServiceInfo};
use syncmark::routes;
use tokio::signal;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // If --config is provided, its parent directory also holds the
    // database; otherwise both live under ~/.syncmark/.
    let (config_path, data_dir) = match args.config_path {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            (path, dir)
        }
        None => {
            let dir = default_config_dir();
            (default_config_path(), dir)
        }
    };

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt().json().init();
    tracing::info!("syncmark.svc starting");

    let cfg = Config::new(config_path.to_str().unwrap_or_default()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });

    let db_path = data_dir.join(cfg.app.get_db());
    let db = Arc::new(Database::new(&db_path).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup database");
        std::process::exit(1);
    }));

    let state = AppState {
        store: db,
        service: ServiceInfo {
            message: cfg.app.message.clone(),
            version: API_VERSION.to_string(),
            status: cfg.app.status,
        },
    };
    let app = routes::router(state);

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("syncmark.svc running on {}", &address);
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                tracing::error!(error = %err, "server exited with error");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("ctrl+c signal received, shutting down");
        }
    }

    tracing::info!("syncmark.svc going off, shutdown complete");
}
