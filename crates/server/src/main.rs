mod auth;
mod blob;
mod config;
mod error;
mod routes;
mod state;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use variant_core::store::Store;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config = Config::from_env().map_err(anyhow::Error::msg)?;
	let store = Store::connect(&config.database_url).await?;
	let bind_addr = config.bind_addr;
	let blobs: std::sync::Arc<dyn blob::BlobStore> = std::sync::Arc::new(blob::LocalFsBlobStore::new(&config.upload_dir));

	let state = AppState { store, config: std::sync::Arc::new(config), blobs };
	let router = routes::build_router(state);

	let listener = TcpListener::bind(bind_addr).await?;
	tracing::info!(%bind_addr, "listening");
	axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
			.expect("failed to install SIGTERM handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
	tracing::info!("shutting down");
}
