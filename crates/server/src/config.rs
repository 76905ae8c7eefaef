//! Environment-driven configuration, parsed once at process start in the
//! style of `variant_core::cnf`: typed parse failures surface as a startup
//! error rather than a panic.
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub bind_addr: SocketAddr,
	pub jwt_secret: String,
	pub jwt_expiry_secs: i64,
	pub upload_dir: String,
	/// Bounds in-flight requests per worker (§5 "pooled per worker"), so a
	/// burst of slow handlers can't starve the pool out from under every
	/// other connection.
	pub max_concurrent_requests: usize,
}

impl Config {
	pub fn from_env() -> Result<Self, String> {
		let database_url = require_env("DATABASE_URL")?;
		let bind_addr = std::env::var("BIND_ADDR")
			.unwrap_or_else(|_| "0.0.0.0:8080".to_string())
			.parse::<SocketAddr>()
			.map_err(|e| format!("invalid BIND_ADDR: {e}"))?;
		let jwt_secret = require_env("JWT_SECRET")?;
		let jwt_expiry_secs = std::env::var("JWT_EXPIRY_SECS")
			.ok()
			.map(|v| v.parse::<i64>().map_err(|e| format!("invalid JWT_EXPIRY_SECS: {e}")))
			.transpose()?
			.unwrap_or(3600 * 8);
		let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
		let max_concurrent_requests = std::env::var("MAX_CONCURRENT_REQUESTS")
			.ok()
			.map(|v| v.parse::<usize>().map_err(|e| format!("invalid MAX_CONCURRENT_REQUESTS: {e}")))
			.transpose()?
			.unwrap_or(512);

		Ok(Config { database_url, bind_addr, jwt_secret, jwt_expiry_secs, upload_dir, max_concurrent_requests })
	}
}

fn require_env(name: &str) -> Result<String, String> {
	std::env::var(name).map_err(|_| format!("missing required environment variable {name}"))
}
