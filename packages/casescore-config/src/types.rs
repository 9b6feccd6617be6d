use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub scoring: Scoring,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	/// A `tracing_subscriber::EnvFilter` directive, e.g. "info" or "casescore_scoring=debug".
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	/// `postgres://`, `postgresql://` or `sqlite:` connection string.
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Scoring {
	/// Maximum number of cached aggregate scores. Zero disables the cache.
	#[serde(default = "default_cache_capacity")]
	pub cache_capacity: u64,
	/// Lifetime of a cached score. Bounds how long a reader can miss a commit made by another
	/// process or another manager sharing the database.
	#[serde(default = "default_cache_ttl_ms")]
	pub cache_ttl_ms: u64,
	/// Depth of the change-event broadcast channel.
	#[serde(default = "default_notify_buffer")]
	pub notify_buffer: usize,
}
impl Default for Scoring {
	fn default() -> Self {
		Self {
			cache_capacity: default_cache_capacity(),
			cache_ttl_ms: default_cache_ttl_ms(),
			notify_buffer: default_notify_buffer(),
		}
	}
}

fn default_cache_capacity() -> u64 {
	10_000
}

fn default_cache_ttl_ms() -> u64 {
	5_000
}

fn default_notify_buffer() -> usize {
	1_024
}
