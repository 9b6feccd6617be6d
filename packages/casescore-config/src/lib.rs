mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Scoring, Service, Storage};

use std::{fs, path::Path};

const SUPPORTED_DSN_SCHEMES: [&str; 3] = ["postgres://", "postgresql://", "sqlite:"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.dsn.trim().is_empty() {
		return Err(Error::Validation { message: "storage.dsn must be non-empty.".to_string() });
	}
	if !SUPPORTED_DSN_SCHEMES.iter().any(|scheme| cfg.storage.dsn.starts_with(scheme)) {
		return Err(Error::Validation {
			message: "storage.dsn must start with postgres://, postgresql://, or sqlite:."
				.to_string(),
		});
	}
	if cfg.storage.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.scoring.cache_capacity > 0 && cfg.scoring.cache_ttl_ms == 0 {
		return Err(Error::Validation {
			message: "scoring.cache_ttl_ms must be greater than zero when the cache is enabled."
				.to_string(),
		});
	}
	if cfg.scoring.notify_buffer == 0 {
		return Err(Error::Validation {
			message: "scoring.notify_buffer must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.storage.dsn = cfg.storage.dsn.trim().to_string();
}
