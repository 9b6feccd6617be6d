use std::time::Duration;

use sqlx::{
	AnyPool,
	any::{self, AnyPoolOptions},
};

use crate::{Error, Result, schema};

const SCHEMA_LOCK_ID: i64 = 3_120_517;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backend {
	Postgres,
	Sqlite,
}
impl Backend {
	pub fn from_dsn(dsn: &str) -> Result<Self> {
		if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") {
			Ok(Self::Postgres)
		} else if dsn.starts_with("sqlite:") {
			Ok(Self::Sqlite)
		} else {
			Err(Error::InvalidArgument(format!("Unsupported database DSN scheme in {dsn:?}.")))
		}
	}

	/// Whether `SELECT ... FOR UPDATE` holds a row lock until the transaction ends.
	pub fn supports_row_locks(self) -> bool {
		matches!(self, Self::Postgres)
	}
}

#[derive(Clone)]
pub struct Db {
	pub pool: AnyPool,
	pub backend: Backend,
}
impl Db {
	pub async fn connect(cfg: &casescore_config::Storage) -> Result<Self> {
		any::install_default_drivers();

		let backend = Backend::from_dsn(&cfg.dsn)?;
		let options = match backend {
			Backend::Postgres => AnyPoolOptions::new().max_connections(cfg.pool_max_conns),
			// SQLite admits one writer at a time. A single pinned connection also keeps
			// `sqlite::memory:` databases alive for the lifetime of the pool.
			Backend::Sqlite => AnyPoolOptions::new()
				.max_connections(1)
				.min_connections(1)
				.idle_timeout(None::<Duration>)
				.max_lifetime(None::<Duration>),
		};
		let pool = options.connect(&cfg.dsn).await?;

		Ok(Self { pool, backend })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let mut tx = self.pool.begin().await?;

		if self.backend == Backend::Postgres {
			// Serializes concurrent bootstraps; released when the transaction ends.
			sqlx::query("SELECT 1 FROM pg_advisory_xact_lock($1)")
				.bind(SCHEMA_LOCK_ID)
				.execute(&mut *tx)
				.await?;
		}

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		tracing::info!(backend = ?self.backend, "Aggregate score schema is ready.");

		Ok(())
	}
}
