//! Scratch databases for integration tests.
//!
//! SQLite tests need nothing external. Postgres tests read a server DSN from `CASESCORE_PG_DSN`
//! and get a freshly created database that is dropped again afterwards.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

const PG_DSN_ENV: &str = "CASESCORE_PG_DSN";
const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];

/// A Postgres database created for one test.
///
/// Call [`ScratchDatabase::cleanup`] to surface drop errors. Otherwise the database is dropped
/// from a helper thread when the value goes out of scope.
pub struct ScratchDatabase {
	dsn: String,
	owner: Option<Owner>,
}
impl ScratchDatabase {
	/// Creates a scratch database on the server behind `CASESCORE_PG_DSN`, or returns `None`
	/// when the variable is unset.
	pub async fn from_env() -> Result<Option<Self>> {
		match env_dsn() {
			Some(server_dsn) => Self::postgres(&server_dsn).await.map(Some),
			None => Ok(None),
		}
	}

	pub async fn postgres(server_dsn: &str) -> Result<Self> {
		let server = PgConnectOptions::from_str(server_dsn)
			.map_err(|err| Error::Message(format!("Invalid {PG_DSN_ENV}: {err}.")))?;
		let (maintenance, mut conn) = open_maintenance(&server).await?;
		let database = format!("casescore_scratch_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{database}""#).as_str()).await?;
		conn.close().await?;

		let dsn = server.database(&database).to_url_lossy().to_string();

		Ok(Self { dsn, owner: Some(Owner { database, maintenance }) })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn storage_config(&self, pool_max_conns: u32) -> casescore_config::Storage {
		storage_config(&self.dsn, pool_max_conns)
	}

	pub async fn cleanup(mut self) -> Result<()> {
		match self.owner.take() {
			Some(owner) => owner.drop_database().await,
			None => Ok(()),
		}
	}
}
impl Drop for ScratchDatabase {
	fn drop(&mut self) {
		let Some(owner) = self.owner.take() else {
			return;
		};
		// The test runtime may already be shutting down, so drop from a private one.
		let handle = thread::spawn(move || -> Result<()> {
			let runtime = Builder::new_current_thread().enable_all().build()?;

			runtime.block_on(owner.drop_database())
		});

		match handle.join() {
			Ok(Err(err)) => eprintln!("Scratch database cleanup failed: {err}."),
			Err(_) => eprintln!("Scratch database cleanup panicked."),
			Ok(Ok(())) => (),
		}
	}
}

struct Owner {
	database: String,
	maintenance: PgConnectOptions,
}
impl Owner {
	async fn drop_database(self) -> Result<()> {
		let mut conn = PgConnection::connect_with(&self.maintenance).await?;

		conn.execute(format!(r#"DROP DATABASE IF EXISTS "{}" WITH (FORCE)"#, self.database).as_str())
			.await?;
		conn.close().await?;

		Ok(())
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(PG_DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// DSN of a private in-memory SQLite database. Each pool that connects to it gets a fresh one.
pub fn sqlite_memory_dsn() -> String {
	"sqlite::memory:".to_string()
}

pub fn storage_config(dsn: &str, pool_max_conns: u32) -> casescore_config::Storage {
	casescore_config::Storage { dsn: dsn.to_string(), pool_max_conns }
}

// The server DSN may name a database the test user cannot drop or create from, so connect to a
// well-known maintenance database instead.
async fn open_maintenance(server: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut failures = Vec::new();

	for database in MAINTENANCE_DATABASES {
		let options = server.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => failures.push(format!("{database}: {err}")),
		}
	}

	Err(Error::Message(format!(
		"No maintenance database reachable ({}).",
		failures.join("; ")
	)))
}
