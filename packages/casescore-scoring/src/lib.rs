pub mod aggregate;
pub mod locks;
pub mod notifier;
pub mod read;
pub mod transaction;

mod error;

pub use error::{Error, Result};
pub use locks::ItemLocks;
pub use notifier::{BroadcastNotifier, ChangeNotifier};
pub use read::ScoreReader;
pub use transaction::ScoreTransaction;

use std::{future::Future, pin::Pin, sync::Arc};

use sqlx::AnyConnection;

use casescore_domain::{Finding, Score};
use casescore_storage::{db::Db, scores::ScoreStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read-only view of the findings and tags attached to an item.
///
/// Both queries run on the caller's transaction connection so that a finding removed earlier in
/// the same transaction is already gone.
pub trait FindingSource
where
	Self: Send + Sync,
{
	fn findings_for_item<'a>(
		&'a self,
		conn: &'a mut AnyConnection,
		item_id: i64,
	) -> BoxFuture<'a, Result<Vec<Finding>>>;

	/// Highest score implied by the tags currently on the item, if any.
	fn max_tag_score<'a>(
		&'a self,
		conn: &'a mut AnyConnection,
		item_id: i64,
	) -> BoxFuture<'a, Result<Option<Score>>>;
}

pub struct ScoringManager {
	pub db: Db,
	store: Arc<ScoreStore>,
	findings: Arc<dyn FindingSource>,
	notifier: Arc<dyn ChangeNotifier>,
	locks: ItemLocks,
	reader: ScoreReader,
}
impl ScoringManager {
	pub fn new(
		cfg: &casescore_config::Scoring,
		db: Db,
		findings: Arc<dyn FindingSource>,
		notifier: Arc<dyn ChangeNotifier>,
	) -> Self {
		let store = Arc::new(ScoreStore::new(db.backend, cfg));
		let reader = ScoreReader::from_parts(db.clone(), store.clone());

		Self { db, store, findings, notifier, locks: ItemLocks::default(), reader }
	}

	pub fn store(&self) -> &ScoreStore {
		&self.store
	}

	pub fn reader(&self) -> &ScoreReader {
		&self.reader
	}

	/// Opens a transaction for the caller's finding writes and the score updates that follow them.
	pub async fn begin(&self) -> Result<ScoreTransaction> {
		let tx = self.db.pool.begin().await?;

		Ok(ScoreTransaction::new(tx, self.store.clone(), self.notifier.clone()))
	}
}
