use std::{
	collections::{BTreeSet, HashMap},
	sync::Arc,
};

use crate::Result;
use casescore_domain::{Score, Significance};
use casescore_storage::{db::Db, filter::ScoreFilter, models::ItemScore, scores::ScoreStore};

/// Committed-read surface over the stored aggregates.
///
/// Readers obtained from [`crate::ScoringManager::reader`] share the manager's cache, so they
/// observe invalidations from its commits.
#[derive(Clone)]
pub struct ScoreReader {
	db: Db,
	store: Arc<ScoreStore>,
}
impl ScoreReader {
	pub fn new(cfg: &casescore_config::Scoring, db: Db) -> Self {
		let store = Arc::new(ScoreStore::new(db.backend, cfg));

		Self { db, store }
	}

	pub(crate) fn from_parts(db: Db, store: Arc<ScoreStore>) -> Self {
		Self { db, store }
	}

	/// Committed aggregate score of one item. Items that were never scored read as `UNKNOWN`.
	pub async fn get_aggregate_score(&self, item_id: i64) -> Result<Score> {
		let mut conn = self.db.pool.acquire().await?;

		Ok(self.store.read_committed(&mut conn, item_id).await?)
	}

	/// Committed aggregate scores for a batch of items.
	///
	/// Every requested id appears in the result exactly once; duplicates collapse and missing items
	/// map to `UNKNOWN`. An empty request does not touch the database.
	pub async fn get_many(&self, item_ids: &[i64]) -> Result<HashMap<i64, Score>> {
		if item_ids.is_empty() {
			return Ok(HashMap::new());
		}

		let unique: Vec<i64> = item_ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
		let mut scores: HashMap<i64, Score> =
			unique.iter().map(|item_id| (*item_id, Score::UNKNOWN)).collect();
		let mut conn = self.db.pool.acquire().await?;

		for row in self.store.read_many(&mut conn, &unique).await? {
			scores.insert(row.item_id, row.score);
		}

		Ok(scores)
	}

	pub async fn count_items(&self, data_source_id: i64, significance: Significance) -> Result<u64> {
		let filter = ScoreFilter::DataSource(data_source_id)
			.and(ScoreFilter::Significance(significance));
		let mut conn = self.db.pool.acquire().await?;

		Ok(self.store.count(&mut conn, &filter).await?)
	}

	/// Item ids in the data source whose stored significance is exactly `significance`.
	pub async fn items_with_significance(
		&self,
		data_source_id: i64,
		significance: Significance,
	) -> Result<Vec<i64>> {
		let filter = ScoreFilter::DataSource(data_source_id)
			.and(ScoreFilter::Significance(significance));
		let mut conn = self.db.pool.acquire().await?;
		let rows = self.store.list(&mut conn, &filter, None).await?;

		Ok(rows.into_iter().map(|row| row.item_id).collect())
	}

	pub async fn list_scores(
		&self,
		filter: &ScoreFilter,
		limit: Option<u32>,
	) -> Result<Vec<ItemScore>> {
		let mut conn = self.db.pool.acquire().await?;

		Ok(self.store.list(&mut conn, filter, limit).await?)
	}
}
