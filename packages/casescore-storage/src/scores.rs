//! Score Store: the persistence adapter for the `aggregate_scores` table.
//!
//! All methods run on a caller-supplied connection, which is usually the connection of an open
//! transaction. Only [`ScoreStore::read_committed`] consults the cache, and it must only be used
//! outside a transaction.

use std::time::Duration;

use sqlx::AnyConnection;

use casescore_domain::Score;

use crate::{
	Result,
	cache::ScoreCache,
	db::Backend,
	filter::{ScoreFilter, SqlParam},
	models::{AggregateScoreRow, ItemScore, decode_score},
};

const MAX_IDS_PER_QUERY: usize = 500;

/// Outcome of [`ScoreStore::read_for_update`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LockedScore {
	/// Score committed for the item, `None` when it has never been scored.
	pub score: Option<Score>,
	/// Whether a row now exists that an `UPDATE` can target.
	pub row_exists: bool,
	/// Whether this transaction inserted a placeholder row to take the lock.
	pub reserved: bool,
}
impl LockedScore {
	pub fn current(&self) -> Score {
		self.score.unwrap_or(Score::UNKNOWN)
	}
}

pub struct ScoreStore {
	backend: Backend,
	cache: Option<ScoreCache>,
}
impl ScoreStore {
	/// A `cache_capacity` of zero disables caching.
	pub fn new(backend: Backend, cfg: &casescore_config::Scoring) -> Self {
		let cache = (cfg.cache_capacity > 0).then(|| {
			ScoreCache::new(cfg.cache_capacity, Duration::from_millis(cfg.cache_ttl_ms))
		});

		Self { backend, cache }
	}

	pub fn uncached(backend: Backend) -> Self {
		Self { backend, cache: None }
	}

	pub fn backend(&self) -> Backend {
		self.backend
	}

	pub fn cache(&self) -> Option<&ScoreCache> {
		self.cache.as_ref()
	}

	pub async fn read(&self, conn: &mut AnyConnection, item_id: i64) -> Result<Option<Score>> {
		let row: Option<(i32, i32)> = sqlx::query_as(
			"SELECT significance, priority FROM aggregate_scores WHERE item_id = $1",
		)
		.bind(item_id)
		.fetch_optional(&mut *conn)
		.await?;

		row.map(|(significance, priority)| decode_score(significance, priority)).transpose()
	}

	/// Reads the item's score and, where the backend supports it, locks the row until the
	/// enclosing transaction ends.
	///
	/// Postgres has no gap locks, so an absent row is reserved with an `UNKNOWN` placeholder and
	/// then locked. A concurrent first insert for the same item blocks here until the other
	/// transaction finishes. Callers that leave the score at `UNKNOWN` must drop the placeholder
	/// with [`ScoreStore::release_reservation`].
	pub async fn read_for_update(
		&self,
		conn: &mut AnyConnection,
		item_id: i64,
		data_source_id: Option<i64>,
	) -> Result<LockedScore> {
		if !self.backend.supports_row_locks() {
			let score = self.read(conn, item_id).await?;

			return Ok(LockedScore { score, row_exists: score.is_some(), reserved: false });
		}

		if let Some(score) = lock_row(conn, item_id).await? {
			return Ok(LockedScore { score: Some(score), row_exists: true, reserved: false });
		}

		let inserted = sqlx::query(
			"\
INSERT INTO aggregate_scores (item_id, data_source_id, significance, priority)
VALUES ($1, $2, $3, $4)
ON CONFLICT (item_id) DO NOTHING",
		)
		.bind(item_id)
		.bind(data_source_id)
		.bind(Score::UNKNOWN.significance.id())
		.bind(Score::UNKNOWN.priority.id())
		.execute(&mut *conn)
		.await?
		.rows_affected();

		if inserted == 1 {
			tracing::trace!(item_id, "Reserved aggregate score row.");

			return Ok(LockedScore { score: None, row_exists: true, reserved: true });
		}

		// Another transaction committed the first row while the insert waited on it.
		let score = lock_row(conn, item_id).await?;

		Ok(LockedScore { score, row_exists: score.is_some(), reserved: false })
	}

	/// Writes `score` for the item. `had_existing_row` selects `UPDATE` over
	/// `INSERT ... ON CONFLICT`; both are safe to retry.
	pub async fn upsert(
		&self,
		conn: &mut AnyConnection,
		item_id: i64,
		data_source_id: Option<i64>,
		score: Score,
		had_existing_row: bool,
	) -> Result<()> {
		if had_existing_row {
			let updated = sqlx::query(
				"\
UPDATE aggregate_scores
SET significance = $1,
	priority = $2,
	data_source_id = COALESCE($3, data_source_id)
WHERE item_id = $4",
			)
			.bind(score.significance.id())
			.bind(score.priority.id())
			.bind(data_source_id)
			.bind(item_id)
			.execute(&mut *conn)
			.await?
			.rows_affected();

			if updated > 0 {
				return Ok(());
			}
		}

		sqlx::query(
			"\
INSERT INTO aggregate_scores (item_id, data_source_id, significance, priority)
VALUES ($1, $2, $3, $4)
ON CONFLICT (item_id) DO UPDATE
SET data_source_id = COALESCE(excluded.data_source_id, aggregate_scores.data_source_id),
	significance = excluded.significance,
	priority = excluded.priority",
		)
		.bind(item_id)
		.bind(data_source_id)
		.bind(score.significance.id())
		.bind(score.priority.id())
		.execute(&mut *conn)
		.await?;

		Ok(())
	}

	/// Removes a placeholder inserted by [`ScoreStore::read_for_update`].
	pub async fn release_reservation(&self, conn: &mut AnyConnection, item_id: i64) -> Result<()> {
		sqlx::query(
			"DELETE FROM aggregate_scores WHERE item_id = $1 AND significance = $2 AND priority = $3",
		)
		.bind(item_id)
		.bind(Score::UNKNOWN.significance.id())
		.bind(Score::UNKNOWN.priority.id())
		.execute(&mut *conn)
		.await?;

		Ok(())
	}

	/// Cache-through read for connections that are not inside a transaction. Items without a
	/// stored row read as `UNKNOWN`.
	pub async fn read_committed(&self, conn: &mut AnyConnection, item_id: i64) -> Result<Score> {
		let Some(cache) = self.cache.as_ref() else {
			return Ok(self.read(conn, item_id).await?.unwrap_or(Score::UNKNOWN));
		};

		if let Some(score) = cache.get(item_id) {
			return Ok(score);
		}

		let epoch = cache.epoch();
		let score = self.read(conn, item_id).await?.unwrap_or(Score::UNKNOWN);

		cache.insert_if_current(item_id, score, epoch);

		Ok(score)
	}

	/// Bulk read. Ids without a stored row are absent from the result.
	pub async fn read_many(
		&self,
		conn: &mut AnyConnection,
		item_ids: &[i64],
	) -> Result<Vec<ItemScore>> {
		let mut out = Vec::with_capacity(item_ids.len());

		for chunk in item_ids.chunks(MAX_IDS_PER_QUERY) {
			let placeholders = (1..=chunk.len())
				.map(|idx| format!("${idx}"))
				.collect::<Vec<_>>()
				.join(", ");
			let sql = format!(
				"\
SELECT item_id, data_source_id, significance, priority
FROM aggregate_scores
WHERE item_id IN ({placeholders})"
			);
			let mut query = sqlx::query_as::<_, AggregateScoreRow>(&sql);

			for item_id in chunk {
				query = query.bind(*item_id);
			}

			for row in query.fetch_all(&mut *conn).await? {
				out.push(row.into_item_score()?);
			}
		}

		Ok(out)
	}

	pub async fn count(&self, conn: &mut AnyConnection, filter: &ScoreFilter) -> Result<u64> {
		let rendered = filter.render(1);
		let sql = format!("SELECT COUNT(item_id) FROM aggregate_scores WHERE {}", rendered.sql);
		let mut query = sqlx::query_scalar::<_, i64>(&sql);

		for param in &rendered.params {
			query = match *param {
				SqlParam::BigInt(value) => query.bind(value),
				SqlParam::Int(value) => query.bind(value),
			};
		}

		let count = query.fetch_one(&mut *conn).await?;

		Ok(count.max(0) as u64)
	}

	pub async fn list(
		&self,
		conn: &mut AnyConnection,
		filter: &ScoreFilter,
		limit: Option<u32>,
	) -> Result<Vec<ItemScore>> {
		let rendered = filter.render(1);
		let mut sql = format!(
			"\
SELECT item_id, data_source_id, significance, priority
FROM aggregate_scores
WHERE {}
ORDER BY item_id",
			rendered.sql
		);

		if limit.is_some() {
			sql.push_str(&format!(" LIMIT ${}", rendered.next_placeholder()));
		}

		let mut query = sqlx::query_as::<_, AggregateScoreRow>(&sql);

		for param in &rendered.params {
			query = match *param {
				SqlParam::BigInt(value) => query.bind(value),
				SqlParam::Int(value) => query.bind(value),
			};
		}

		if let Some(limit) = limit {
			query = query.bind(i64::from(limit));
		}

		query
			.fetch_all(&mut *conn)
			.await?
			.into_iter()
			.map(AggregateScoreRow::into_item_score)
			.collect()
	}

	/// Drops cached scores for items whose aggregate changed in a committed transaction.
	pub fn invalidate<I>(&self, item_ids: I)
	where
		I: IntoIterator<Item = i64>,
	{
		if let Some(cache) = self.cache.as_ref() {
			cache.invalidate(item_ids);
		}
	}
}

async fn lock_row(conn: &mut AnyConnection, item_id: i64) -> Result<Option<Score>> {
	let row: Option<(i32, i32)> = sqlx::query_as(
		"SELECT significance, priority FROM aggregate_scores WHERE item_id = $1 FOR UPDATE",
	)
	.bind(item_id)
	.fetch_optional(&mut *conn)
	.await?;

	row.map(|(significance, priority)| decode_score(significance, priority)).transpose()
}
