use crate::{Result, ScoreTransaction, ScoringManager};
use casescore_domain::{Finding, Score, ScoreChange};

impl ScoringManager {
	/// Folds a newly added finding's score into the item's aggregate.
	///
	/// Must run inside the transaction that inserted the finding. Returns the aggregate as it
	/// stands afterwards.
	pub async fn after_addition(
		&self,
		tx: &mut ScoreTransaction,
		item_id: i64,
		data_source_id: Option<i64>,
		new_score: Score,
	) -> Result<Score> {
		self.serialize_item(tx, item_id).await;

		let locked = self.store.read_for_update(tx.conn(), item_id, data_source_id).await?;
		let current = locked.current();

		if !adopts(current, new_score) {
			if locked.reserved {
				self.store.release_reservation(tx.conn(), item_id).await?;
			}

			tracing::trace!(
				item_id,
				current = %current,
				candidate = %new_score,
				"Aggregate score unchanged after addition."
			);

			return Ok(current);
		}

		self.store.upsert(tx.conn(), item_id, data_source_id, new_score, locked.row_exists).await?;
		tx.register_score_change(ScoreChange::new(item_id, data_source_id, current, new_score));

		tracing::debug!(
			item_id,
			old = %current,
			new = %new_score,
			"Aggregate score raised after addition."
		);

		Ok(new_score)
	}

	/// Recomputes the item's aggregate from its remaining findings and tags.
	///
	/// Must run inside the transaction that deleted the finding, after the delete.
	pub async fn after_deletion(
		&self,
		tx: &mut ScoreTransaction,
		item_id: i64,
		data_source_id: Option<i64>,
	) -> Result<Score> {
		self.serialize_item(tx, item_id).await;

		let locked = self.store.read_for_update(tx.conn(), item_id, data_source_id).await?;
		let current = locked.current();
		let findings = self.findings.findings_for_item(tx.conn(), item_id).await?;
		let tag_score = self.findings.max_tag_score(tx.conn(), item_id).await?;
		let recomputed = recompute(&findings, tag_score);

		if recomputed == current {
			if locked.reserved {
				self.store.release_reservation(tx.conn(), item_id).await?;
			}

			tracing::trace!(
				item_id,
				current = %current,
				findings = findings.len(),
				"Aggregate score unchanged after deletion."
			);

			return Ok(current);
		}

		self.store.upsert(tx.conn(), item_id, data_source_id, recomputed, locked.row_exists).await?;
		tx.register_score_change(ScoreChange::new(item_id, data_source_id, current, recomputed));

		tracing::debug!(
			item_id,
			old = %current,
			new = %recomputed,
			findings = findings.len(),
			"Aggregate score recomputed after deletion."
		);

		Ok(recomputed)
	}

	/// Holds the item's slot in `ItemLocks` until the transaction ends when the backend has no row
	/// locks. A single-connection SQLite pool serializes whole transactions before this runs.
	async fn serialize_item(&self, tx: &mut ScoreTransaction, item_id: i64) {
		if self.store.backend().supports_row_locks() || tx.holds_item_lock(item_id) {
			return;
		}

		let guard = self.locks.acquire(item_id).await;

		tx.hold_item_lock(item_id, guard);
	}
}

/// Whether `candidate` replaces `current` when a finding is added.
///
/// The first real signal always wins over `UNKNOWN`, including a benign `NONE`. After that only a
/// strictly greater score replaces the aggregate.
pub fn adopts(current: Score, candidate: Score) -> bool {
	(current.is_unknown() && !candidate.is_unknown()) || candidate > current
}

/// Maximum over every remaining finding and the tag score, or `UNKNOWN`.
pub fn recompute(findings: &[Finding], tag_score: Option<Score>) -> Score {
	findings
		.iter()
		.map(|finding| finding.score)
		.chain(tag_score)
		.max()
		.unwrap_or(Score::UNKNOWN)
}
