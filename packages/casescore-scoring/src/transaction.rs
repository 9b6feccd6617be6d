use std::{collections::HashMap, sync::Arc};

use sqlx::{Any, AnyConnection, Transaction};
use time::OffsetDateTime;
use tokio::sync::OwnedMutexGuard;

use crate::{ChangeNotifier, Result};
use casescore_domain::{AggregateScoresChanged, ScoreChange};
use casescore_storage::scores::ScoreStore;

/// A database transaction that also collects the aggregate score changes made inside it.
///
/// Changes become visible to the cache and to notifiers only from [`ScoreTransaction::commit`].
/// Dropping the value without committing rolls the database back and discards the changes.
pub struct ScoreTransaction {
	tx: Transaction<'static, Any>,
	pending: Vec<ScoreChange>,
	held: HashMap<i64, OwnedMutexGuard<()>>,
	store: Arc<ScoreStore>,
	notifier: Arc<dyn ChangeNotifier>,
}
impl ScoreTransaction {
	pub(crate) fn new(
		tx: Transaction<'static, Any>,
		store: Arc<ScoreStore>,
		notifier: Arc<dyn ChangeNotifier>,
	) -> Self {
		Self { tx, pending: Vec::new(), held: HashMap::new(), store, notifier }
	}

	/// Connection for the caller's own writes, such as inserting or deleting findings.
	pub fn conn(&mut self) -> &mut AnyConnection {
		&mut self.tx
	}

	pub fn pending_changes(&self) -> &[ScoreChange] {
		&self.pending
	}

	pub(crate) fn register_score_change(&mut self, change: ScoreChange) {
		self.pending.push(change);
	}

	pub(crate) fn holds_item_lock(&self, item_id: i64) -> bool {
		self.held.contains_key(&item_id)
	}

	pub(crate) fn hold_item_lock(&mut self, item_id: i64, guard: OwnedMutexGuard<()>) {
		self.held.insert(item_id, guard);
	}

	pub async fn commit(self) -> Result<()> {
		let Self { tx, pending, held, store, notifier } = self;

		tx.commit().await?;

		store.invalidate(pending.iter().map(|change| change.item_id));

		drop(held);

		let events = AggregateScoresChanged::from_changes(&pending, OffsetDateTime::now_utc());

		tracing::debug!(
			changes = pending.len(),
			events = events.len(),
			"Committed aggregate score transaction."
		);

		for event in events {
			notifier.publish(event);
		}

		Ok(())
	}

	pub async fn rollback(self) -> Result<()> {
		let discarded = self.pending.len();

		self.tx.rollback().await?;

		if discarded > 0 {
			tracing::debug!(discarded, "Rolled back aggregate score changes.");
		}

		Ok(())
	}
}
