use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Score;

/// Before/after record of one item's aggregate score, produced inside a transaction.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScoreChange {
	pub item_id: i64,
	pub data_source_id: Option<i64>,
	pub old: Score,
	pub new: Score,
}
impl ScoreChange {
	pub fn new(item_id: i64, data_source_id: Option<i64>, old: Score, new: Score) -> Self {
		Self { item_id, data_source_id, old, new }
	}
}

/// Published once per data source after the transaction that produced `changes` committed.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AggregateScoresChanged {
	pub data_source_id: Option<i64>,
	pub changes: Vec<ScoreChange>,
	pub committed_at: OffsetDateTime,
}
impl AggregateScoresChanged {
	/// Folds the changes registered by one transaction into publishable events.
	///
	/// Several changes to the same item collapse into one that keeps the first `old` and the last
	/// `new`; a net change of nothing is dropped. Events are grouped by data source in first-seen
	/// order.
	pub fn from_changes(changes: &[ScoreChange], committed_at: OffsetDateTime) -> Vec<Self> {
		let mut coalesced: Vec<ScoreChange> = Vec::with_capacity(changes.len());

		for change in changes {
			match coalesced.iter_mut().find(|seen| seen.item_id == change.item_id) {
				Some(seen) => {
					seen.new = change.new;

					if change.data_source_id.is_some() {
						seen.data_source_id = change.data_source_id;
					}
				},
				None => coalesced.push(*change),
			}
		}

		let mut events: Vec<Self> = Vec::new();

		for change in coalesced.into_iter().filter(|change| change.old != change.new) {
			match events.iter_mut().find(|event| event.data_source_id == change.data_source_id) {
				Some(event) => event.changes.push(change),
				None => events.push(Self {
					data_source_id: change.data_source_id,
					changes: vec![change],
					committed_at,
				}),
			}
		}

		events
	}

	pub fn item_ids(&self) -> impl Iterator<Item = i64> + '_ {
		self.changes.iter().map(|change| change.item_id)
	}
}
