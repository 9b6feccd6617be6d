use serde::{Deserialize, Serialize};

use crate::Score;

/// One analysis module's conclusion about an item.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Finding {
	pub finding_id: i64,
	pub item_id: i64,
	pub data_source_id: Option<i64>,
	pub score: Score,
	/// Carried through from the finding catalog. Aggregation does not consult it; a flagged
	/// finding counts like any other.
	pub ignore_score: bool,
}
