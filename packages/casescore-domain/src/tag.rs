use serde::{Deserialize, Serialize};

use crate::Score;

/// Known status carried by a tag name, e.g. a "known bad" hash-set tag.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum TagKnownStatus {
	Unknown,
	Known,
	Suspicious,
	Bad,
}
impl TagKnownStatus {
	pub const fn id(self) -> i32 {
		match self {
			Self::Unknown => 0,
			Self::Known => 1,
			Self::Bad => 2,
			Self::Suspicious => 3,
		}
	}

	pub fn from_id(id: i32) -> Option<Self> {
		[Self::Unknown, Self::Known, Self::Suspicious, Self::Bad]
			.into_iter()
			.find(|status| status.id() == id)
	}

	/// Score a tag of this status contributes to its item's aggregate.
	pub const fn score(self) -> Score {
		match self {
			Self::Unknown => Score::UNKNOWN,
			Self::Known => Score::NONE,
			Self::Suspicious => Score::LIKELY_NOTABLE,
			Self::Bad => Score::NOTABLE,
		}
	}
}
