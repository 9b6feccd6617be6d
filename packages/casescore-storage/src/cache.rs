use std::{
	sync::{
		RwLock,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration,
};

use moka::sync::Cache;

use casescore_domain::Score;

/// Bounded map of committed aggregate scores keyed by item id.
///
/// Every invalidation bumps an epoch. A reader records the epoch before it queries storage and
/// only inserts when no invalidation ran in between, so a value fetched before a commit can never
/// be cached after that commit's invalidation.
///
/// Invalidation only reaches the cache of the store that committed. Commits made through another
/// store, or by another process, become visible once the entry's `ttl` runs out.
pub struct ScoreCache {
	entries: Cache<i64, Score>,
	epoch: AtomicU64,
	gate: RwLock<()>,
}
impl ScoreCache {
	pub fn new(capacity: u64, ttl: Duration) -> Self {
		Self {
			entries: Cache::builder().max_capacity(capacity).time_to_live(ttl).build(),
			epoch: AtomicU64::new(0),
			gate: RwLock::new(()),
		}
	}

	pub fn get(&self, item_id: i64) -> Option<Score> {
		self.entries.get(&item_id)
	}

	pub fn epoch(&self) -> u64 {
		self.epoch.load(Ordering::Acquire)
	}

	pub fn insert_if_current(&self, item_id: i64, score: Score, observed_epoch: u64) -> bool {
		let _gate = self.gate.read().unwrap_or_else(|err| err.into_inner());

		if self.epoch.load(Ordering::Acquire) != observed_epoch {
			return false;
		}

		self.entries.insert(item_id, score);

		true
	}

	pub fn invalidate<I>(&self, item_ids: I)
	where
		I: IntoIterator<Item = i64>,
	{
		let _gate = self.gate.write().unwrap_or_else(|err| err.into_inner());

		self.epoch.fetch_add(1, Ordering::AcqRel);

		for item_id in item_ids {
			self.entries.invalidate(&item_id);
		}
	}
}
