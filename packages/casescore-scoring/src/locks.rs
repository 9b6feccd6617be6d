use std::{
	collections::HashMap,
	sync::{Arc, Mutex, Weak},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

const PRUNE_THRESHOLD: usize = 1_024;

/// Per-item async mutexes for backends that cannot lock rows.
///
/// `Db::connect` pins SQLite to one connection, so the pool already admits a single open
/// transaction and these slots are never contended. They guard a `Db` whose SQLite pool was built
/// wider by hand.
///
/// A slot lives as long as someone holds or waits on it; dead slots are pruned lazily.
#[derive(Debug, Default)]
pub struct ItemLocks {
	slots: Mutex<HashMap<i64, Weak<AsyncMutex<()>>>>,
}
impl ItemLocks {
	pub async fn acquire(&self, item_id: i64) -> OwnedMutexGuard<()> {
		let slot = {
			let mut slots = self.slots.lock().unwrap_or_else(|err| err.into_inner());

			match slots.get(&item_id).and_then(Weak::upgrade) {
				Some(slot) => slot,
				None => {
					if slots.len() >= PRUNE_THRESHOLD {
						slots.retain(|_, slot| slot.strong_count() > 0);
					}

					let slot = Arc::new(AsyncMutex::new(()));

					slots.insert(item_id, Arc::downgrade(&slot));

					slot
				},
			}
		};

		slot.lock_owned().await
	}

	/// Number of items currently held or awaited.
	pub fn live(&self) -> usize {
		let slots = self.slots.lock().unwrap_or_else(|err| err.into_inner());

		slots.values().filter(|slot| slot.strong_count() > 0).count()
	}
}
