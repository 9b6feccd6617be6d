use tokio::sync::broadcast;

use casescore_domain::AggregateScoresChanged;

/// Receives one event per data source after a scoring transaction commits.
///
/// `publish` runs after the commit returned, so an implementation can never observe scores that
/// might still roll back. It must not block.
pub trait ChangeNotifier
where
	Self: Send + Sync,
{
	fn publish(&self, event: AggregateScoresChanged);
}

/// In-process fan-out over a tokio broadcast channel.
///
/// Subscribers that fall more than `capacity` events behind observe `RecvError::Lagged`.
#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
	sender: broadcast::Sender<AggregateScoresChanged>,
}
impl BroadcastNotifier {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));

		Self { sender }
	}

	/// Channel depth taken from `scoring.notify_buffer`.
	pub fn from_config(cfg: &casescore_config::Scoring) -> Self {
		Self::new(cfg.notify_buffer)
	}

	pub fn subscribe(&self) -> broadcast::Receiver<AggregateScoresChanged> {
		self.sender.subscribe()
	}
}
impl ChangeNotifier for BroadcastNotifier {
	fn publish(&self, event: AggregateScoresChanged) {
		let data_source_id = event.data_source_id;
		let changes = event.changes.len();

		if self.sender.send(event).is_err() {
			tracing::trace!(?data_source_id, changes, "No subscribers for aggregate score change.");
		}
	}
}
