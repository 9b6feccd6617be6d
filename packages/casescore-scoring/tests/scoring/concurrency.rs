use std::{sync::Arc, time::Duration};

use casescore_domain::{Priority, Score, Significance};
use casescore_testkit::ScratchDatabase;

use super::Harness;

const WRITERS: usize = 16;

fn score_for(writer: usize) -> Score {
	let significance = Significance::ALL[writer % Significance::ALL.len()];
	let priority = if writer == WRITERS / 2 { Priority::Override } else { Priority::Normal };

	Score::new(significance, priority)
}

/// Spawns one transaction per writer, all adding a finding to the same item.
async fn race_additions(harness: Arc<Harness>, item_id: i64) {
	let mut tasks = Vec::with_capacity(WRITERS);

	for writer in 0..WRITERS {
		let harness = harness.clone();

		tasks.push(tokio::spawn(async move {
			let mut tx = harness.begin().await;

			harness.add_finding(&mut tx, item_id, 1, score_for(writer)).await;
			tx.commit().await.expect("Failed to commit.");
		}));
	}

	for task in tasks {
		task.await.expect("Writer task panicked.");
	}
}

fn expected_max() -> Score {
	(0..WRITERS).map(score_for).max().unwrap_or(Score::UNKNOWN)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_additions_on_sqlite_keep_the_maximum() {
	let harness = Arc::new(super::sqlite_harness().await);

	race_additions(harness.clone(), 7).await;

	assert_eq!(harness.stored(7).await, Some(expected_max()));
	assert_eq!(
		harness.manager.reader().get_aggregate_score(7).await.expect("Failed to read score."),
		expected_max()
	);
}

#[tokio::test]
async fn sqlite_transactions_are_serialized_by_the_pool() {
	let harness = super::sqlite_harness().await;
	let mut first = harness.begin().await;

	harness.add_finding(&mut first, 1, 1, Score::LIKELY_NOTABLE).await;

	let blocked = tokio::time::timeout(Duration::from_millis(50), harness.manager.begin()).await;

	assert!(blocked.is_err(), "A second transaction opened while the first was still running.");

	first.commit().await.expect("Failed to commit.");

	let mut second = tokio::time::timeout(Duration::from_secs(1), harness.manager.begin())
		.await
		.expect("Second transaction did not start after the first committed.")
		.expect("Failed to begin score transaction.");

	harness.add_finding(&mut second, 1, 1, Score::NOTABLE).await;
	second.commit().await.expect("Failed to commit.");

	assert_eq!(harness.stored(1).await, Some(Score::NOTABLE));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires external Postgres. Set CASESCORE_PG_DSN to run."]
async fn concurrent_additions_on_postgres_keep_the_maximum() {
	let Some(scratch) =
		ScratchDatabase::from_env().await.expect("Failed to create scratch database.")
	else {
		eprintln!("Skipping concurrent_additions_on_postgres_keep_the_maximum; set CASESCORE_PG_DSN to run this test.");

		return;
	};
	let harness = Arc::new(super::harness(scratch.dsn(), 8).await);

	for round in 0..4 {
		race_additions(harness.clone(), 100 + round).await;

		assert_eq!(harness.stored(100 + round).await, Some(expected_max()));
	}

	let events = harness.events.events();

	assert!(events.iter().all(|event| event.data_source_id == Some(1)));
	assert!(
		events
			.iter()
			.flat_map(|event| event.changes.iter())
			.all(|change| change.new > change.old)
	);

	harness.manager.db.pool.close().await;
	scratch.cleanup().await.expect("Failed to drop scratch database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CASESCORE_PG_DSN to run."]
async fn postgres_unknown_addition_leaves_no_row() {
	let Some(scratch) =
		ScratchDatabase::from_env().await.expect("Failed to create scratch database.")
	else {
		eprintln!("Skipping postgres_unknown_addition_leaves_no_row; set CASESCORE_PG_DSN to run this test.");

		return;
	};
	let harness = super::harness(scratch.dsn(), 2).await;

	harness.commit_finding(1, 10, Score::UNKNOWN).await;

	assert_eq!(harness.stored(1).await, None);

	let notable = harness.commit_finding(1, 10, Score::NOTABLE).await;

	harness.commit_finding(1, 10, Score::LIKELY_NONE).await;

	let mut tx = harness.begin().await;

	assert_eq!(harness.delete_finding(&mut tx, &notable).await, Score::LIKELY_NONE);

	tx.commit().await.expect("Failed to commit.");

	assert_eq!(harness.stored(1).await, Some(Score::LIKELY_NONE));

	harness.manager.db.pool.close().await;
	scratch.cleanup().await.expect("Failed to drop scratch database.");
}
