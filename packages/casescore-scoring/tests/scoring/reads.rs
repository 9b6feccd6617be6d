use std::{sync::Arc, time::Duration};

use casescore_domain::{Score, Significance};
use casescore_scoring::ScoringManager;
use casescore_storage::filter::ScoreFilter;

use super::{RecordingNotifier, SqlFindings};

#[tokio::test]
async fn committed_scores_replace_cached_reads() {
	let harness = super::sqlite_harness().await;

	assert_eq!(
		harness.manager.reader().get_aggregate_score(1).await.expect("Failed to read score."),
		Score::UNKNOWN
	);

	harness.commit_finding(1, 10, Score::LIKELY_NOTABLE).await;

	assert_eq!(
		harness.manager.reader().get_aggregate_score(1).await.expect("Failed to read score."),
		Score::LIKELY_NOTABLE
	);

	let notable = harness.commit_finding(1, 10, Score::NOTABLE).await;

	assert_eq!(
		harness.manager.reader().get_aggregate_score(1).await.expect("Failed to read score."),
		Score::NOTABLE
	);

	let mut tx = harness.begin().await;

	harness.delete_finding(&mut tx, &notable).await;
	tx.commit().await.expect("Failed to commit.");

	assert_eq!(
		harness.manager.reader().get_aggregate_score(1).await.expect("Failed to read score."),
		Score::LIKELY_NOTABLE
	);
}

#[tokio::test]
async fn cached_scores_expire_when_another_manager_commits() {
	let cfg = casescore_config::Scoring { cache_ttl_ms: 50, ..casescore_config::Scoring::default() };
	let harness = super::harness_with(&casescore_testkit::sqlite_memory_dsn(), 1, &cfg).await;
	let other = ScoringManager::new(
		&cfg,
		harness.manager.db.clone(),
		Arc::new(SqlFindings::default()),
		Arc::new(RecordingNotifier::default()),
	);

	harness.commit_finding(1, 10, Score::LIKELY_NONE).await;

	assert_eq!(
		harness.manager.reader().get_aggregate_score(1).await.expect("Failed to read score."),
		Score::LIKELY_NONE
	);

	let mut tx = other.begin().await.expect("Failed to begin score transaction.");

	other
		.after_addition(&mut tx, 1, Some(10), Score::NOTABLE)
		.await
		.expect("Failed to update aggregate after addition.");
	tx.commit().await.expect("Failed to commit.");

	assert_eq!(harness.stored(1).await, Some(Score::NOTABLE));

	tokio::time::sleep(Duration::from_millis(150)).await;

	let reader = harness.manager.reader();
	let single = reader.get_aggregate_score(1).await.expect("Failed to read score.");
	let batch = reader.get_many(&[1]).await.expect("Failed to read scores.");

	assert_eq!(single, Score::NOTABLE);
	assert_eq!(batch[&1], single);
}

#[tokio::test]
async fn rolled_back_scores_never_reach_the_cache() {
	let harness = super::sqlite_harness().await;
	let mut tx = harness.begin().await;

	harness.add_finding(&mut tx, 1, 10, Score::NOTABLE).await;
	tx.rollback().await.expect("Failed to roll back.");

	assert_eq!(
		harness.manager.reader().get_aggregate_score(1).await.expect("Failed to read score."),
		Score::UNKNOWN
	);
}

#[tokio::test]
async fn get_many_returns_every_requested_id_once() {
	let harness = super::sqlite_harness().await;

	harness.commit_finding(1, 10, Score::NOTABLE).await;
	harness.commit_finding(2, 10, Score::LIKELY_NONE).await;

	let scores =
		harness.manager.reader().get_many(&[1, 2, 3, 1, 2]).await.expect("Failed to read scores.");

	assert_eq!(scores.len(), 3);
	assert_eq!(scores[&1], Score::NOTABLE);
	assert_eq!(scores[&2], Score::LIKELY_NONE);
	assert_eq!(scores[&3], Score::UNKNOWN);
}

#[tokio::test]
async fn get_many_of_nothing_is_empty() {
	let harness = super::sqlite_harness().await;
	let scores = harness.manager.reader().get_many(&[]).await.expect("Failed to read scores.");

	assert!(scores.is_empty());
}

#[tokio::test]
async fn get_many_spans_multiple_chunks() {
	let harness = super::sqlite_harness().await;
	let mut tx = harness.begin().await;

	for item_id in (0..1_500).step_by(3) {
		harness.add_finding(&mut tx, item_id, 10, Score::LIKELY_NOTABLE).await;
	}

	tx.commit().await.expect("Failed to commit.");

	let ids: Vec<i64> = (0..1_500).collect();
	let scores = harness.manager.reader().get_many(&ids).await.expect("Failed to read scores.");

	assert_eq!(scores.len(), 1_500);
	assert_eq!(scores.values().filter(|score| **score == Score::LIKELY_NOTABLE).count(), 500);
	assert_eq!(scores[&1], Score::UNKNOWN);
}

#[tokio::test]
async fn counts_and_lists_by_data_source_and_significance() {
	let harness = super::sqlite_harness().await;

	harness.commit_finding(1, 10, Score::NOTABLE).await;
	harness.commit_finding(2, 10, Score::NOTABLE).await;
	harness.commit_finding(3, 10, Score::LIKELY_NONE).await;
	harness.commit_finding(4, 20, Score::NOTABLE).await;

	let reader = harness.manager.reader();

	assert_eq!(
		reader.count_items(10, Significance::Notable).await.expect("Failed to count items."),
		2
	);
	assert_eq!(
		reader.count_items(20, Significance::LikelyNone).await.expect("Failed to count items."),
		0
	);
	assert_eq!(
		reader
			.items_with_significance(10, Significance::Notable)
			.await
			.expect("Failed to list items."),
		vec![1, 2]
	);

	let filter = ScoreFilter::MinSignificance(Significance::LikelyNone);
	let listed = reader.list_scores(&filter, Some(3)).await.expect("Failed to list scores.");

	assert_eq!(listed.iter().map(|row| row.item_id).collect::<Vec<_>>(), vec![1, 2, 3]);
	assert!(listed.iter().all(|row| row.data_source_id == Some(10)));
}
