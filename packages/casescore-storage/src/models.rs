use casescore_domain::{Priority, Score, Significance};

use crate::{Error, Result};

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AggregateScoreRow {
	pub item_id: i64,
	pub data_source_id: Option<i64>,
	pub significance: i32,
	pub priority: i32,
}
impl AggregateScoreRow {
	pub fn score(&self) -> Result<Score> {
		decode_score(self.significance, self.priority)
	}

	pub fn into_item_score(self) -> Result<ItemScore> {
		let score = self.score()?;

		Ok(ItemScore { item_id: self.item_id, data_source_id: self.data_source_id, score })
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ItemScore {
	pub item_id: i64,
	pub data_source_id: Option<i64>,
	pub score: Score,
}

pub fn decode_score(significance: i32, priority: i32) -> Result<Score> {
	let significance = Significance::from_id(significance)
		.ok_or_else(|| Error::InvalidData(format!("Unknown significance id {significance}.")))?;
	let priority = Priority::from_id(priority)
		.ok_or_else(|| Error::InvalidData(format!("Unknown priority id {priority}.")))?;

	Ok(Score::new(significance, priority))
}
