use std::path::PathBuf;

use clap::{
	Parser, Subcommand,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use casescore_domain::{Priority, Score, Significance};
use casescore_scoring::ScoreReader;
use casescore_storage::{db::Db, filter::ScoreFilter, models::ItemScore};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(
	version = VERSION,
	rename_all = "kebab",
	styles = styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Create the aggregate score tables if they are missing.
	InitSchema,
	/// Print the committed aggregate score of one item.
	Get { item_id: i64 },
	/// Print the committed aggregate scores of several items.
	GetMany {
		#[arg(required = true)]
		item_ids: Vec<i64>,
	},
	/// Count items in a data source with exactly the given significance.
	Count {
		#[arg(long, value_name = "ID")]
		data_source: i64,
		#[arg(long, value_name = "NAME")]
		significance: Significance,
	},
	/// List stored aggregate scores ordered by item id.
	List(ListArgs),
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
	#[arg(long, value_name = "ID")]
	pub data_source: Option<i64>,
	#[arg(long, value_name = "NAME", conflicts_with = "min_significance")]
	pub significance: Option<Significance>,
	#[arg(long, value_name = "NAME")]
	pub min_significance: Option<Significance>,
	#[arg(long, value_name = "NAME")]
	pub priority: Option<Priority>,
	#[arg(long, value_name = "N")]
	pub limit: Option<u32>,
}
impl ListArgs {
	pub fn filter(&self) -> ScoreFilter {
		let mut filter = ScoreFilter::All;

		if let Some(data_source_id) = self.data_source {
			filter = filter.and(ScoreFilter::DataSource(data_source_id));
		}
		if let Some(significance) = self.significance {
			filter = filter.and(ScoreFilter::Significance(significance));
		}
		if let Some(significance) = self.min_significance {
			filter = filter.and(ScoreFilter::MinSignificance(significance));
		}
		if let Some(priority) = self.priority {
			filter = filter.and(ScoreFilter::Priority(priority));
		}

		filter
	}
}

#[derive(Debug, Serialize)]
struct ItemScoreOut {
	item_id: i64,
	data_source_id: Option<i64>,
	significance: Significance,
	priority: Priority,
}
impl From<ItemScore> for ItemScoreOut {
	fn from(row: ItemScore) -> Self {
		Self {
			item_id: row.item_id,
			data_source_id: row.data_source_id,
			significance: row.score.significance,
			priority: row.score.priority,
		}
	}
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = casescore_config::load(&args.config)?;
	init_tracing(&config)?;
	let db = Db::connect(&config.storage).await?;
	let output = execute(&config, db, args.command).await?;

	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}

/// Runs one subcommand and returns its JSON report.
pub async fn execute(
	config: &casescore_config::Config,
	db: Db,
	command: Command,
) -> color_eyre::Result<Value> {
	let reader = ScoreReader::new(&config.scoring, db.clone());
	let output = match command {
		Command::InitSchema => {
			db.ensure_schema().await?;

			serde_json::json!({ "schema": "ready" })
		},
		Command::Get { item_id } => {
			let score = reader.get_aggregate_score(item_id).await?;

			score_json(item_id, score)
		},
		Command::GetMany { item_ids } => {
			let scores = reader.get_many(&item_ids).await?;
			let mut ids: Vec<i64> = scores.keys().copied().collect();

			ids.sort_unstable();

			Value::Array(
				ids.into_iter().map(|item_id| score_json(item_id, scores[&item_id])).collect(),
			)
		},
		Command::Count { data_source, significance } => {
			let count = reader.count_items(data_source, significance).await?;

			serde_json::json!({
				"data_source_id": data_source,
				"significance": significance,
				"count": count,
			})
		},
		Command::List(list) => {
			let rows = reader.list_scores(&list.filter(), list.limit).await?;

			tracing::debug!(rows = rows.len(), "Listed aggregate scores.");

			serde_json::to_value(rows.into_iter().map(ItemScoreOut::from).collect::<Vec<_>>())?
		},
	};

	Ok(output)
}

fn score_json(item_id: i64, score: Score) -> Value {
	serde_json::json!({
		"item_id": item_id,
		"significance": score.significance,
		"priority": score.priority,
	})
}

fn init_tracing(config: &casescore_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).init();
	Ok(())
}
