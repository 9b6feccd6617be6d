//! Typed filters over stored aggregate scores.
//!
//! Filters render to a SQL predicate with numbered `$n` placeholders plus the values to bind, so
//! callers never splice user-supplied values into query text.

use std::fmt::Write;

use casescore_domain::{Priority, Significance};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScoreFilter {
	All,
	DataSource(i64),
	Significance(Significance),
	/// Significance ranked at or above the given level. Persisted ids are not in relevance order,
	/// so this renders as an `IN` list rather than a range comparison.
	MinSignificance(Significance),
	Priority(Priority),
	And(Vec<ScoreFilter>),
	Or(Vec<ScoreFilter>),
	Not(Box<ScoreFilter>),
}
impl ScoreFilter {
	pub fn and(self, other: Self) -> Self {
		match (self, other) {
			(Self::All, other) => other,
			(this, Self::All) => this,
			(Self::And(mut left), Self::And(right)) => {
				left.extend(right);

				Self::And(left)
			},
			(Self::And(mut left), other) => {
				left.push(other);

				Self::And(left)
			},
			(this, other) => Self::And(vec![this, other]),
		}
	}

	pub fn or(self, other: Self) -> Self {
		match (self, other) {
			(Self::Or(mut left), Self::Or(right)) => {
				left.extend(right);

				Self::Or(left)
			},
			(Self::Or(mut left), other) => {
				left.push(other);

				Self::Or(left)
			},
			(this, other) => Self::Or(vec![this, other]),
		}
	}

	#[allow(clippy::should_implement_trait)]
	pub fn not(self) -> Self {
		Self::Not(Box::new(self))
	}

	/// Renders the predicate. Placeholders are numbered from `first_placeholder`.
	pub fn render(&self, first_placeholder: usize) -> RenderedFilter {
		let mut out = RenderedFilter {
			sql: String::new(),
			params: Vec::new(),
			next_placeholder: first_placeholder,
		};

		self.write_to(&mut out);

		out
	}

	fn write_to(&self, out: &mut RenderedFilter) {
		match self {
			Self::All => out.sql.push_str("1 = 1"),
			Self::DataSource(id) => {
				out.sql.push_str("data_source_id = ");
				out.push_param(SqlParam::BigInt(*id));
			},
			Self::Significance(significance) => {
				out.sql.push_str("significance = ");
				out.push_param(SqlParam::Int(significance.id()));
			},
			Self::MinSignificance(significance) => {
				out.sql.push_str("significance IN (");

				for (idx, level) in significance.at_least().enumerate() {
					if idx > 0 {
						out.sql.push_str(", ");
					}

					out.push_param(SqlParam::Int(level.id()));
				}

				out.sql.push(')');
			},
			Self::Priority(priority) => {
				out.sql.push_str("priority = ");
				out.push_param(SqlParam::Int(priority.id()));
			},
			Self::And(filters) => write_joined(out, filters, " AND ", "1 = 1"),
			Self::Or(filters) => write_joined(out, filters, " OR ", "1 = 0"),
			Self::Not(inner) => {
				out.sql.push_str("NOT (");
				inner.write_to(out);
				out.sql.push(')');
			},
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlParam {
	BigInt(i64),
	Int(i32),
}

#[derive(Clone, Debug)]
pub struct RenderedFilter {
	pub sql: String,
	pub params: Vec<SqlParam>,
	next_placeholder: usize,
}
impl RenderedFilter {
	/// Placeholder number the next appended parameter should use.
	pub fn next_placeholder(&self) -> usize {
		self.next_placeholder
	}

	fn push_param(&mut self, param: SqlParam) {
		let _ = write!(self.sql, "${}", self.next_placeholder);

		self.params.push(param);
		self.next_placeholder += 1;
	}
}

fn write_joined(out: &mut RenderedFilter, filters: &[ScoreFilter], separator: &str, empty: &str) {
	if filters.is_empty() {
		out.sql.push_str(empty);

		return;
	}

	out.sql.push('(');

	for (idx, filter) in filters.iter().enumerate() {
		if idx > 0 {
			out.sql.push_str(separator);
		}

		filter.write_to(out);
	}

	out.sql.push(')');
}
