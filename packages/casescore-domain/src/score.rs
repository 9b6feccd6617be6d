//! Relevance scores attached to case items.
//!
//! A [`Score`] is a `(Significance, Priority)` pair. Scores are totally ordered by priority first
//! and significance second, so an `Override` score outranks every `Normal` score.

use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};

/// How notable or benign an item is.
///
/// Variants are declared in relevance order. `None` (confirmed benign) ranks above both `Likely*`
/// levels because it carries more analytic confidence; `Notable` is the maximum. The persisted id
/// returned by [`Significance::id`] is independent of this order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Significance {
	Unknown,
	LikelyNone,
	LikelyNotable,
	None,
	Notable,
}
impl Significance {
	pub const ALL: [Self; 5] =
		[Self::Unknown, Self::LikelyNone, Self::LikelyNotable, Self::None, Self::Notable];

	pub const fn id(self) -> i32 {
		match self {
			Self::Unknown => 0,
			Self::LikelyNone => 8,
			Self::LikelyNotable => 9,
			Self::Notable => 10,
			Self::None => 18,
		}
	}

	pub fn from_id(id: i32) -> Option<Self> {
		Self::ALL.into_iter().find(|significance| significance.id() == id)
	}

	/// Stable, non-localized name used for persistence and equality.
	pub const fn name(self) -> &'static str {
		match self {
			Self::Unknown => "Unknown",
			Self::LikelyNone => "LikelyNone",
			Self::LikelyNotable => "LikelyNotable",
			Self::None => "None",
			Self::Notable => "Notable",
		}
	}

	pub const fn display_name(self) -> &'static str {
		match self {
			Self::Unknown => "Unknown",
			Self::LikelyNone => "Likely None",
			Self::LikelyNotable => "Likely Notable",
			Self::None => "None",
			Self::Notable => "Notable",
		}
	}

	/// Every significance ranked at or above `self`, in relevance order.
	pub fn at_least(self) -> impl Iterator<Item = Self> {
		Self::ALL.into_iter().filter(move |significance| *significance >= self)
	}
}
impl Display for Significance {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.display_name())
	}
}
impl FromStr for Significance {
	type Err = ParseScoreError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let wanted = normalize_name(raw);

		Self::ALL
			.into_iter()
			.find(|significance| significance.name().eq_ignore_ascii_case(&wanted))
			.ok_or_else(|| ParseScoreError { kind: "significance", value: raw.to_string() })
	}
}

/// Tier separating automated findings from human overrides.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Priority {
	Normal,
	Override,
}
impl Priority {
	pub const ALL: [Self; 2] = [Self::Normal, Self::Override];

	pub const fn id(self) -> i32 {
		match self {
			Self::Normal => 0,
			Self::Override => 10,
		}
	}

	pub fn from_id(id: i32) -> Option<Self> {
		Self::ALL.into_iter().find(|priority| priority.id() == id)
	}

	pub const fn name(self) -> &'static str {
		match self {
			Self::Normal => "Normal",
			Self::Override => "Override",
		}
	}

	pub const fn display_name(self) -> &'static str {
		self.name()
	}
}
impl Display for Priority {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.display_name())
	}
}
impl FromStr for Priority {
	type Err = ParseScoreError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let wanted = normalize_name(raw);

		Self::ALL
			.into_iter()
			.find(|priority| priority.name().eq_ignore_ascii_case(&wanted))
			.ok_or_else(|| ParseScoreError { kind: "priority", value: raw.to_string() })
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseScoreError {
	kind: &'static str,
	value: String,
}
impl Display for ParseScoreError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "Unknown {} name {:?}.", self.kind, self.value)
	}
}
impl std::error::Error for ParseScoreError {}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Score {
	pub significance: Significance,
	pub priority: Priority,
}
impl Score {
	/// Default for items without findings.
	pub const UNKNOWN: Self = Self::new(Significance::Unknown, Priority::Normal);
	pub const NOTABLE: Self = Self::new(Significance::Notable, Priority::Normal);
	pub const LIKELY_NOTABLE: Self = Self::new(Significance::LikelyNotable, Priority::Normal);
	pub const LIKELY_NONE: Self = Self::new(Significance::LikelyNone, Priority::Normal);
	pub const NONE: Self = Self::new(Significance::None, Priority::Normal);

	pub const fn new(significance: Significance, priority: Priority) -> Self {
		Self { significance, priority }
	}

	pub fn is_unknown(&self) -> bool {
		*self == Self::UNKNOWN
	}
}
impl Ord for Score {
	fn cmp(&self, other: &Self) -> Ordering {
		self.priority
			.cmp(&other.priority)
			.then_with(|| self.significance.cmp(&other.significance))
	}
}
impl PartialOrd for Score {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl Default for Score {
	fn default() -> Self {
		Self::UNKNOWN
	}
}
impl Display for Score {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}", self.significance.name(), self.priority.name())
	}
}

// Accepts "LikelyNotable", "likely_notable", "likely-notable" and "Likely Notable".
fn normalize_name(raw: &str) -> String {
	raw.trim().chars().filter(|c| !matches!(c, '_' | '-' | ' ')).collect()
}
