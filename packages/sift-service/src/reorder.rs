use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Positional strategy applied before documents are handed to a generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderStrategy {
	/// Keep the ranked order.
	BestFirst,
	/// Reverse the ranked order so the strongest document sits closest to the prompt.
	BestLast,
	/// Strongest documents at both ends, weakest in the middle.
	#[default]
	LostInMiddle,
}
impl ReorderStrategy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::BestFirst => "best_first",
			Self::BestLast => "best_last",
			Self::LostInMiddle => "lost_in_middle",
		}
	}
}

impl FromStr for ReorderStrategy {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"best_first" => Ok(Self::BestFirst),
			"best_last" => Ok(Self::BestLast),
			"lost_in_middle" => Ok(Self::LostInMiddle),
			other => Err(Error::InvalidRequest {
				message: format!("Unknown reorder strategy {other:?}."),
			}),
		}
	}
}

impl fmt::Display for ReorderStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Maps a configured name to a strategy, falling back to the default for unknown names.
pub fn resolve_reorder_strategy(raw: &str) -> ReorderStrategy {
	raw.parse().unwrap_or_else(|err| {
		tracing::warn!(error = %err, "Falling back to the default reorder strategy.");

		ReorderStrategy::default()
	})
}

pub fn reorder<T>(items: Vec<T>, strategy: ReorderStrategy) -> Vec<T> {
	if items.len() <= 2 {
		return items;
	}

	match strategy {
		ReorderStrategy::BestFirst => items,
		ReorderStrategy::BestLast => items.into_iter().rev().collect(),
		ReorderStrategy::LostInMiddle => {
			let mut front = Vec::with_capacity(items.len().div_ceil(2));
			let mut back = Vec::with_capacity(items.len() / 2);

			for (idx, item) in items.into_iter().enumerate() {
				if idx % 2 == 0 {
					front.push(item);
				} else {
					back.push(item);
				}
			}

			front.extend(back.into_iter().rev());

			front
		},
	}
}
