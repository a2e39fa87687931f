use super::DistanceFunction;
use crate::ast::TreeBuilder;
use crate::changes::generator;
use crate::changes::MatcherOptions;
use crate::error::{Error, Result};
use crate::model::Solution;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EditScale {
    /// Edit operations divided by the combined size of both trees.
    #[default]
    Normalized,
    /// Raw number of edit operations.
    Count,
}

/// Tree-edit distance between two solutions, used to pick nearest references.
///
/// The script is always computed from the lower solution id to the higher
/// one, which makes the heuristic symmetric.
pub struct EditDistance {
    builder: Arc<dyn TreeBuilder>,
    options: MatcherOptions,
    scale: EditScale,
}

impl EditDistance {
    pub fn new(builder: Arc<dyn TreeBuilder>) -> Self {
        Self {
            builder,
            options: MatcherOptions::default(),
            scale: EditScale::Normalized,
        }
    }

    pub fn with_options(mut self, options: MatcherOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_scale(mut self, scale: EditScale) -> Self {
        self.scale = scale;
        self
    }

    fn parse(&self, solution: &Solution) -> Result<Arc<crate::ast::Tree>> {
        self.builder
            .build_tree(&solution.code)
            .map_err(|err| Error::InvalidInput {
                solution_id: solution.solution_id,
                reason: err.to_string(),
            })
    }
}

impl DistanceFunction<Solution> for EditDistance {
    fn distance(&self, first: &Solution, second: &Solution) -> Result<f64> {
        let (low, high) = if first.solution_id <= second.solution_id {
            (first, second)
        } else {
            (second, first)
        };
        let before = self.parse(low)?;
        let after = self.parse(high)?;
        let edits = generator::diff(&before, &after, &self.options).len() as f64;
        Ok(match self.scale {
            EditScale::Count => edits,
            EditScale::Normalized => edits / (before.len() + after.len()) as f64,
        })
    }
}
