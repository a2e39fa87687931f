use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Outcome of a submission. The ordinal is part of the solution id scheme
/// used by ingestion, so the variant order must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Ok,
    Fail,
}

impl Verdict {
    pub fn ordinal(self) -> i64 {
        match self {
            Verdict::Ok => 0,
            Verdict::Fail => 1,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ok => write!(f, "OK"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

/// One submitted program attempt. Identity is `solution_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub code: String,
    pub problem_id: i64,
    pub session_id: i64,
    pub solution_id: i64,
    pub verdict: Verdict,
}

impl Solution {
    pub fn new(
        code: impl Into<String>,
        problem_id: i64,
        session_id: i64,
        solution_id: i64,
        verdict: Verdict,
    ) -> Self {
        Self {
            code: code.into(),
            problem_id,
            session_id,
            solution_id,
            verdict,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.verdict == Verdict::Ok
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.solution_id == other.solution_id
    }
}

impl Eq for Solution {}

impl Hash for Solution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.solution_id.hash(state);
    }
}

/// Anything that can be traced back to a solution id in error reports.
pub trait Identified {
    fn identifier(&self) -> i64;
}

impl Identified for Solution {
    fn identifier(&self) -> i64 {
        self.solution_id
    }
}

impl<T: Identified> Identified for &T {
    fn identifier(&self) -> i64 {
        (*self).identifier()
    }
}

/// Ordered collection of solutions, as produced by ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    values: Vec<Solution>,
}

impl Dataset {
    pub fn new(values: Vec<Solution>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Solution] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Solution> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values_matching(&self, predicate: impl Fn(&Solution) -> bool) -> Vec<Solution> {
        self.values.iter().filter(|s| predicate(s)).cloned().collect()
    }

    pub fn correct(&self) -> Vec<Solution> {
        self.values_matching(|s| s.verdict == Verdict::Ok)
    }

    pub fn incorrect(&self) -> Vec<Solution> {
        self.values_matching(|s| s.verdict == Verdict::Fail)
    }

    pub fn for_problem(&self, problem_id: i64) -> Dataset {
        Dataset::new(self.values_matching(|s| s.problem_id == problem_id))
    }

    pub fn problems(&self) -> BTreeSet<i64> {
        self.values.iter().map(|s| s.problem_id).collect()
    }
}
