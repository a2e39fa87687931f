//! Submission logs in CSV form to [`Dataset`]s.

pub mod split;

pub use split::split_sessions;

use crate::ast::TreeBuilder;
use crate::error::{Error, Result};
use crate::model::{Dataset, Solution, Verdict};
use ahash::AHashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Decides whether a submission's code is usable, possibly normalizing it.
pub trait CodeValidator: Send + Sync {
    fn validate(&self, code: &str) -> Option<String>;
}

/// Accepts code the tree builder can parse.
pub struct TreeValidator {
    builder: Arc<dyn TreeBuilder>,
}

impl TreeValidator {
    pub fn new(builder: Arc<dyn TreeBuilder>) -> Self {
        Self { builder }
    }
}

impl CodeValidator for TreeValidator {
    fn validate(&self, code: &str) -> Option<String> {
        self.builder.build_tree(code).ok().map(|_| code.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl CodeValidator for AcceptAll {
    fn validate(&self, code: &str) -> Option<String> {
        Some(code.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Every submission, ids ordered by time within a session.
    #[default]
    All,
    /// Latest failed and earliest passed submission per session.
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    UserId,
    ProblemId,
    Verdict,
    Code,
    Time,
}

impl Column {
    const ALL: [Column; 5] = [
        Column::UserId,
        Column::ProblemId,
        Column::Verdict,
        Column::Code,
        Column::Time,
    ];

    fn patterns(self) -> &'static [&'static str] {
        match self {
            Column::UserId => &[r"\S*user_id\S*", r"\S*data_id\S*"],
            Column::ProblemId => &[r"\S*step_id\S*"],
            Column::Verdict => &[r"\S*is_passed\S*", r"\S*status\S*"],
            Column::Code => &[r"\S*submission_code\S*", r"\S*code\S*"],
            Column::Time => &[r"\S*timestamp\S*"],
        }
    }

    fn name(self) -> &'static str {
        match self {
            Column::UserId => "user id",
            Column::ProblemId => "problem id",
            Column::Verdict => "verdict",
            Column::Code => "code",
            Column::Time => "timestamp",
        }
    }
}

/// Header positions of the known columns. Each header token goes to the
/// first column whose pattern matches it entirely.
struct ColumnLayout {
    positions: AHashMap<Column, usize>,
}

impl ColumnLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let mut matchers = Vec::new();
        for column in Column::ALL {
            for pattern in column.patterns() {
                matchers.push((column, Regex::new(&format!("^(?:{})$", pattern))?));
            }
        }

        let mut positions = AHashMap::new();
        for (index, header) in headers.iter().enumerate() {
            let header = header.trim();
            if let Some((column, _)) = matchers.iter().find(|(_, re)| re.is_match(header)) {
                positions.entry(*column).or_insert(index);
            }
        }

        for column in [Column::UserId, Column::ProblemId, Column::Verdict, Column::Code] {
            if !positions.contains_key(&column) {
                return Err(Error::MissingColumn(column.name().to_string()));
            }
        }
        Ok(Self { positions })
    }

    fn get<'r>(&self, record: &'r csv::StringRecord, column: Column) -> Option<&'r str> {
        self.positions.get(&column).and_then(|&i| record.get(i))
    }
}

fn parse_verdict(value: &str) -> Verdict {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "correct" | "ok" | "passed" => Verdict::Ok,
        _ => Verdict::Fail,
    }
}

/// Dense session ids per (user, problem), in order of first appearance.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    ids: AHashMap<(i64, i64), i64>,
}

impl SessionRegistry {
    pub fn session(&mut self, user_id: i64, problem_id: i64) -> i64 {
        let next = self.ids.len() as i64;
        *self.ids.entry((user_id, problem_id)).or_insert(next)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

struct Row {
    order: usize,
    user_id: i64,
    problem_id: i64,
    verdict: Verdict,
    time: i64,
    code: String,
}

/// Reads submissions, applying the problem filter and the validator per row.
pub struct SubmissionParser<'a> {
    validator: &'a dyn CodeValidator,
    problem_filter: Box<dyn Fn(i64) -> bool + 'a>,
}

impl<'a> SubmissionParser<'a> {
    pub fn new(validator: &'a dyn CodeValidator) -> Self {
        Self {
            validator,
            problem_filter: Box::new(|_| true),
        }
    }

    pub fn with_problem_filter(mut self, filter: impl Fn(i64) -> bool + 'a) -> Self {
        self.problem_filter = Box::new(filter);
        self
    }

    pub fn parse<R: Read>(&self, input: R, mode: ParseMode) -> Result<Dataset> {
        let rows = self.read_rows(input)?;
        let dataset = match mode {
            ParseMode::All => all_solutions(rows),
            ParseMode::Last => last_solutions(rows),
        };
        info!("Parsed {} solutions ({:?} mode)", dataset.len(), mode);
        Ok(dataset)
    }

    fn read_rows<R: Read>(&self, input: R) -> Result<Vec<Row>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);
        let layout = ColumnLayout::from_headers(reader.headers()?)?;

        let mut rows = Vec::new();
        let (mut filtered, mut rejected) = (0usize, 0usize);
        for (order, record) in reader.records().enumerate() {
            let record = record?;
            let problem_id = match layout
                .get(&record, Column::ProblemId)
                .map(|v| v.trim().parse::<i64>())
            {
                Some(Ok(id)) => id,
                _ => {
                    warn!("Skipping row {}: bad problem id", order + 1);
                    continue;
                }
            };
            if !(self.problem_filter)(problem_id) {
                filtered += 1;
                continue;
            }
            let user_id = match layout
                .get(&record, Column::UserId)
                .map(|v| v.trim().parse::<i64>())
            {
                Some(Ok(id)) => id,
                _ => {
                    warn!("Skipping row {}: bad user id", order + 1);
                    continue;
                }
            };
            let code = match layout
                .get(&record, Column::Code)
                .and_then(|c| self.validator.validate(c))
            {
                Some(code) => code,
                None => {
                    debug!("Row {} rejected by code validator", order + 1);
                    rejected += 1;
                    continue;
                }
            };
            let verdict = parse_verdict(layout.get(&record, Column::Verdict).unwrap_or_default());
            let time = layout
                .get(&record, Column::Time)
                .and_then(|t| t.trim().parse().ok())
                .unwrap_or(i64::MAX);
            rows.push(Row {
                order,
                user_id,
                problem_id,
                verdict,
                time,
                code,
            });
        }
        debug!(
            "Read {} rows ({} filtered by problem, {} rejected)",
            rows.len(),
            filtered,
            rejected
        );
        Ok(rows)
    }
}

fn all_solutions(rows: Vec<Row>) -> Dataset {
    let mut registry = SessionRegistry::default();
    let sessions: Vec<i64> = rows
        .iter()
        .map(|row| registry.session(row.user_id, row.problem_id))
        .collect();

    let mut by_session: AHashMap<i64, Vec<(i64, usize)>> = AHashMap::new();
    for (row, &session) in rows.iter().zip(&sessions) {
        by_session.entry(session).or_default().push((row.time, row.order));
    }
    let mut ranks: AHashMap<usize, i64> = AHashMap::new();
    for (session, mut entries) in by_session {
        if entries.len() > 1000 {
            warn!("Session {} has {} submissions, ids will overlap", session, entries.len());
        }
        entries.sort_unstable();
        for (rank, (_, order)) in entries.into_iter().enumerate() {
            ranks.insert(order, rank as i64);
        }
    }

    let values = rows
        .into_iter()
        .zip(sessions)
        .map(|(row, session)| {
            let rank = ranks.get(&row.order).copied().unwrap_or(0);
            Solution::new(row.code, row.problem_id, session, session * 1000 + rank, row.verdict)
        })
        .collect();
    Dataset::new(values)
}

fn last_solutions(rows: Vec<Row>) -> Dataset {
    let mut registry = SessionRegistry::default();
    let mut kept: AHashMap<(i64, Verdict), (i64, Solution)> = AHashMap::new();

    for row in rows {
        let session = registry.session(row.user_id, row.problem_id);
        let replace = match kept.get(&(session, row.verdict)) {
            None => true,
            Some((time, _)) => match row.verdict {
                Verdict::Fail => row.time >= *time,
                Verdict::Ok => row.time <= *time,
            },
        };
        if replace {
            let solution = Solution::new(
                row.code,
                row.problem_id,
                session,
                session * 10 + row.verdict.ordinal(),
                row.verdict,
            );
            kept.insert((session, row.verdict), (row.time, solution));
        }
    }

    let mut values: Vec<Solution> = kept.into_values().map(|(_, s)| s).collect();
    values.sort_by_key(|s| s.solution_id);
    Dataset::new(values)
}
