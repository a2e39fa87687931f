use crate::model::{Dataset, Solution, Verdict};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::info;

/// Splits a dataset into (train, test) by whole sessions.
///
/// Sessions are shuffled with `seed`; a session with at least one failed
/// submission goes to test while test holds fewer than `test_size` failed
/// submissions. Everything else goes to train.
pub fn split_sessions(dataset: &Dataset, test_size: usize, seed: u64) -> (Dataset, Dataset) {
    let mut sessions: BTreeMap<i64, Vec<Solution>> = BTreeMap::new();
    for solution in dataset.values() {
        sessions
            .entry(solution.session_id)
            .or_default()
            .push(solution.clone());
    }
    let mut sessions: Vec<Vec<Solution>> = sessions.into_values().collect();
    let mut rng = StdRng::seed_from_u64(seed);
    sessions.shuffle(&mut rng);

    let mut train = Vec::new();
    let mut test = Vec::new();
    let mut test_incorrect = 0usize;
    for session in sessions {
        let (incorrect, correct): (Vec<Solution>, Vec<Solution>) = session
            .into_iter()
            .partition(|s| s.verdict == Verdict::Fail);
        let target = if test_incorrect < test_size && !incorrect.is_empty() {
            test_incorrect += incorrect.len();
            &mut test
        } else {
            &mut train
        };
        target.extend(incorrect);
        target.extend(correct);
    }

    info!(
        "Split {} solutions into {} train / {} test ({} incorrect in test)",
        dataset.len(),
        train.len(),
        test.len(),
        test_incorrect
    );
    (Dataset::new(train), Dataset::new(test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let mut values = Vec::new();
        for session in 0..10 {
            values.push(Solution::new("", 1, session, session * 10 + 1, Verdict::Fail));
            values.push(Solution::new("", 1, session, session * 10, Verdict::Ok));
        }
        values.push(Solution::new("", 1, 10, 100, Verdict::Ok));
        Dataset::new(values)
    }

    #[test]
    fn test_sessions_stay_whole() {
        let (train, test) = split_sessions(&dataset(), 3, 7);
        assert_eq!(test.incorrect().len(), 3);
        assert_eq!(train.len() + test.len(), 21);
        for solution in test.values() {
            assert!(test.values().iter().any(|s| s.session_id == solution.session_id
                && s.verdict != solution.verdict));
        }
        assert!(train.values().iter().any(|s| s.session_id == 10));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let ids = |d: &Dataset| d.values().iter().map(|s| s.solution_id).collect::<Vec<_>>();
        let (_, a) = split_sessions(&dataset(), 4, 42);
        let (_, b) = split_sessions(&dataset(), 4, 42);
        assert_eq!(ids(&a), ids(&b));
    }
}
