//! # Status Aggregator
//!
//! Rolls a monitor's stored run history up into one success flag according
//! to its [`SuccessPolicy`]. The per-run `success` flag of a
//! [`RunRecord`](crate::models::RunRecord) is not consulted for `all`.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use crate::{
    models::{HistoryEntry, RunKind, SuccessPolicy},
    persistence::{error::PersistenceError, traits::WatchtowerRepository},
};

/// Errors raised while recomputing a monitor status.
#[derive(Debug, Error)]
pub enum StatusError {
    /// History could not be read or the status could not be written.
    #[error("Failed to recompute status of '{monitor}': {source}")]
    Persistence {
        /// The monitor whose status was being recomputed.
        monitor: String,
        /// The underlying failure.
        #[source]
        source: PersistenceError,
    },
}

/// Whether `a` happened after `b`. Equal run times fall back to row ids.
fn is_later(a: &HistoryEntry, b: &HistoryEntry) -> bool {
    (a.run_time, a.id) > (b.run_time, b.id)
}

/// `all`: the latest non-ignored validator entry per validator name must be
/// successful. Run entries and ignored entries are skipped; no qualifying
/// history at all counts as success.
pub fn all_latest_succeeded(history: &[HistoryEntry]) -> bool {
    let mut latest: HashMap<&str, &HistoryEntry> = HashMap::new();
    for entry in history.iter().filter(|e| e.run_kind == RunKind::Validator && !e.ignored) {
        match latest.get(entry.name.as_str()) {
            Some(current) if !is_later(entry, current) => {}
            _ => {
                latest.insert(entry.name.as_str(), entry);
            }
        }
    }
    latest.values().all(|entry| entry.success)
}

/// `last`: the success flag of the most recent run entry, `true` when there
/// are no runs.
pub fn last_run_succeeded(history: &[HistoryEntry]) -> bool {
    history
        .iter()
        .filter(|e| e.run_kind == RunKind::Run)
        .reduce(|latest, entry| if is_later(entry, latest) { entry } else { latest })
        .is_none_or(|entry| entry.success)
}

/// Applies `policy` to `history`.
pub fn compute_status(policy: SuccessPolicy, history: &[HistoryEntry]) -> bool {
    match policy {
        SuccessPolicy::All => all_latest_succeeded(history),
        SuccessPolicy::Last => last_run_succeeded(history),
    }
}

/// Reads the monitor's history, computes its status and writes it back.
/// Recomputing twice over the same history writes the same flag.
#[tracing::instrument(skip(repo), level = "debug")]
pub async fn recompute_status(
    repo: &dyn WatchtowerRepository,
    monitor: &str,
    policy: SuccessPolicy,
) -> Result<bool, StatusError> {
    let wrap = |source| StatusError::Persistence {
        monitor: monitor.to_string(),
        source,
    };

    let kind = match policy {
        SuccessPolicy::All => RunKind::Validator,
        SuccessPolicy::Last => RunKind::Run,
    };
    let history = repo
        .list_run_history(monitor, None, kind)
        .await
        .map_err(wrap)?;
    let success = compute_status(policy, &history);

    repo
        .update_status(monitor, success, Utc::now())
        .await
        .map_err(wrap)?;
    tracing::info!(
        monitor,
        %policy,
        success,
        entries = history.len(),
        "Monitor status recomputed."
    );
    Ok(success)
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::{persistence::traits::MockWatchtowerRepository, test_helpers::HistoryEntryBuilder};

    fn validator(id: i64, name: &str, success: bool) -> HistoryEntry {
        HistoryEntryBuilder::new(id, name).success(success).build()
    }

    fn run(id: i64, success: bool) -> HistoryEntry {
        HistoryEntryBuilder::new(id, "run").kind(RunKind::Run).success(success).build()
    }

    #[test]
    fn test_empty_history_is_successful() {
        assert!(compute_status(SuccessPolicy::All, &[]));
        assert!(compute_status(SuccessPolicy::Last, &[]));
    }

    #[test]
    fn test_all_uses_latest_result_per_validator() {
        let history = vec![
            validator(1, "x", false),
            validator(2, "y", true),
            validator(3, "x", true),
            validator(4, "y", false),
        ];
        assert!(!compute_status(SuccessPolicy::All, &history));

        let recovered = vec![validator(1, "x", false), validator(2, "x", true)];
        assert!(compute_status(SuccessPolicy::All, &recovered));
    }

    #[test]
    fn test_all_skips_ignored_entries() {
        let history = vec![
            validator(1, "x", true),
            HistoryEntryBuilder::new(2, "x").success(false).ignored().build(),
        ];
        assert!(compute_status(SuccessPolicy::All, &history));

        let only_ignored = vec![HistoryEntryBuilder::new(1, "y").success(false).ignored().build()];
        assert!(compute_status(SuccessPolicy::All, &only_ignored));
    }

    #[test]
    fn test_ties_on_run_time_are_broken_by_id() {
        let time = HistoryEntryBuilder::new(0, "x").build().run_time;
        let history = vec![
            HistoryEntryBuilder::new(8, "x").success(false).run_time(time).build(),
            HistoryEntryBuilder::new(7, "x").success(true).run_time(time).build(),
        ];
        assert!(!compute_status(SuccessPolicy::All, &history));
    }

    #[test]
    fn test_two_validators_one_failing_under_both_policies() {
        let history = vec![
            validator(1, "x", true),
            validator(2, "y", false),
            run(3, true),
        ];
        assert!(!compute_status(SuccessPolicy::All, &history));
        assert!(compute_status(SuccessPolicy::Last, &history));
    }

    #[test]
    fn test_last_follows_most_recent_run() {
        let history = vec![run(1, true), run(2, false)];
        assert!(!compute_status(SuccessPolicy::Last, &history));
        let history = vec![run(2, false), run(3, true), validator(4, "x", false)];
        assert!(compute_status(SuccessPolicy::Last, &history));
    }

    #[tokio::test]
    async fn test_recompute_status_writes_result() {
        let mut repo = MockWatchtowerRepository::new();
        repo
            .expect_list_run_history()
            .with(eq("wt"), eq(None::<String>), eq(RunKind::Validator))
            .times(2)
            .returning(|_, _, _| Ok(vec![validator(1, "x", true), validator(2, "y", false)]));
        repo
            .expect_update_status()
            .withf(|monitor, success, _| monitor == "wt" && !*success)
            .times(2)
            .returning(|_, _, _| Ok(()));

        let first = recompute_status(&repo, "wt", SuccessPolicy::All)
            .await
            .unwrap();
        let second = recompute_status(&repo, "wt", SuccessPolicy::All)
            .await
            .unwrap();

        assert!(!first);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_recompute_status_reads_runs_for_last() {
        let mut repo = MockWatchtowerRepository::new();
        repo
            .expect_list_run_history()
            .with(eq("wt"), eq(None::<String>), eq(RunKind::Run))
            .times(1)
            .returning(|_, _, _| Ok(vec![run(1, true)]));
        repo
            .expect_update_status()
            .times(1)
            .returning(|_, _, _| Ok(()));

        assert!(recompute_status(&repo, "wt", SuccessPolicy::Last).await.unwrap());
    }

    #[tokio::test]
    async fn test_recompute_status_propagates_persistence_errors() {
        let mut repo = MockWatchtowerRepository::new();
        repo
            .expect_list_run_history()
            .returning(|_, _, _| Err(PersistenceError::OperationFailed("disk full".into())));
        repo.expect_update_status().never();

        let result = recompute_status(&repo, "wt", SuccessPolicy::All).await;

        assert!(matches!(
            result,
            Err(StatusError::Persistence { ref monitor, .. }) if monitor == "wt"
        ));
    }
}
