//! Caller-side execution of analyses: wall-clock budgets and bounded parallelism.
//!
//! The analyzers have no cancellation hook, so a call that overruns its budget is
//! abandoned on the blocking pool and reported as an error. Abandoned work keeps
//! its concurrency permit until it actually returns.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::sync::Semaphore;
use tracing::{Instrument, error, info};

use crate::analyzers::analyzer::{AreaOutcome, analyze_area};
use crate::analyzers::types::LaneInput;
use crate::config::AnalysisConfig;

/// Runs `f` on the blocking pool, failing if it does not finish within `budget`.
pub async fn run_with_budget<T, F>(budget: Duration, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(budget, task).await {
        Ok(joined) => Ok(joined?),
        Err(_) => Err(anyhow!(
            "analysis exceeded wall-clock budget of {} ms",
            budget.as_millis()
        )),
    }
}

/// A named set of lanes analyzed as one area.
#[derive(Debug, Clone)]
pub struct AreaJob {
    pub name: String,
    pub lanes: Vec<LaneInput>,
}

/// Runs named jobs under `budget`, at most `concurrency` at a time.
/// Results are returned in input order.
///
/// A job's permit is held by the blocking closure itself, so a job abandoned
/// after a budget overrun still counts against `concurrency` until it ends.
pub async fn run_bounded<T, F>(
    jobs: Vec<(String, F)>,
    budget: Duration,
    concurrency: usize,
) -> Vec<(String, Result<T>)>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(jobs.len());

    for (name, job) in jobs {
        let sem = semaphore.clone();
        let span = tracing::info_span!("analysis_job", job = %name);

        let task = tokio::spawn(
            async move {
                let permit = sem.acquire_owned().await?;
                run_with_budget(budget, move || {
                    let _permit = permit;
                    job()
                })
                .await
            }
            .instrument(span),
        );

        tasks.push((name, task));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for (name, task) in tasks {
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(e.into()),
        };
        match &outcome {
            Ok(_) => info!(job = %name, "Job finished"),
            Err(e) => error!(job = %name, error = %e, "Job failed"),
        }
        results.push((name, outcome));
    }

    results
}

/// Analyzes independent areas in parallel, at most `concurrency` at a time.
/// Results are returned in input order.
pub async fn analyze_many(
    jobs: Vec<AreaJob>,
    config: &AnalysisConfig,
    concurrency: usize,
) -> Vec<(String, Result<AreaOutcome>)> {
    let budget = Duration::from_millis(config.time_budget_ms);
    let jobs: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let config = config.clone();
            let lanes = job.lanes;
            (job.name, move || analyze_area(&lanes, &config))
        })
        .collect();

    run_bounded(jobs, budget, concurrency).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::DamagePoint;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_run_with_budget_returns_value() {
        let v = run_with_budget(Duration::from_secs(5), || 21 * 2).await.unwrap();
        assert_eq!(v, 42);
    }

    #[tokio::test]
    async fn test_run_with_budget_times_out() {
        let result = run_with_budget(Duration::from_millis(10), || {
            std::thread::sleep(Duration::from_millis(300));
        })
        .await;
        assert!(result.unwrap_err().to_string().contains("budget"));
    }

    #[tokio::test]
    async fn test_analyze_many_keeps_order() {
        let lane = |id: &str, n: usize| LaneInput {
            id: id.to_string(),
            road_name: None,
            condition: None,
            coordinates: vec![],
            damage_points: (0..n)
                .map(|i| DamagePoint::new(31.23 + i as f64 * 0.0001, 121.47))
                .collect(),
        };
        let jobs = vec![
            AreaJob {
                name: "empty".to_string(),
                lanes: vec![lane("a", 0)],
            },
            AreaJob {
                name: "busy".to_string(),
                lanes: vec![lane("b", 5)],
            },
        ];

        let results = analyze_many(jobs, &AnalysisConfig::default(), 2).await;
        assert_eq!(results[0].0, "empty");
        assert!(matches!(results[0].1, Ok(AreaOutcome::NoData(_))));
        assert_eq!(results[1].0, "busy");
        assert!(matches!(results[1].1, Ok(AreaOutcome::Analyzed(_))));
    }

    #[tokio::test]
    async fn test_timed_out_jobs_keep_their_permit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..4)
            .map(|i| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                let job = move || {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(150));
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                };
                (format!("job-{i}"), job)
            })
            .collect();

        let results = run_bounded(jobs, Duration::from_millis(10), 1).await;
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|(_, r)| r.is_err()));
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
