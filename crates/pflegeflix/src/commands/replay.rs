//! Replay a recorded visibility log through an impression tracker

use pflegeflix_core::Filters;
use pflegeflix_funnel::{ElementId, FunnelTracker, HeadlessWatcher, IntersectionEntry};
use pflegeflix_telemetry::read_jsonl;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use super::{runtime, LocalState};

/// One line of a visibility log
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ReplayStep {
    Track {
        element: ElementId,
        job_id: String,
        employer_id: String,
        #[serde(default)]
        filters: Option<Filters>,
    },
    Intersect {
        element: ElementId,
        ratio: f64,
    },
    Untrack {
        element: ElementId,
    },
    Wait {
        ms: u64,
    },
}

#[derive(Debug, Default, PartialEq)]
struct ReplaySummary {
    steps: usize,
    jobs: BTreeSet<String>,
    reported: BTreeSet<String>,
}

pub fn run(file: &str) -> anyhow::Result<()> {
    let steps: Vec<ReplayStep> = read_jsonl(Path::new(file))?;
    if steps.is_empty() {
        println!("No replay steps in {file}");
        return Ok(());
    }

    let state = LocalState::load()?;
    let tracker = state.funnel(state.page(None, None)?)?;
    if !tracker.has_consent() {
        println!("Analytics consent not granted; impressions will not be recorded.");
    }

    let summary = runtime()?.block_on(replay(&tracker, steps));
    println!(
        "Replayed {} steps: {} of {} jobs reported as impressions",
        summary.steps,
        summary.reported.len(),
        summary.jobs.len()
    );
    for job in &summary.reported {
        println!("  {job}");
    }
    Ok(())
}

async fn replay(tracker: &FunnelTracker, steps: Vec<ReplayStep>) -> ReplaySummary {
    let impressions = tracker.impressions(HeadlessWatcher::new().factory());
    let mut summary = ReplaySummary {
        steps: steps.len(),
        ..Default::default()
    };

    for step in steps {
        match step {
            ReplayStep::Track {
                element,
                job_id,
                employer_id,
                filters,
            } => {
                summary.jobs.insert(job_id.clone());
                // Cards stay tracked until an explicit untrack step
                let _ = impressions.track(element, &job_id, &employer_id, filters);
            }
            ReplayStep::Intersect { element, ratio } => {
                impressions.on_intersection(&[IntersectionEntry {
                    element,
                    is_intersecting: ratio > 0.0,
                    intersection_ratio: ratio,
                }]);
            }
            ReplayStep::Untrack { element } => impressions.untrack(element),
            ReplayStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
        }
    }

    // Let the last debounce windows close before tearing down
    let settle = tracker.config().impression_debounce() + Duration::from_millis(50);
    tokio::time::sleep(settle).await;
    impressions.untrack_all();

    summary.reported = summary
        .jobs
        .iter()
        .filter(|job| impressions.is_reported(job))
        .cloned()
        .collect();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::temp_state;
    use pflegeflix_core::write_consent;
    use pflegeflix_telemetry::{ConsentRecord, LoggedFunnelEvent};

    #[test]
    fn test_parse_steps() {
        let step: ReplayStep = serde_json::from_str(
            r#"{"op":"track","element":1,"job_id":"job1","employer_id":"emp1","filters":{"city":"Bonn"}}"#,
        )
        .unwrap();
        assert!(matches!(step, ReplayStep::Track { element: ElementId(1), .. }));

        let step: ReplayStep = serde_json::from_str(r#"{"op":"wait","ms":600}"#).unwrap();
        assert_eq!(step, ReplayStep::Wait { ms: 600 });
    }

    #[test]
    fn test_replay_reports_each_job_once() {
        let (_dir, state) = temp_state();
        write_consent(
            state.store.as_ref(),
            &state.config.consent_key,
            &ConsentRecord { analytics: true, marketing: false },
        )
        .unwrap();
        let tracker = state.funnel(state.page(None, None).unwrap()).unwrap();

        let log = [
            r#"{"op":"track","element":1,"job_id":"job1","employer_id":"emp1"}"#,
            r#"{"op":"track","element":2,"job_id":"job2","employer_id":"emp2"}"#,
            r#"{"op":"intersect","element":1,"ratio":0.9}"#,
            r#"{"op":"wait","ms":600}"#,
            r#"{"op":"intersect","element":1,"ratio":1.0}"#,
            r#"{"op":"intersect","element":2,"ratio":0.2}"#,
            r#"{"op":"wait","ms":600}"#,
        ];
        let steps: Vec<ReplayStep> = log.iter().map(|l| serde_json::from_str(l).unwrap()).collect();

        let summary = runtime().unwrap().block_on(replay(&tracker, steps));
        assert_eq!(summary.steps, 7);
        assert_eq!(summary.jobs.len(), 2);
        assert_eq!(summary.reported.iter().collect::<Vec<_>>(), ["job1"]);

        let logged: Vec<LoggedFunnelEvent> = read_jsonl(&state.paths.funnel_log()).unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].event.job_id, "job1");
    }
}
