use pflegeflix_core::FunnelEventType;
use pflegeflix_telemetry::{read_jsonl, LoggedFunnelEvent, Paths};
use std::collections::HashSet;

fn filter_events<'a>(events: &'a [LoggedFunnelEvent], job: Option<&str>) -> Vec<&'a LoggedFunnelEvent> {
    events
        .iter()
        .filter(|l| job.map_or(true, |job| l.event.job_id == job))
        .collect()
}

fn compute_stats(events: &[&LoggedFunnelEvent]) -> String {
    if events.is_empty() {
        return "No funnel events to analyze.".to_string();
    }

    let counts: Vec<(FunnelEventType, usize)> = FunnelEventType::ALL
        .into_iter()
        .map(|t| (t, events.iter().filter(|l| l.event.event_type == t).count()))
        .collect();

    let sessions: HashSet<&str> = events.iter().map(|l| l.event.session_id.as_str()).collect();
    let jobs: HashSet<&str> = events.iter().map(|l| l.event.job_id.as_str()).collect();

    let mut lines = vec![
        format!("Total events: {}", events.len()),
        format!("Sessions: {}", sessions.len()),
        format!("Jobs: {}", jobs.len()),
    ];
    for (event_type, count) in counts {
        lines.push(format!("  {:<13} {}", event_type.as_str(), count));
    }
    lines.join("\n")
}

pub fn run(stats: bool, job: Option<&str>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let events: Vec<LoggedFunnelEvent> = read_jsonl(&paths.funnel_log())?;

    if events.is_empty() {
        println!("No funnel events logged");
        return Ok(());
    }

    let filtered = filter_events(&events, job);
    if stats {
        println!("{}", compute_stats(&filtered));
        return Ok(());
    }

    let recent: Vec<_> = filtered.into_iter().rev().take(20).collect();
    println!("Recent Funnel Events (last {})", recent.len());
    println!("==============================");
    for logged in recent {
        let e = &logged.event;
        println!(
            "{} {:<13} job={} employer={} device={} source={} session={}",
            logged.logged_at.format("%Y-%m-%d %H:%M:%S"),
            e.event_type.as_str(),
            e.job_id,
            e.employer_id,
            e.device,
            e.source,
            e.session_id
        );
    }
    Ok(())
}
