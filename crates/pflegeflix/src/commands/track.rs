use pflegeflix_core::FunnelEventType;
use pflegeflix_funnel::FunnelTracker;

use super::{parse_pairs, runtime, LocalState};
use crate::cli::TrackArgs;

pub fn run(args: TrackArgs) -> anyhow::Result<()> {
    check_ids(&args)?;
    let state = LocalState::load()?;
    let page = state.page(args.url.as_deref(), args.user_agent.as_deref())?;
    let tracker = state.funnel(page)?;

    if !tracker.has_consent() {
        println!("Analytics consent not granted; nothing recorded. Run `pflegeflix consent grant` first.");
        return Ok(());
    }

    let filters = parse_pairs(&args.filters)?;
    let filters = (!filters.is_empty()).then_some(filters);

    runtime()?.block_on(record(&tracker, &args, filters));
    println!(
        "{} submitted for job {} (delivery errors, if any, are logged above)",
        args.event_type, args.job
    );
    Ok(())
}

/// Blank ids are silent no-ops in the tracker; reject them up front
fn check_ids(args: &TrackArgs) -> anyhow::Result<()> {
    anyhow::ensure!(!args.job.trim().is_empty(), "--job must not be empty");
    anyhow::ensure!(!args.employer.trim().is_empty(), "--employer must not be empty");
    Ok(())
}

async fn record(tracker: &FunnelTracker, args: &TrackArgs, filters: Option<pflegeflix_core::Filters>) {
    let (job, employer) = (args.job.as_str(), args.employer.as_str());
    match args.event_type {
        FunnelEventType::DetailView => {
            tracing::info!(
                delay_ms = tracker.config().detail_view_delay_ms,
                "waiting for detail view dwell time"
            );
            tracker.track_detail_view(job, employer, filters).join().await;
        }
        FunnelEventType::ListClick => tracker.track_list_click(job, employer, filters).await,
        FunnelEventType::ApplyOpen => tracker.track_apply_open(job, employer, filters).await,
        FunnelEventType::ApplySubmit => tracker.track_apply_submit(job, employer, filters).await,
        FunnelEventType::Impression => {
            tracker
                .track_funnel_event(FunnelEventType::Impression, job, employer, filters)
                .await
        }
    }
}
