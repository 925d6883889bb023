use pflegeflix_core::TrackerConfig;
use pflegeflix_funnel::{Collector, EventDispatcher, NoopCollector, PlausibleCollector, TrackedEvent};
use std::sync::Arc;

use super::{parse_pairs, runtime, LocalState};
use crate::cli::EventArgs;

const PAGEVIEW: &str = "pageview";

pub fn run(args: EventArgs) -> anyhow::Result<()> {
    let state = LocalState::load()?;
    let page = state.page(args.url.as_deref(), None)?;
    let collector = collector_for(&state.config);
    let dispatcher = EventDispatcher::new(state.consent(), collector, page);

    if !dispatcher.mount() {
        println!("Collector not loaded (no analytics consent or bad configuration); event dropped.");
        return Ok(());
    }

    let rt = runtime()?;
    if args.name.eq_ignore_ascii_case(PAGEVIEW) {
        rt.block_on(dispatcher.track_page_view(None));
    } else {
        let event: TrackedEvent = args.name.parse().map_err(anyhow::Error::msg)?;
        let props = parse_pairs(&args.props)?;
        rt.block_on(dispatcher.track_event(event, props));
    }
    dispatcher.unmount();
    Ok(())
}

fn collector_for(config: &TrackerConfig) -> Arc<dyn Collector> {
    match &config.collector {
        Some(collector) => Arc::new(PlausibleCollector::new(
            collector.clone(),
            config.request_timeout(),
        )),
        None => {
            tracing::warn!("no analytics collector configured, events are discarded");
            Arc::new(NoopCollector::new())
        }
    }
}
