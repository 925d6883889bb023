use clap::{Args, Parser, Subcommand};
use pflegeflix_core::FunnelEventType;

#[derive(Parser)]
#[command(name = "pflegeflix")]
#[command(version)]
#[command(about = "Consent-gated job funnel tracking for Pflegeflix")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or change the stored cookie consent
    Consent {
        #[command(subcommand)]
        action: Option<ConsentAction>,
    },

    /// Print the current session id, refreshing or rotating it
    Session,

    /// Classify a user agent as desktop, tablet or mobile
    Device {
        user_agent: String,
    },

    /// Record one funnel event for a job listing
    Track(TrackArgs),

    /// Send a product-analytics event to the collector
    Event(EventArgs),

    /// Drive impression tracking from a JSONL visibility log
    Replay {
        file: String,
    },

    /// Show locally logged funnel events
    History {
        /// Show per-stage counts instead of events
        #[arg(long)]
        stats: bool,

        /// Only events for this job
        #[arg(long)]
        job: Option<String>,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConsentAction {
    /// Print the stored consent record
    Show,
    /// Grant analytics consent
    Grant {
        /// Also grant marketing consent
        #[arg(long)]
        marketing: bool,
    },
    /// Withdraw all consent
    Revoke,
}

#[derive(Args, Debug)]
pub struct TrackArgs {
    /// impression, list_click, detail_view, apply_open or apply_submit
    pub event_type: FunnelEventType,

    #[arg(long)]
    pub job: String,

    #[arg(long)]
    pub employer: String,

    /// Page the event happened on (defaults to the site URL)
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub user_agent: Option<String>,

    /// Active search filter as key=value (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EventArgs {
    /// Event name such as "Job Search" or job-search; "pageview" sends a page view
    pub name: String,

    /// Property as key=value (repeatable)
    #[arg(long = "prop")]
    pub props: Vec<String>,

    #[arg(long)]
    pub url: Option<String>,
}
