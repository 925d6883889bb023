//! Product-analytics event names

use std::fmt;
use std::str::FromStr;

/// Closed set of product events forwarded to the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedEvent {
    JobSearch,
    FilterApplied,
    JobSaved,
    SavedSearchCreated,
    JobAlertSubscribed,
    ApplicationStarted,
    ApplicationSubmitted,
    CoverLetterGenerated,
    CommuteCalculated,
    EmployerSignup,
    JobPosted,
    NewsletterSignup,
}

impl TrackedEvent {
    pub const ALL: [TrackedEvent; 12] = [
        Self::JobSearch,
        Self::FilterApplied,
        Self::JobSaved,
        Self::SavedSearchCreated,
        Self::JobAlertSubscribed,
        Self::ApplicationStarted,
        Self::ApplicationSubmitted,
        Self::CoverLetterGenerated,
        Self::CommuteCalculated,
        Self::EmployerSignup,
        Self::JobPosted,
        Self::NewsletterSignup,
    ];

    /// Goal name as configured in the collector dashboard
    pub fn name(&self) -> &'static str {
        match self {
            Self::JobSearch => "Job Search",
            Self::FilterApplied => "Filter Applied",
            Self::JobSaved => "Job Saved",
            Self::SavedSearchCreated => "Saved Search Created",
            Self::JobAlertSubscribed => "Job Alert Subscribed",
            Self::ApplicationStarted => "Application Started",
            Self::ApplicationSubmitted => "Application Submitted",
            Self::CoverLetterGenerated => "Cover Letter Generated",
            Self::CommuteCalculated => "Commute Calculated",
            Self::EmployerSignup => "Employer Signup",
            Self::JobPosted => "Job Posted",
            Self::NewsletterSignup => "Newsletter Signup",
        }
    }
}

impl fmt::Display for TrackedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrackedEvent {
    type Err = String;

    /// Accepts the goal name or its kebab-case form (`job-search`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', " ");
        Self::ALL
            .into_iter()
            .find(|e| e.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("unknown event: {s}"))
    }
}
