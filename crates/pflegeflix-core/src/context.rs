//! Page context attached to every tracked event

use std::sync::{PoisonError, RwLock};
use url::Url;

use crate::error::CoreError;

/// UTM campaign parameters; absent or blank parameters are `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

pub fn utm_params(url: &Url) -> UtmParams {
    let lookup = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    };

    UtmParams {
        utm_source: lookup("utm_source"),
        utm_medium: lookup("utm_medium"),
        utm_campaign: lookup("utm_campaign"),
    }
}

/// Where the user is and who they are, as seen by the tracker
pub trait PageEnvironment: Send + Sync {
    fn location(&self) -> Url;

    fn referrer(&self) -> Option<String>;

    fn user_agent(&self) -> String;

    fn locale(&self) -> String;

    /// Authenticated user, if any
    fn user_id(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
struct Snapshot {
    location: Url,
    referrer: Option<String>,
    user_agent: String,
    locale: String,
    user_id: Option<String>,
}

/// Mutable page environment updated by the host on navigation and sign-in
#[derive(Debug)]
pub struct PageState {
    inner: RwLock<Snapshot>,
}

impl PageState {
    pub fn new(location: Url, user_agent: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(Snapshot {
                location,
                referrer: None,
                user_agent: user_agent.into(),
                locale: locale.into(),
                user_id: None,
            }),
        }
    }

    pub fn parse(location: &str, user_agent: &str, locale: &str) -> Result<Self, CoreError> {
        Ok(Self::new(Url::parse(location)?, user_agent, locale))
    }

    /// Move to `location`; the previous page becomes the referrer
    pub fn navigate(&self, location: Url) {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut snapshot.location, location);
        snapshot.referrer = Some(previous.to_string());
    }

    pub fn set_referrer(&self, referrer: Option<String>) {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.referrer = referrer.filter(|r| !r.is_empty());
    }

    pub fn set_user(&self, user_id: Option<String>) {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.user_id = user_id;
    }

    fn read(&self) -> Snapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PageEnvironment for PageState {
    fn location(&self) -> Url {
        self.read().location
    }

    fn referrer(&self) -> Option<String> {
        self.read().referrer
    }

    fn user_agent(&self) -> String {
        self.read().user_agent
    }

    fn locale(&self) -> String {
        self.read().locale
    }

    fn user_id(&self) -> Option<String> {
        self.read().user_id
    }
}
