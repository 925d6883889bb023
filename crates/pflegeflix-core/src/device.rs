//! User-agent based device classification

use pflegeflix_telemetry::DeviceType;
use regex::Regex;
use std::sync::OnceLock;

static TABLET_RE: OnceLock<Regex> = OnceLock::new();
static ANDROID_RE: OnceLock<Regex> = OnceLock::new();
static MOBI_RE: OnceLock<Regex> = OnceLock::new();
static MOBILE_RE: OnceLock<Regex> = OnceLock::new();

/// Classify a user agent. Tablets are matched before the generic mobile
/// pattern so Android tablets never land in the mobile bucket.
pub fn classify_device(user_agent: &str) -> DeviceType {
    if is_tablet(user_agent) {
        return DeviceType::Tablet;
    }

    let mobile = MOBILE_RE.get_or_init(|| {
        Regex::new(
            r"Mobile|iP(hone|od)|Android|BlackBerry|IEMobile|Kindle|Silk-Accelerated|(hpw|web)OS|Opera M(obi|ini)",
        )
        .unwrap()
    });
    if mobile.is_match(user_agent) {
        DeviceType::Mobile
    } else {
        DeviceType::Desktop
    }
}

fn is_tablet(user_agent: &str) -> bool {
    let keywords =
        TABLET_RE.get_or_init(|| Regex::new(r"(?i)tablet|ipad|playbook|silk").unwrap());
    if keywords.is_match(user_agent) {
        return true;
    }

    // Android without "mobi" anywhere after it is a tablet
    let android = ANDROID_RE.get_or_init(|| Regex::new(r"(?i)android").unwrap());
    let mobi = MOBI_RE.get_or_init(|| Regex::new(r"(?i)mobi").unwrap());
    android
        .find(user_agent)
        .is_some_and(|m| !mobi.is_match(&user_agent[m.end()..]))
}
