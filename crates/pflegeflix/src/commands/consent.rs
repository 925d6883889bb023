use pflegeflix_core::{write_consent, ConsentProvider};
use pflegeflix_telemetry::{ConsentRecord, KeyValueStore};

use super::LocalState;
use crate::cli::ConsentAction;

pub fn run(action: Option<ConsentAction>) -> anyhow::Result<()> {
    let state = LocalState::load()?;
    println!("{}", apply(&state, action.unwrap_or(ConsentAction::Show))?);
    Ok(())
}

fn apply(state: &LocalState, action: ConsentAction) -> anyhow::Result<String> {
    let key = &state.config.consent_key;
    let record = match action {
        ConsentAction::Show => None,
        ConsentAction::Grant { marketing } => Some(ConsentRecord {
            analytics: true,
            marketing,
        }),
        ConsentAction::Revoke => Some(ConsentRecord::default()),
    };
    if let Some(record) = record {
        write_consent(state.store.as_ref(), key, &record)?;
        tracing::info!(analytics = record.analytics, marketing = record.marketing, "consent updated");
    }

    let raw = state.store.get(key)?;
    let output = serde_json::json!({
        "stored": raw,
        "analytics": state.consent().has_consent(),
    });
    Ok(output.to_string())
}
