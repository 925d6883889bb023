use super::LocalState;

pub fn run() -> anyhow::Result<()> {
    let state = LocalState::load()?;
    println!("{}", current_session(&state));
    Ok(())
}

fn current_session(state: &LocalState) -> String {
    state.sessions().get_or_create_session_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::temp_state;

    #[test]
    fn test_session_persists_between_runs() {
        let (_dir, state) = temp_state();
        let first = current_session(&state);
        assert!(first.starts_with("sess_"));
        assert_eq!(current_session(&state), first);
        assert!(state.paths.storage_dir().join("pf_session").exists());
    }
}
