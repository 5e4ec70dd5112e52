use research_core::{update, AppState, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn loaded_asks_for_status_without_touching_state() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::Loaded);

    assert_eq!(state, next);
    assert_eq!(effects, vec![research_core::Effect::CheckStatus]);
}
