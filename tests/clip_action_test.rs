use instant::Duration;
use vitrine::animation::ClipAction;

/// Run frames until the action clamps at one of its ends.
fn settle(action: &mut ClipAction) {
    for _ in 0..10_000 {
        action.advance(Duration::from_millis(16));
        if action.is_paused() {
            return;
        }
    }
    panic!("clip action never reached a rest state");
}

#[test]
fn open_settles_paused_at_the_clip_end() {
    let mut action = ClipAction::with_duration(2.0);
    action.open();
    settle(&mut action);

    assert!(action.is_paused());
    assert_eq!(action.time(), action.duration());
}

#[test]
fn close_after_open_settles_paused_at_zero() {
    let mut action = ClipAction::with_duration(2.0);
    action.open();
    settle(&mut action);

    action.close();
    settle(&mut action);

    assert!(action.is_paused());
    assert_eq!(action.time(), 0.0);
}

#[test]
fn close_before_any_open_is_well_defined() {
    let mut action = ClipAction::with_duration(2.0);
    // never opened; the display is interpreted as already closed
    action.close();
    settle(&mut action);

    assert!(action.is_paused());
    assert_eq!(action.time(), 0.0);
}

#[test]
fn toggling_ends_in_the_same_open_rest_state_as_a_single_open() {
    let mut single = ClipAction::with_duration(2.0);
    single.open();
    settle(&mut single);

    let mut toggled = ClipAction::with_duration(2.0);
    toggled.open();
    toggled.close();
    toggled.open();
    settle(&mut toggled);

    assert_eq!(toggled.time(), single.time());
    assert_eq!(toggled.is_paused(), single.is_paused());
    assert_eq!(toggled.time_scale(), single.time_scale());
}

#[test]
fn advancing_while_paused_does_nothing() {
    let mut action = ClipAction::with_duration(2.0);
    for _ in 0..100 {
        action.advance(Duration::from_millis(16));
    }
    assert!(action.is_paused());
    assert_eq!(action.time(), 0.0);
}

#[test]
fn rest_states_are_stable_under_further_frames() {
    let mut action = ClipAction::with_duration(2.0);
    action.open();
    settle(&mut action);

    for _ in 0..100 {
        action.advance(Duration::from_secs(1));
    }
    assert_eq!(action.time(), action.duration());
    assert!(action.is_paused());
}

#[test]
fn reversal_mid_flight_needs_no_debounce() {
    let mut action = ClipAction::with_duration(2.0);
    action.open();
    for _ in 0..10 {
        action.advance(Duration::from_millis(16));
    }
    assert!(!action.is_paused());

    // interrupt the opening; the close must still settle cleanly at zero
    action.close();
    assert_eq!(action.time_scale(), -1.0);
    settle(&mut action);
    assert_eq!(action.time(), 0.0);
}
