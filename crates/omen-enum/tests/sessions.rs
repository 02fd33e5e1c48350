//! Save/restore: the resumed stream must be exactly the suffix the
//! uninterrupted stream would have produced.

mod common;

use common::train_model;
use omen_enum::{MarkovEnumerator, SessionError, SessionStore};

#[test]
fn resume_after_ten_guesses_continues_the_stream() {
    let model = train_model(&["abc", "bca", "cab", "aabc"], "abc", 2, 4, 6);

    let mut reference = MarkovEnumerator::new(&model).unwrap();
    let full: Vec<(String, u32)> = std::iter::from_fn(|| reference.next_guess())
        .take(20)
        .collect();
    assert_eq!(full.len(), 20);

    let tmp = tempfile::tempdir().unwrap();
    let store = SessionStore::new(
        tmp.path(),
        "resume-test",
        model.version(),
        "Default",
        model.uuid(),
    );

    let mut first_half = MarkovEnumerator::new(&model).unwrap();
    let head: Vec<(String, u32)> = std::iter::from_fn(|| first_half.next_guess())
        .take(10)
        .collect();
    store.save(&first_half.state()).unwrap();
    drop(first_half);

    let mut second_half = MarkovEnumerator::restore(&model, store.load().unwrap()).unwrap();
    let tail: Vec<(String, u32)> = std::iter::from_fn(|| second_half.next_guess())
        .take(10)
        .collect();

    let stitched: Vec<(String, u32)> = head.into_iter().chain(tail).collect();
    assert_eq!(stitched, full);
}

#[test]
fn save_is_idempotent_across_load() {
    // Saving immediately after restoring changes nothing.
    let model = train_model(&["ab", "ba"], "ab", 2, 2, 2);
    let tmp = tempfile::tempdir().unwrap();
    let store = SessionStore::new(tmp.path(), "s", model.version(), "Default", model.uuid());

    let mut enumerator = MarkovEnumerator::new(&model).unwrap();
    enumerator.next_guess();
    store.save(&enumerator.state()).unwrap();

    let restored = MarkovEnumerator::restore(&model, store.load().unwrap()).unwrap();
    store.save(&restored.state()).unwrap();
    assert_eq!(store.load().unwrap(), restored.state());
}

#[test]
fn session_from_a_retrained_ruleset_is_rejected() {
    let model = train_model(&["ab", "ba"], "ab", 2, 2, 2);
    let tmp = tempfile::tempdir().unwrap();

    let stale = SessionStore::new(tmp.path(), "s", model.version(), "Default", "stale-uuid");
    let mut enumerator = MarkovEnumerator::new(&model).unwrap();
    enumerator.next_guess();
    stale.save(&enumerator.state()).unwrap();

    let current = SessionStore::new(tmp.path(), "s", model.version(), "Default", model.uuid());
    assert!(matches!(
        current.load(),
        Err(SessionError::UuidMismatch { .. })
    ));
}

#[test]
fn fresh_state_round_trips_before_any_guess() {
    let model = train_model(&["ab", "ba"], "ab", 2, 2, 2);
    let tmp = tempfile::tempdir().unwrap();
    let store = SessionStore::new(tmp.path(), "s", model.version(), "Default", model.uuid());

    let mut reference = MarkovEnumerator::new(&model).unwrap();
    let all: Vec<(String, u32)> = std::iter::from_fn(|| reference.next_guess()).collect();

    let fresh = MarkovEnumerator::new(&model).unwrap();
    store.save(&fresh.state()).unwrap();
    drop(fresh);

    let mut restored = MarkovEnumerator::restore(&model, store.load().unwrap()).unwrap();
    let replay: Vec<(String, u32)> = std::iter::from_fn(|| restored.next_guess()).collect();
    assert_eq!(replay, all);
}

#[test]
fn exhausted_state_stays_exhausted_after_restore() {
    let model = train_model(&["ab", "ba"], "ab", 2, 2, 2);
    let tmp = tempfile::tempdir().unwrap();
    let store = SessionStore::new(tmp.path(), "s", model.version(), "Default", model.uuid());

    let mut enumerator = MarkovEnumerator::new(&model).unwrap();
    while enumerator.next_guess().is_some() {}
    store.save(&enumerator.state()).unwrap();

    let mut restored = MarkovEnumerator::restore(&model, store.load().unwrap()).unwrap();
    assert_eq!(restored.next_guess(), None);
}
