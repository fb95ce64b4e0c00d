use sampler_core::config::ConfigOptions;
use sampler_core::runtime::testing::{FakeRuntime, FakeSymbolizer, FakeUnwinder};
use sampler_core::session::Session;
use std::sync::Arc;

fn session_with(options: ConfigOptions, stack: Vec<(&str, &str, i32)>) -> Session {
    Session::new(
        ConfigOptions { test_no_install_timer: true, ..options },
        Arc::new(FakeRuntime::with_stack(stack)),
        Arc::new(FakeSymbolizer::new(vec![])),
        Arc::new(FakeUnwinder::with_pcs(vec![])),
    )
    .unwrap()
}

#[test]
fn empty_session_yields_empty_profile() {
    let session = session_with(ConfigOptions::default(), vec![]);
    session.start().unwrap();
    let profile = session.stop().unwrap();

    assert_eq!(profile.collected_sample_count, 0);
    assert_eq!(profile.dropped_sample_count, 0);
    assert!(profile.samples.is_empty());
    assert!(profile.locations.is_empty());
    assert!(profile.functions.is_empty());
}

#[test]
fn single_frame_sample_has_one_of_everything() {
    let session = session_with(ConfigOptions::default(), vec![("f", "a.rb", 17)]);
    session.start().unwrap();
    session.fire_for_test();
    let profile = session.stop().unwrap();

    assert_eq!(profile.functions.len(), 1);
    assert_eq!(profile.functions[0].name, "f");
    assert_eq!(profile.locations.len(), 1);
    assert_eq!(profile.locations[0].lineno, 17);
    assert_eq!(profile.samples.len(), 1);
    assert_eq!(profile.samples[0].stack, vec![0]);
    assert_eq!(profile.samples[0].count, 1);
}

#[test]
fn identical_consecutive_stacks_on_one_thread_deduplicate() {
    let session = session_with(ConfigOptions::default(), vec![("f", "a.rb", 1), ("g", "a.rb", 2)]);
    session.start().unwrap();
    session.fire_for_test();
    session.fire_for_test();
    let profile = session.stop().unwrap();

    assert_eq!(profile.samples.len(), 1);
    assert_eq!(profile.samples[0].count, 2);
    assert_eq!(profile.functions.len(), 2);
    assert_eq!(profile.locations.len(), 2);
}

#[test]
fn same_stack_on_two_threads_stays_separate() {
    let runtime = Arc::new(FakeRuntime::with_stack(vec![("f", "a.rb", 1)]));
    let session = Session::new(
        ConfigOptions { test_no_install_timer: true, ..ConfigOptions::default() },
        Arc::clone(&runtime) as Arc<dyn sampler_core::runtime::ManagedRuntime>,
        Arc::new(FakeSymbolizer::new(vec![])),
        Arc::new(FakeUnwinder::with_pcs(vec![])),
    )
    .unwrap();

    session.start().unwrap();
    runtime.set_thread_id(1);
    session.fire_for_test();
    runtime.set_thread_id(2);
    session.fire_for_test();
    let profile = session.stop().unwrap();

    assert_eq!(profile.samples.len(), 2);
    let threads: Vec<u64> = profile.samples.iter().map(|s| s.thread_id).collect();
    assert!(threads.contains(&1));
    assert!(threads.contains(&2));
}

#[test]
fn gc_mark_phase_drops_ticks_without_surfacing_an_error() {
    let session = session_with(ConfigOptions::default(), vec![("f", "a.rb", 1)]);
    session.start().unwrap();
    session.on_gc_mark_start();
    session.fire_for_test();
    session.fire_for_test();
    session.fire_for_test();
    session.on_gc_mark_end();
    session.fire_for_test();
    let profile = session.stop().unwrap();

    assert_eq!(profile.dropped_sample_count, 3);
    assert_eq!(profile.collected_sample_count, 1);
    assert_eq!(profile.samples.len(), 1);
}

#[test]
fn ring_overflow_accounts_for_every_tick() {
    // A capacity-1 ring makes overflow likely (the background collector may
    // or may not have drained between ticks), but every tick must land in
    // either the collected or dropped bucket, never both or neither.
    let options = ConfigOptions { ring_capacity: 1, test_no_install_timer: true, ..ConfigOptions::default() };
    let session = session_with(options, vec![("f", "a.rb", 1)]);
    session.start().unwrap();
    for _ in 0..5 {
        session.fire_for_test();
    }
    let profile = session.stop().unwrap();

    assert_eq!(profile.collected_sample_count + profile.dropped_sample_count, 5);
}

#[test]
fn max_managed_depth_truncates_deep_stacks() {
    let options = ConfigOptions { max_managed_depth: 1, test_no_install_timer: true, ..ConfigOptions::default() };
    let stack: Vec<(&str, &str, i32)> = (0..10).map(|i| ("f", "a.rb", i)).collect();
    let session = session_with(options, stack);
    session.start().unwrap();
    session.fire_for_test();
    let profile = session.stop().unwrap();

    assert_eq!(profile.samples[0].stack.len(), 1);
}

#[test]
fn configuration_reflects_normalized_options() {
    let options = ConfigOptions { interval_ms: 20, test_no_install_timer: true, ..ConfigOptions::default() };
    let session = session_with(options, vec![]);
    let effective = session.configuration();
    assert_eq!(effective.interval_ms, 20);
    assert!(effective.test_no_install_timer);
}

#[test]
fn profile_round_trips_through_json() {
    let session = session_with(ConfigOptions::default(), vec![("f", "a.rb", 1)]);
    session.start().unwrap();
    session.fire_for_test();
    let profile = session.stop().unwrap();

    let json = serde_json::to_string(&profile).unwrap();
    let decoded: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded["collected_sample_count"], 1);
}
