use std::time::Instant;

use stripchart_rs::StripChartError;
use stripchart_rs::api::{ChannelKindTag, ChannelOptions, StreamConfig, StreamId, Window, WindowConfig};

fn window_with_line() -> (Window, StreamId) {
    let mut window = Window::new(WindowConfig::default()).expect("window init");
    let stream = window.create_stream(StreamConfig::new().with_title("cascade"));
    window
        .create_channel(stream, "sig", ChannelKindTag::Line, ChannelOptions::new())
        .expect("line channel");
    (window, stream)
}

fn flags(window: &Window, stream: StreamId) -> (bool, bool, bool) {
    let s = window.stream(stream).expect("stream exists");
    let channel = s.channel("sig").expect("channel exists");
    (channel.is_dirty(), s.is_dirty(), window.is_dirty())
}

#[test]
fn new_entities_start_dirty_and_first_pass_cleans_them() {
    let (mut window, stream) = window_with_line();
    assert_eq!(flags(&window, stream), (true, true, true));

    assert!(window.prepare_artists());
    assert_eq!(flags(&window, stream), (false, false, false));
}

#[test]
fn append_marks_channel_stream_and_window_dirty_until_one_pass() {
    let (mut window, stream) = window_with_line();
    window.prepare_artists();

    window
        .append_sample(stream, "sig", 100, Some("1.5"))
        .expect("numeric sample");
    assert_eq!(flags(&window, stream), (true, true, true));

    assert!(window.prepare_artists());
    assert_eq!(flags(&window, stream), (false, false, false));

    assert!(!window.prepare_artists());
    assert_eq!(flags(&window, stream), (false, false, false));
}

#[test]
fn derived_state_recomputes_once_per_changed_pass() {
    let (mut window, stream) = window_with_line();
    window
        .create_channel(stream, "other", ChannelKindTag::Line, ChannelOptions::new())
        .expect("second line");
    window.prepare_artists();
    let before = window.stream(stream).expect("stream").derived_generation();

    for time in 0..5 {
        window
            .append_sample(stream, "sig", time, Some("1"))
            .expect("numeric");
        window
            .append_sample(stream, "other", time, Some("2"))
            .expect("numeric");
    }
    window.prepare_artists();
    window.prepare_artists();

    let after = window.stream(stream).expect("stream").derived_generation();
    assert_eq!(after, before + 1);
}

#[test]
fn clean_streams_are_not_revisited() {
    let mut window = Window::new(WindowConfig::default()).expect("window init");
    let busy = window.create_stream(StreamConfig::new());
    let idle = window.create_stream(StreamConfig::new());
    for id in [busy, idle] {
        window
            .create_channel(id, "sig", ChannelKindTag::Line, ChannelOptions::new())
            .expect("line channel");
    }
    window.prepare_artists();
    let idle_generation = window.stream(idle).expect("idle").derived_generation();

    window
        .append_sample(busy, "sig", 10, Some("3"))
        .expect("numeric");
    assert!(!window.stream(idle).expect("idle").is_dirty());
    assert!(window.prepare_artists());

    assert_eq!(
        window.stream(idle).expect("idle").derived_generation(),
        idle_generation
    );
}

#[test]
fn repeat_channel_follows_stream_last_timestamp_without_storing() {
    let mut window = Window::new(WindowConfig::default()).expect("window init");
    let stream = window.create_stream(StreamConfig::new());
    let repeat: ChannelOptions = [("repeat".to_owned(), "1".to_owned())].into_iter().collect();
    window
        .create_channel(stream, "held", ChannelKindTag::Line, repeat)
        .expect("repeat line");
    window
        .create_channel(stream, "clock", ChannelKindTag::Line, ChannelOptions::new())
        .expect("clock line");

    window
        .append_sample(stream, "held", 100, Some("4"))
        .expect("numeric");
    window
        .append_sample(stream, "clock", 500, Some("0"))
        .expect("numeric");
    window.prepare_artists_at(Instant::now());

    let held = window
        .stream(stream)
        .and_then(|s| s.channel("held"))
        .expect("held channel");
    assert_eq!(held.times(), &[100]);
    let prepared: Vec<i64> = held.prepared_points().iter().map(|p| p.time).collect();
    assert_eq!(prepared, vec![100, 500]);
    assert_eq!(window.stream(stream).expect("stream").last_timestamp(), Some(500));
}

#[test]
fn last_timestamp_is_the_max_across_channels() {
    let (mut window, stream) = window_with_line();
    for name in ["early", "late"] {
        window
            .create_channel(stream, name, ChannelKindTag::Line, ChannelOptions::new())
            .expect("line channel");
    }
    for (channel, time) in [("sig", 300), ("early", 100), ("late", 200)] {
        window
            .append_sample(stream, channel, time, Some("1"))
            .expect("numeric");
        assert_eq!(window.stream(stream).expect("stream").last_timestamp(), Some(300));
    }
}

#[test]
fn older_sample_on_a_channel_is_rejected() {
    let (mut window, stream) = window_with_line();
    window
        .append_sample(stream, "sig", 300, Some("1"))
        .expect("numeric");
    window.prepare_artists();

    let err = window
        .append_sample(stream, "sig", 100, Some("2"))
        .expect_err("older than the last sample");
    assert!(matches!(
        err,
        StripChartError::OutOfOrderSample { time: 100, last: 300, .. }
    ));

    let s = window.stream(stream).expect("stream");
    let channel = s.channel("sig").expect("channel");
    assert_eq!(channel.times(), &[300]);
    assert!(!channel.is_dirty());
    assert!(!s.is_dirty());
    assert!(!window.is_dirty());
    assert_eq!(s.last_timestamp(), Some(300));
}

#[test]
fn destroyed_stream_is_gone_and_rejects_samples() {
    let (mut window, stream) = window_with_line();
    window.prepare_artists();

    window.destroy_stream(stream).expect("stream exists");
    assert!(window.stream(stream).is_none());
    assert!(window.is_dirty());
    assert!(
        window
            .append_sample(stream, "sig", 1, Some("1"))
            .is_err()
    );
    window.destroy();
}
