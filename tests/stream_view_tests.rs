use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use stripchart_rs::StripChartError;
use stripchart_rs::api::{
    ChannelKindTag, ChannelOptions, IdGenerator, Stream, StreamConfig, StreamId, Window,
    WindowConfig, ZoomDirection,
};
use stripchart_rs::core::{Rect, SampleValue};

fn options(pairs: &[(&str, &str)]) -> ChannelOptions {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

fn stream_with(config: StreamConfig) -> (Stream, IdGenerator) {
    let mut ids = IdGenerator::new();
    let id = ids.next_stream_id();
    let stream = Stream::new(id, &mut ids, &config, &WindowConfig::default());
    (stream, ids)
}

fn feed(stream: &mut Stream, channel: &str, samples: &[(i64, f64)]) {
    for (time, value) in samples {
        stream
            .append_value(channel, *time, SampleValue::Number(*value))
            .expect("numeric sample");
    }
}

#[test]
fn default_view_covers_all_data() {
    let (mut stream, mut ids) = stream_with(StreamConfig::new());
    stream
        .create_channel(&mut ids, "sig", ChannelKindTag::Line, ChannelOptions::new())
        .expect("line channel");
    feed(&mut stream, "sig", &[(0, 1.0), (1_000_000, 3.0)]);
    assert!(stream.prepare_artists());

    assert_eq!(stream.time_view(), Some((0.0, 1_000_000.0)));
    assert_eq!(stream.axes()[0].value_view, Some((1.0, 3.0)));
}

#[test]
fn time_window_trails_latest_sample_with_margins() {
    let (mut stream, mut ids) = stream_with(StreamConfig::new().with_time_window_secs(10.0));
    stream
        .create_channel(&mut ids, "sig", ChannelKindTag::Line, ChannelOptions::new())
        .expect("line channel");
    feed(&mut stream, "sig", &[(0, 0.0), (20_000_000, 10.0)]);
    stream.prepare_artists();

    let (view_min, view_max) = stream.time_view().expect("time view");
    assert_relative_eq!(view_min, 10_100_000.0, epsilon = 1e-9);
    assert_relative_eq!(view_max, 20_100_000.0, epsilon = 1e-9);

    let (low, high) = stream.axes()[0].value_view.expect("value view");
    assert_relative_eq!(low, -0.3, epsilon = 1e-12);
    assert_relative_eq!(high, 10.3, epsilon = 1e-12);
}

#[test]
fn named_axes_stack_by_weight_with_first_on_top() {
    let (mut stream, mut ids) = stream_with(StreamConfig::new());
    stream
        .create_channel(&mut ids, "main", ChannelKindTag::Line, ChannelOptions::new())
        .expect("primary axis");
    stream
        .create_channel(
            &mut ids,
            "state",
            ChannelKindTag::Line,
            options(&[("axis", "flags"), ("axis_weight", "0.8"), ("format", "%.1f")]),
        )
        .expect("new axis");
    stream
        .create_channel(
            &mut ids,
            "state2",
            ChannelKindTag::Line,
            options(&[("axis", "flags"), ("axis_weight", "5")]),
        )
        .expect("existing axis");

    assert_eq!(stream.axes().len(), 2);
    let flags = &stream.axes()[1];
    assert_eq!(stream.channel("state").expect("state").axis(), flags.id);
    assert_eq!(stream.channel("state2").expect("state2").axis(), flags.id);
    assert_relative_eq!(flags.weight, 0.8, epsilon = 1e-9);
    assert_eq!(flags.format_value(2.26), "2.3");

    assert!(stream.set_position(Rect::unit(), 1_000.0));
    assert!(!stream.set_position(Rect::unit(), 1_000.0));
    stream.prepare_artists();

    let primary = stream.axes()[0].rect;
    let secondary = stream.axes()[1].rect;
    assert_relative_eq!(secondary.y, 0.05 + 0.4 * 0.005, epsilon = 1e-12);
    assert_relative_eq!(secondary.height, 0.4 * 0.99, epsilon = 1e-12);
    assert_relative_eq!(primary.y, 0.45 + 0.5 * 0.005, epsilon = 1e-12);
    assert_relative_eq!(primary.height, 0.5 * 0.99, epsilon = 1e-12);
    assert_relative_eq!(stream.axis_width_px(), 900.0, epsilon = 1e-12);
}

#[test]
fn unknown_axis_without_weight_is_rejected() {
    let (mut stream, mut ids) = stream_with(StreamConfig::new());
    let err = stream
        .create_channel(
            &mut ids,
            "sig",
            ChannelKindTag::Line,
            options(&[("axis", "missing")]),
        )
        .expect_err("axis needs a weight");
    assert!(matches!(err, StripChartError::InvalidChannelOption { key, .. } if key == "axis"));
    assert_eq!(stream.channel_count(), 0);
}

#[test]
fn redeclaring_a_channel_replaces_it() {
    let (mut stream, mut ids) = stream_with(StreamConfig::new());
    stream
        .create_channel(&mut ids, "sig", ChannelKindTag::Line, ChannelOptions::new())
        .expect("line");
    feed(&mut stream, "sig", &[(1, 1.0)]);
    stream
        .create_channel(&mut ids, "sig", ChannelKindTag::Scatter, ChannelOptions::new())
        .expect("scatter");

    let channel = stream.channel("sig").expect("channel");
    assert_eq!(channel.kind_tag(), ChannelKindTag::Scatter);
    assert!(channel.is_empty());
    assert_eq!(stream.channel_count(), 1);
}

#[test]
fn replacing_a_channel_drops_its_unused_axis() {
    let (mut stream, mut ids) = stream_with(StreamConfig::new());
    stream
        .create_channel(
            &mut ids,
            "sig",
            ChannelKindTag::Line,
            options(&[("axis", "top"), ("axis_weight", "0.5")]),
        )
        .expect("line on its own axis");
    stream
        .create_channel(
            &mut ids,
            "aux",
            ChannelKindTag::Line,
            options(&[("axis", "side"), ("axis_weight", "0.25")]),
        )
        .expect("line on a second axis");
    stream
        .create_channel(&mut ids, "twin", ChannelKindTag::Line, options(&[("axis", "side")]))
        .expect("line sharing the second axis");
    assert_eq!(stream.axes().len(), 3);

    stream
        .create_channel(&mut ids, "sig", ChannelKindTag::Line, ChannelOptions::new())
        .expect("line on the default axis");
    let names: Vec<Option<&str>> = stream.axes().iter().map(|axis| axis.name.as_deref()).collect();
    assert_eq!(names, vec![None, Some("side")]);

    stream
        .create_channel(&mut ids, "aux", ChannelKindTag::Line, ChannelOptions::new())
        .expect("aux moves to the default axis");
    assert_eq!(stream.axes().len(), 2, "twin still uses the side axis");

    stream.prepare_artists();
    let total: f64 = stream.axes().iter().map(|axis| axis.rect.height).sum();
    let side = stream.axes()[1].rect.height;
    assert_relative_eq!(side / total, 0.25 / 1.25, epsilon = 1e-9);
}

#[test]
fn zoom_hold_overflowing_the_clock_is_an_error() {
    let mut ids = IdGenerator::new();
    let id = ids.next_stream_id();
    let window = WindowConfig::default().with_zoom_hold_secs(u64::MAX);
    let mut stream = Stream::new(id, &mut ids, &StreamConfig::new(), &window);
    stream
        .create_channel(&mut ids, "sig", ChannelKindTag::Line, ChannelOptions::new())
        .expect("line");
    feed(&mut stream, "sig", &[(0, 0.0), (1_000, 1.0)]);
    stream.prepare_artists();

    let err = stream
        .zoom_at(500.0, ZoomDirection::In, Instant::now())
        .expect_err("hold cannot be represented");
    assert!(matches!(err, StripChartError::InvalidData(_)));
    assert!(!stream.is_zoomed());
    assert_eq!(stream.time_view(), Some((0.0, 1_000.0)));
}

#[test]
fn wheel_zoom_is_anchored_and_held_against_autoscale() {
    let (mut stream, mut ids) = stream_with(StreamConfig::new().with_title("bench"));
    stream
        .create_channel(&mut ids, "sig", ChannelKindTag::Line, ChannelOptions::new())
        .expect("line");
    feed(&mut stream, "sig", &[(0, 0.0), (1_000, 1.0)]);
    let start = Instant::now();
    stream.prepare_artists_at(start);

    stream
        .zoom_at(500.0, ZoomDirection::In, start)
        .expect("view exists");
    let (low, high) = stream.time_view().expect("view");
    assert_relative_eq!(low, 100.0, epsilon = 1e-9);
    assert_relative_eq!(high, 900.0, epsilon = 1e-9);
    assert_eq!(stream.title(), "bench Zoomed");

    stream
        .zoom_at(100.0, ZoomDirection::Out, start)
        .expect("view exists");
    let (low, high) = stream.time_view().expect("view");
    assert_relative_eq!(low, 100.0, epsilon = 1e-9);
    assert_relative_eq!(high, 900.0 + 800.0 * 0.2 / 1.2, epsilon = 1e-9);

    feed(&mut stream, "sig", &[(2_000, 2.0)]);
    stream.prepare_artists_at(start + Duration::from_secs(1));
    assert!(stream.is_zoomed());
    assert_relative_eq!(stream.time_view().expect("view").0, 100.0, epsilon = 1e-9);

    assert!(stream.prepare_artists_at(start + Duration::from_secs(30)));
    assert!(!stream.is_zoomed());
    assert_eq!(stream.title(), "bench");
    assert_eq!(stream.time_view(), Some((0.0, 2_000.0)));
}

#[test]
fn window_reset_view_drops_zoom_immediately() {
    let mut window = Window::new(WindowConfig::default()).expect("window init");
    let stream: StreamId = window.create_stream(StreamConfig::new());
    window
        .create_channel(stream, "sig", ChannelKindTag::Line, ChannelOptions::new())
        .expect("line");
    for (time, raw) in [(0, "1"), (100, "2")] {
        window
            .append_sample(stream, "sig", time, Some(raw))
            .expect("numeric");
    }
    window.prepare_artists();

    window
        .zoom_at(stream, 50.0, ZoomDirection::In)
        .expect("zoomable");
    assert!(window.stream(stream).expect("stream").is_zoomed());

    window.reset_view(stream).expect("stream exists");
    let s = window.stream(stream).expect("stream");
    assert!(!s.is_zoomed());
    assert_eq!(s.time_view(), Some((0.0, 100.0)));
}

#[test]
fn zoom_without_view_is_an_error() {
    let (mut stream, _) = stream_with(StreamConfig::new());
    assert!(
        stream
            .zoom_at(0.0, ZoomDirection::In, Instant::now())
            .is_err()
    );
}

#[test]
fn time_ticks_follow_the_current_view() {
    let mut window = Window::new(WindowConfig::default().with_zone_offset_seconds(0))
        .expect("window init");
    let stream = window.create_stream(StreamConfig::new());
    window.resize(1_000.0, 500.0);
    window
        .create_channel(stream, "sig", ChannelKindTag::Line, ChannelOptions::new())
        .expect("line");
    for (time, raw) in [(1_000_000, "1"), (11_000_000, "2")] {
        window
            .append_sample(stream, "sig", time, Some(raw))
            .expect("numeric");
    }
    window.prepare_artists();

    let s = window.stream_mut(stream).expect("stream");
    let ticks = s.time_ticks().expect("ten second view");
    assert_eq!(ticks.len(), 10);
    assert_eq!(ticks[0].label, "00:00:01s");
    assert_eq!(ticks[9].label, "00:00:10s");
    assert_eq!(s.cursor_label(1_500_000), "DATE: 1970/01/01 00:00:01.500000");
}

#[test]
fn text_channels_follow_the_pointer() {
    let (mut stream, mut ids) = stream_with(StreamConfig::new());
    stream
        .create_channel(
            &mut ids,
            "log",
            ChannelKindTag::Text,
            options(&[("size", "9"), ("weight", "bold")]),
        )
        .expect("text options are lenient");
    stream.append_sample("log", 10, Some("boot")).expect("text");
    stream.append_sample("log", 20, Some("ready")).expect("text");
    stream.prepare_artists();

    assert!(stream.hover(15));
    assert_eq!(stream.channel("log").and_then(|c| c.shown_text()), Some("boot"));
    assert!(stream.hover_leave());
    assert_eq!(stream.channel("log").and_then(|c| c.shown_text()), Some("ready"));
    assert!(stream.channel("log").expect("log").data_limits().is_none());
}
