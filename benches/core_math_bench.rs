use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use stripchart_rs::api::{ChannelKindTag, ChannelOptions, StreamConfig, Window, WindowConfig};
use stripchart_rs::core::{ReferenceZone, TickLabeler, TimeLocator};

fn bench_tick_values_across_bands(c: &mut Criterion) {
    let spans: Vec<i64> = (0..40).map(|exp| 1_i64 << exp).collect();

    c.bench_function("tick_values_across_bands", |b| {
        b.iter(|| {
            let mut locator = TimeLocator::new(ReferenceZone::default());
            for span in &spans {
                let _ = locator
                    .tick_values(black_box(1_700_000_000_000_000), 1_700_000_000_000_000 + span)
                    .expect("span fits the step table");
            }
        })
    });
}

fn bench_labeled_ticks_narrow_axis(c: &mut Criterion) {
    let labeler = TickLabeler::new(500.0);

    c.bench_function("labeled_ticks_narrow_axis", |b| {
        b.iter(|| {
            let mut locator = TimeLocator::new(ReferenceZone::default());
            let _ = labeler
                .ticks(
                    &mut locator,
                    black_box(1_700_000_000_000_000),
                    black_box(1_700_003_600_000_000),
                    black_box(420.0),
                )
                .expect("hour view fits the step table");
        })
    });
}

fn bench_append_and_prepare_10k(c: &mut Criterion) {
    c.bench_function("append_and_prepare_10k", |b| {
        b.iter(|| {
            let mut window = Window::new(WindowConfig::default()).expect("window init");
            let stream = window.create_stream(StreamConfig::new().with_time_window_secs(60.0));
            window
                .create_channel(stream, "sig", ChannelKindTag::Line, ChannelOptions::new())
                .expect("line channel");

            for i in 0..10_000_i64 {
                let raw = if (i / 100) % 2 == 0 { "1.5" } else { "-2" };
                window
                    .append_sample(stream, "sig", i * 1_000, Some(raw))
                    .expect("numeric sample");
            }
            black_box(window.prepare_artists());
        })
    });
}

criterion_group!(
    benches,
    bench_tick_values_across_bands,
    bench_labeled_ticks_narrow_axis,
    bench_append_and_prepare_10k
);
criterion_main!(benches);
