// Binner - rebuilds every window's series from the full sample log
use crate::domain::frame::{RenderFrame, StreamStatus, WindowFrame};
use crate::domain::sample::Sample;
use crate::domain::series::{Direction, Series};
use crate::domain::window::{TimeWindow, WindowChain};

/// Up and down series of one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSeries {
    pub up: Series,
    pub down: Series,
}

/// Index of the bucket a sample at `timestamp_ms` falls into, counting back
/// from `end_ms`. `None` when the sample is newer than the end or older than
/// the window's span.
pub fn bucket_index(
    end_ms: i64,
    timestamp_ms: i64,
    bucket_width_ms: i64,
    bucket_count: usize,
) -> Option<usize> {
    if bucket_width_ms <= 0 {
        return None;
    }
    let index = end_ms.checked_sub(timestamp_ms)?.div_euclid(bucket_width_ms);
    if index < 0 {
        return None;
    }
    usize::try_from(index).ok().filter(|&i| i < bucket_count)
}

pub fn bin_window(window: &TimeWindow, end_ms: i64, samples: &[Sample]) -> WindowSeries {
    let mut up = Series::empty(Direction::Up, window.bucket_count, window.bucket_width_ms);
    let mut down = Series::empty(Direction::Down, window.bucket_count, window.bucket_width_ms);

    for s in samples {
        if let Some(index) = bucket_index(
            end_ms,
            s.timestamp_ms,
            window.bucket_width_ms,
            window.bucket_count,
        ) {
            up.add(index, s.up);
            down.add(index, s.down);
        }
    }

    WindowSeries { up, down }
}

/// One full redraw: resolve the three end instants, then bin all samples into each window.
pub fn build_frame(
    chain: &WindowChain,
    samples: &[Sample],
    now_ms: i64,
    status: StreamStatus,
) -> RenderFrame {
    let windows = chain
        .windows()
        .map(|window| {
            let end_ms = chain.effective_end(window.id, now_ms);
            let WindowSeries { up, down } = bin_window(window, end_ms, samples);
            WindowFrame {
                window: window.id,
                label: window.label().to_string(),
                end_ms,
                span_ms: window.span_ms,
                bucket_width_ms: window.bucket_width_ms,
                focus_ms: window.focus_ms,
                up: up.into(),
                down: down.into(),
            }
        })
        .collect();

    RenderFrame {
        now_ms,
        status,
        windows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::window::{WindowId, WindowSpans};

    const NOW: i64 = 1_700_000_000_000;

    fn chain() -> WindowChain {
        WindowChain::new(600, WindowSpans::default()).unwrap()
    }

    fn sample_set() -> Vec<Sample> {
        vec![
            Sample::new(NOW, 10, 20),
            Sample::new(NOW - 250, 1, 2),
            Sample::new(NOW - 5_000, 100, 200),
            Sample::new(NOW - 59_999, 7, 7),
            Sample::new(NOW - 61_000, 3, 4),
            Sample::new(NOW - 3_000_000, 40, 50),
            Sample::new(NOW + 500, 9, 9),
        ]
    }

    #[test]
    fn test_bucket_index_edges() {
        assert_eq!(bucket_index(1_000, 1_000, 100, 600), Some(0));
        assert_eq!(bucket_index(1_000, 901, 100, 600), Some(0));
        assert_eq!(bucket_index(1_000, 900, 100, 600), Some(1));
        // Newer than the end floors to -1.
        assert_eq!(bucket_index(1_000, 1_001, 100, 600), None);
        assert_eq!(bucket_index(60_000, 1, 100, 600), Some(599));
        assert_eq!(bucket_index(60_000, 0, 100, 600), None);
    }

    #[test]
    fn test_bucket_index_with_extreme_timestamps() {
        assert_eq!(bucket_index(NOW, i64::MIN + 100, 100, 600), None);
        assert_eq!(bucket_index(NOW, i64::MAX, 100, 600), None);
        assert_eq!(bucket_index(i64::MIN, i64::MAX, 100, 600), None);

        let chain = chain();
        let samples = vec![Sample::new(i64::MIN + 100, 1, 1), Sample::new(NOW, 4, 4)];
        let frame = build_frame(&chain, &samples, NOW, StreamStatus::Open);
        for window in &frame.windows {
            assert_eq!(window.up.stats.sum, 4);
        }
    }

    #[test]
    fn test_minute_scenario() {
        let chain = chain();
        let minute = chain.window(WindowId::Minute);
        let t0 = chain.effective_end(WindowId::Minute, NOW);
        let samples = vec![
            Sample::new(t0, 10, 20),
            Sample::new(t0, 5, 5),
            Sample::new(t0 - 5_000, 100, 200),
        ];

        let series = bin_window(minute, t0, &samples);
        assert_eq!(series.up.buckets[0], 15);
        assert_eq!(series.down.buckets[0], 25);
        assert_eq!(series.up.buckets[50], 100);
        assert_eq!(series.down.buckets[50], 200);
        let others: u64 = series
            .up
            .buckets
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 0 && *i != 50)
            .map(|(_, v)| v)
            .sum();
        assert_eq!(others, 0);

        let stats = series.up.stats();
        assert_eq!(stats.sum, 115);
        assert_eq!(stats.max, 100);
    }

    #[test]
    fn test_binning_is_order_independent() {
        let chain = chain();
        let samples = sample_set();
        let mut reversed = samples.clone();
        reversed.reverse();
        let mut rotated = samples.clone();
        rotated.rotate_left(3);

        for window in chain.windows() {
            let expected = bin_window(window, NOW, &samples);
            assert_eq!(bin_window(window, NOW, &reversed), expected);
            assert_eq!(bin_window(window, NOW, &rotated), expected);
        }
    }

    #[test]
    fn test_sums_are_conserved_inside_the_window() {
        let chain = chain();
        let hour = chain.window(WindowId::Hour);
        let samples: Vec<Sample> = (0..500)
            .map(|i| Sample::new(NOW - i * 7_001, i as u64, 2 * i as u64))
            .collect();

        let series = bin_window(hour, NOW, &samples);
        let expected_up: u64 = samples.iter().map(|s| s.up).sum();
        let expected_down: u64 = samples.iter().map(|s| s.down).sum();
        assert_eq!(series.up.stats().sum, expected_up);
        assert_eq!(series.down.stats().sum, expected_down);
    }

    #[test]
    fn test_out_of_window_samples_are_dropped_per_window() {
        let chain = chain();
        let samples = sample_set();

        let minute = bin_window(chain.window(WindowId::Minute), NOW, &samples);
        // Future and older-than-a-minute samples are left out.
        assert_eq!(minute.up.stats().sum, 10 + 1 + 100 + 7);

        let hour = bin_window(chain.window(WindowId::Hour), NOW, &samples);
        assert_eq!(hour.up.stats().sum, 10 + 1 + 100 + 7 + 3 + 40);

        let day = bin_window(chain.window(WindowId::Day), NOW, &samples);
        assert_eq!(day.up.stats().sum, hour.up.stats().sum);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let chain = chain();
        let samples = sample_set();
        let first = build_frame(&chain, &samples, NOW, StreamStatus::Open);
        let second = build_frame(&chain, &samples, NOW, StreamStatus::Open);

        for (a, b) in first.windows.iter().zip(second.windows.iter()) {
            assert_eq!(a.up.buckets, b.up.buckets);
            assert_eq!(a.down.buckets, b.down.buckets);
            assert_eq!(a.end_ms, b.end_ms);
        }
    }

    #[test]
    fn test_frame_follows_focus() {
        let mut chain = chain();
        let samples = sample_set();
        let focus = chain
            .set_focus(WindowId::Hour, 590, NOW)
            .unwrap()
            .unwrap();

        let frame = build_frame(&chain, &samples, NOW, StreamStatus::Closed { code: 1000 });
        let minute = frame.window(WindowId::Minute).unwrap();
        assert_eq!(minute.end_ms, focus);
        assert_eq!(minute.focus_ms, None);
        assert_eq!(frame.window(WindowId::Hour).unwrap().focus_ms, Some(focus));
        assert_eq!(minute.bucket_width_ms, 100);
        assert_eq!(frame.window(WindowId::Hour).unwrap().end_ms, NOW);
        assert!(frame.status.is_closed());

        // Focus is 30s back: only samples between 90s and 30s old remain.
        assert_eq!(minute.up.stats.sum, 7 + 3);
    }
}
