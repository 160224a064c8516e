// Traffic sample domain model
use std::collections::BTreeMap;

/// One delivery from the ingest stream: bytes moved since the previous sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub up: u64,
    pub down: u64,
}

impl Sample {
    pub fn new(timestamp_ms: i64, up: u64, down: u64) -> Self {
        Self {
            timestamp_ms,
            up,
            down,
        }
    }
}

/// Round a timestamp down to a multiple of `resolution_ms`. A resolution of 0 keeps it as is.
pub fn quantize_timestamp(timestamp_ms: i64, resolution_ms: i64) -> i64 {
    if resolution_ms <= 0 {
        return timestamp_ms;
    }
    timestamp_ms.saturating_sub(timestamp_ms.rem_euclid(resolution_ms))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    KeepAll,
    /// Drop samples older than `max_age_ms` relative to the wall clock.
    MaxAge { max_age_ms: i64 },
}

/// Expired samples are pruned in batches once they lag this fraction of the
/// retention age behind the cutoff, so appends stay amortized O(1).
const PRUNE_SLACK_DIVISOR: i64 = 64;

/// Append-only log of samples in arrival order. Timestamps come from the
/// client and are never trusted for expiry; only the caller's clock is.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<Sample>,
    retention: RetentionPolicy,
    oldest_ms: Option<i64>,
}

impl SampleBuffer {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            samples: Vec::new(),
            retention,
            oldest_ms: None,
        }
    }

    pub fn append(&mut self, sample: Sample) {
        self.oldest_ms = Some(
            self.oldest_ms
                .map_or(sample.timestamp_ms, |o| o.min(sample.timestamp_ms)),
        );
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.oldest_ms = None;
    }

    /// Drops samples older than the retention age before `now_ms`. Samples
    /// dated after `now_ms` are kept; binning leaves them out per window.
    pub fn expire(&mut self, now_ms: i64) {
        let RetentionPolicy::MaxAge { max_age_ms } = self.retention else {
            return;
        };
        let Some(oldest) = self.oldest_ms else {
            return;
        };

        let cutoff = now_ms.saturating_sub(max_age_ms);
        let slack = (max_age_ms / PRUNE_SLACK_DIVISOR).max(1);
        if oldest > cutoff.saturating_sub(slack) {
            return;
        }

        let before = self.samples.len();
        self.samples.retain(|s| s.timestamp_ms > cutoff);
        self.oldest_ms = self.samples.iter().map(|s| s.timestamp_ms).min();
        tracing::debug!(
            "Pruned {} samples older than {}",
            before - self.samples.len(),
            cutoff
        );
    }
}

/// Per-timestamp byte totals, used by the exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficBytes {
    pub up: u64,
    pub down: u64,
}

pub fn aggregate_by_timestamp(samples: &[Sample]) -> BTreeMap<i64, TrafficBytes> {
    let mut aggregated: BTreeMap<i64, TrafficBytes> = BTreeMap::new();
    for s in samples {
        let entry = aggregated.entry(s.timestamp_ms).or_default();
        entry.up = entry.up.saturating_add(s.up);
        entry.down = entry.down.saturating_add(s.down);
    }
    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_timestamp() {
        assert_eq!(quantize_timestamp(1_234, 100), 1_200);
        assert_eq!(quantize_timestamp(1_200, 100), 1_200);
        assert_eq!(quantize_timestamp(-50, 100), -100);
        assert_eq!(quantize_timestamp(1_234, 0), 1_234);
        assert_eq!(quantize_timestamp(i64::MIN, 100), i64::MIN);
    }

    #[test]
    fn test_append_keeps_arrival_order() {
        let mut buffer = SampleBuffer::new(RetentionPolicy::KeepAll);
        buffer.append(Sample::new(300, 1, 1));
        buffer.append(Sample::new(100, 2, 2));
        buffer.append(Sample::new(200, 3, 3));

        let order: Vec<i64> = buffer.samples().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(order, vec![300, 100, 200]);
    }

    #[test]
    fn test_keep_all_never_prunes() {
        let mut buffer = SampleBuffer::new(RetentionPolicy::KeepAll);
        buffer.append(Sample::new(0, 1, 1));
        buffer.append(Sample::new(1_000_000_000, 1, 1));
        buffer.expire(i64::MAX);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_max_age_prunes_expired_samples() {
        let mut buffer = SampleBuffer::new(RetentionPolicy::MaxAge { max_age_ms: 6_400 });
        buffer.append(Sample::new(0, 1, 1));
        buffer.append(Sample::new(5_000, 1, 1));
        buffer.expire(5_000);
        assert_eq!(buffer.len(), 2);

        // Cutoff is 20_000 - 6_400; both older samples are well past the slack.
        buffer.append(Sample::new(20_000, 1, 1));
        buffer.expire(20_000);
        let remaining: Vec<i64> = buffer.samples().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(remaining, vec![20_000]);
    }

    #[test]
    fn test_max_age_waits_for_slack() {
        let mut buffer = SampleBuffer::new(RetentionPolicy::MaxAge { max_age_ms: 6_400 });
        buffer.append(Sample::new(0, 1, 1));
        // Sample at 0 is 50ms past the cutoff, under the 100ms slack.
        buffer.expire(6_450);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_future_sample_does_not_expire_history() {
        const NOW: i64 = 1_700_000_000_000;
        let mut buffer = SampleBuffer::new(RetentionPolicy::MaxAge {
            max_age_ms: 86_400_000,
        });
        buffer.append(Sample::new(NOW - 1_000, 10, 10));
        buffer.append(Sample::new(NOW - 30_000, 5, 5));
        buffer.append(Sample::new(NOW + 2 * 86_400_000, 1, 1));
        buffer.expire(NOW);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_expire_handles_extreme_timestamps() {
        let mut buffer = SampleBuffer::new(RetentionPolicy::MaxAge {
            max_age_ms: 86_400_000,
        });
        buffer.append(Sample::new(i64::MIN + 100, 1, 1));
        buffer.append(Sample::new(i64::MAX, 2, 2));
        buffer.expire(i64::MIN + 50);
        assert_eq!(buffer.len(), 2);

        buffer.expire(1_700_000_000_000);
        assert_eq!(buffer.samples(), &[Sample::new(i64::MAX, 2, 2)]);
    }

    #[test]
    fn test_aggregate_by_timestamp() {
        let samples = vec![
            Sample::new(200, 1, 2),
            Sample::new(100, 10, 20),
            Sample::new(200, 3, 4),
        ];
        let aggregated = aggregate_by_timestamp(&samples);

        let rows: Vec<(i64, TrafficBytes)> = aggregated.into_iter().collect();
        assert_eq!(
            rows,
            vec![
                (100, TrafficBytes { up: 10, down: 20 }),
                (200, TrafficBytes { up: 4, down: 6 }),
            ]
        );
    }
}
