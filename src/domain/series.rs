// Bucketed byte series and their summary statistics
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// One direction's byte totals for a window, one bucket per pixel column.
/// Bucket 0 is the newest slice (ending at the window's end).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub direction: Direction,
    pub buckets: Vec<u64>,
    pub bucket_width_ms: i64,
}

impl Series {
    pub fn empty(direction: Direction, bucket_count: usize, bucket_width_ms: i64) -> Self {
        Self {
            direction,
            buckets: vec![0; bucket_count],
            bucket_width_ms,
        }
    }

    pub fn add(&mut self, index: usize, bytes: u64) {
        if let Some(bucket) = self.buckets.get_mut(index) {
            *bucket = bucket.saturating_add(bytes);
        }
    }

    pub fn stats(&self) -> SeriesStats {
        SeriesStats::from_buckets(&self.buckets, self.bucket_width_ms)
    }

    /// Height of every bar relative to the tallest one, in `[0, 1]`.
    /// All zero when the series is empty.
    pub fn bar_fractions(&self) -> Vec<f64> {
        let max = self.buckets.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return vec![0.0; self.buckets.len()];
        }
        let max = max as f64;
        self.buckets.iter().map(|&v| v as f64 / max).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub max: u64,
    pub sum: u64,
    pub avg: f64,
    /// Bytes per second of the busiest bucket.
    pub max_rate: f64,
    /// Bytes per second averaged over the whole window.
    pub avg_rate: f64,
}

impl SeriesStats {
    pub fn from_buckets(buckets: &[u64], bucket_width_ms: i64) -> Self {
        let max = buckets.iter().copied().max().unwrap_or(0);
        let sum = buckets.iter().fold(0u64, |acc, &v| acc.saturating_add(v));
        let avg = if buckets.is_empty() {
            0.0
        } else {
            sum as f64 / buckets.len() as f64
        };

        Self {
            max,
            sum,
            avg,
            max_rate: bytes_per_second(max as f64, bucket_width_ms),
            avg_rate: bytes_per_second(avg, bucket_width_ms),
        }
    }
}

pub fn bytes_per_second(bytes_per_bucket: f64, bucket_width_ms: i64) -> f64 {
    if bucket_width_ms <= 0 {
        return 0.0;
    }
    bytes_per_bucket / bucket_width_ms as f64 * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_of_empty_series() {
        let series = Series::empty(Direction::Up, 600, 100);
        let stats = series.stats();
        assert_eq!(stats.max, 0);
        assert_eq!(stats.sum, 0);
        assert_eq!(stats.avg, 0.0);
        assert_eq!(stats.max_rate, 0.0);
    }

    #[test]
    fn test_avg_counts_empty_buckets() {
        let mut series = Series::empty(Direction::Down, 4, 1_000);
        series.add(0, 8);
        series.add(2, 4);
        let stats = series.stats();
        assert_eq!(stats.max, 8);
        assert_eq!(stats.sum, 12);
        assert_eq!(stats.avg, 3.0);
    }

    #[test]
    fn test_rates_scale_with_bucket_width() {
        let mut series = Series::empty(Direction::Up, 600, 100);
        series.add(0, 50);
        let stats = series.stats();
        // 50 bytes in 100ms
        assert_eq!(stats.max_rate, 500.0);
        assert_eq!(stats.sum, 50);

        let mut hourly = Series::empty(Direction::Up, 600, 6_000);
        hourly.add(3, 600);
        assert_eq!(hourly.stats().max_rate, 100.0);
    }

    #[test]
    fn test_add_accumulates_and_ignores_out_of_range() {
        let mut series = Series::empty(Direction::Up, 3, 100);
        series.add(1, 5);
        series.add(1, 7);
        series.add(3, 100);
        assert_eq!(series.buckets, vec![0, 12, 0]);
    }

    #[test]
    fn test_bar_fractions_with_zero_max() {
        let series = Series::empty(Direction::Up, 3, 100);
        assert_eq!(series.bar_fractions(), vec![0.0, 0.0, 0.0]);

        let mut series = Series::empty(Direction::Up, 3, 100);
        series.add(0, 10);
        series.add(2, 5);
        assert_eq!(series.bar_fractions(), vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_bar_fractions_cover_every_bucket() {
        let mut series = Series::empty(Direction::Down, 600, 100);
        for i in 0..600 {
            series.add(i, i as u64);
        }
        let fractions = series.bar_fractions();
        assert_eq!(fractions.len(), 600);
        assert_eq!(fractions[599], 1.0);
        assert_eq!(fractions[0], 0.0);
    }
}
