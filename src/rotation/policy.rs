//! Rotation decisions
//!
//! Size mode rotates lazily, right before a write that would reach the
//! threshold. Time mode rotates on a timer and ignores sizes entirely; the
//! two modes are mutually exclusive.

use std::time::Duration;

/// Size and time thresholds of one reporter instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotationConfig {
    max_bytes: Option<u64>,
    interval: Option<Duration>,
}

impl RotationConfig {
    /// Create a config; an interval forces the size threshold to unbounded
    pub fn new(max_bytes: Option<u64>, interval: Option<Duration>) -> Self {
        let max_bytes = if interval.is_some() { None } else { max_bytes };
        Self { max_bytes, interval }
    }

    /// Rotate when a file would reach `max_bytes`
    pub fn by_size(max_bytes: u64) -> Self {
        Self::new(Some(max_bytes), None)
    }

    /// Rotate every `interval`
    pub fn by_interval(interval: Duration) -> Self {
        Self::new(None, Some(interval))
    }

    /// Size threshold, `None` when unbounded
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    /// Rotation interval, `None` when time mode is disabled
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Build the write-path policy for this config
    pub fn policy(&self) -> RotationPolicy {
        match (self.interval, self.max_bytes) {
            (Some(period), _) => RotationPolicy::Interval { period },
            (None, Some(max_bytes)) => RotationPolicy::Size { max_bytes },
            (None, None) => RotationPolicy::Unbounded,
        }
    }
}

/// Decision logic consulted before every write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Never rotate
    Unbounded,
    /// Rotate before a write that would bring the file to `max_bytes`
    Size { max_bytes: u64 },
    /// Rotation is driven by the timer, never by the write path
    Interval { period: Duration },
}

impl RotationPolicy {
    /// Whether to open a new file before writing `incoming` bytes
    ///
    /// An empty file is never rotated, so an entry larger than the threshold
    /// gets a file of its own instead of an endless run of empty files.
    pub fn should_rotate(&self, current_bytes: u64, incoming_bytes: u64) -> bool {
        match *self {
            RotationPolicy::Size { max_bytes } => {
                current_bytes > 0 && current_bytes.saturating_add(incoming_bytes) >= max_bytes
            }
            RotationPolicy::Unbounded | RotationPolicy::Interval { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_forces_unbounded_size() {
        let config = RotationConfig::new(Some(300), Some(Duration::from_secs(60)));
        assert_eq!(config.max_bytes(), None);
        assert_eq!(config.interval(), Some(Duration::from_secs(60)));
        assert!(matches!(config.policy(), RotationPolicy::Interval { .. }));
    }

    #[test]
    fn test_size_policy_threshold() {
        let policy = RotationConfig::by_size(300).policy();
        assert!(!policy.should_rotate(264, 35));
        assert!(policy.should_rotate(264, 36));
        assert!(policy.should_rotate(264, 44));
    }

    #[test]
    fn test_size_policy_never_rotates_empty_file() {
        let policy = RotationPolicy::Size { max_bytes: 10 };
        assert!(!policy.should_rotate(0, 500));
        assert!(policy.should_rotate(1, 500));
    }

    #[test]
    fn test_non_size_policies_never_rotate_on_write() {
        assert!(!RotationPolicy::Unbounded.should_rotate(u64::MAX, 1));
        let interval = RotationConfig::by_interval(Duration::from_millis(10)).policy();
        assert!(!interval.should_rotate(u64::MAX, u64::MAX));
        assert_eq!(RotationConfig::default().policy(), RotationPolicy::Unbounded);
    }

    #[test]
    fn test_twenty_events_split_like_reference_run() {
        // Ten 44-byte records followed by ten 46-byte records, 300-byte limit
        let policy = RotationConfig::by_size(300).policy();
        let sizes: Vec<u64> = (0..20).map(|i| if i < 10 { 44 } else { 46 }).collect();

        let mut files = vec![0u64];
        for size in sizes {
            let current = *files.last().unwrap();
            if policy.should_rotate(current, size) {
                files.push(0);
            }
            *files.last_mut().unwrap() += size;
        }

        assert_eq!(files, vec![264, 268, 276, 92]);
        assert_eq!(files.iter().sum::<u64>(), 900);
    }
}
