use std::time::{Duration, SystemTime};

/// Evaluated against each file's mtime at call time (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    Today,
    ThisWeek,
    ThisMonth,
}

impl TimeFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "today" => Some(Self::Today),
            "this_week" => Some(Self::ThisWeek),
            "this_month" => Some(Self::ThisMonth),
            _ => None,
        }
    }

    fn window(self) -> Duration {
        match self {
            Self::Today => Duration::from_secs(24 * 60 * 60),
            Self::ThisWeek => Duration::from_secs(7 * 24 * 60 * 60),
            Self::ThisMonth => Duration::from_secs(30 * 24 * 60 * 60),
        }
    }

    pub fn matches(self, modified: SystemTime, now: SystemTime) -> bool {
        match now.duration_since(modified) {
            Ok(age) => age <= self.window(),
            Err(_) => true, // modified "in the future" (clock skew) counts as recent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_window_is_24_hours() {
        let now = SystemTime::now();
        let recent = now - Duration::from_secs(60 * 60);
        let stale = now - Duration::from_secs(48 * 60 * 60);
        assert!(TimeFilter::Today.matches(recent, now));
        assert!(!TimeFilter::Today.matches(stale, now));
    }
}
