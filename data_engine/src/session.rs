use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Trading hours of one simulated day.
///
/// The session opens at `start` and closes at `end`; one bar is produced
/// for every minute in `[start, end)`. A session whose end is not after its
/// start contains no minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingSession {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradingSession {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        TradingSession { start, end }
    }

    /// Number of one-minute bars in the session.
    pub fn minutes_count(&self) -> usize {
        let span = (self.end - self.start).num_minutes();
        usize::try_from(span).unwrap_or(0)
    }

    /// Opening timestamp of every minute of the session on `date`, in order.
    pub fn minutes(&self, date: NaiveDate) -> impl Iterator<Item = NaiveDateTime> {
        let open = date.and_time(self.start);
        (0..self.minutes_count()).map(move |m| open + Duration::minutes(m as i64))
    }
}

impl fmt::Display for TradingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn regular_session_has_390_minutes() {
        let session = TradingSession::new(hm(9, 30), hm(16, 0));
        assert_eq!(session.minutes_count(), 390);
        assert_eq!(session.to_string(), "09:30-16:00");
    }

    #[test]
    fn minutes_exclude_the_close() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let session = TradingSession::new(hm(9, 30), hm(9, 33));
        let stamps: Vec<_> = session.minutes(date).collect();
        assert_eq!(
            stamps,
            vec![date.and_time(hm(9, 30)), date.and_time(hm(9, 31)), date.and_time(hm(9, 32))]
        );
    }

    #[test]
    fn empty_and_inverted_sessions_have_no_minutes() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(TradingSession::new(hm(10, 0), hm(10, 0)).minutes(date).count(), 0);
        assert_eq!(TradingSession::new(hm(16, 0), hm(9, 30)).minutes_count(), 0);
    }
}
