use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// The fixed zone used when timestamps are shown to users.
///
/// Timestamps are always stored in UTC; this only affects rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayZone {
    offset: FixedOffset,
}

impl DisplayZone {
    /// Moscow time, the zone the bot has always reported in.
    pub const DEFAULT_OFFSET_HOURS: i32 = 3;

    /// Build a zone from a whole-hour offset east of UTC.
    ///
    /// Returns `None` when the offset is outside `-23..=23`.
    #[must_use]
    pub fn from_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours.checked_mul(3600)?).map(|offset| Self { offset })
    }

    #[must_use]
    pub fn localize(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }

    /// Render as `dd.mm.yyyy HH:MM` in this zone.
    #[must_use]
    pub fn format_short(&self, at: DateTime<Utc>) -> String {
        self.localize(at).format("%d.%m.%Y %H:%M").to_string()
    }
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self::from_hours(Self::DEFAULT_OFFSET_HOURS).unwrap_or(Self { offset: Utc.fix() })
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), fixed_now() + Duration::minutes(5));
    }

    #[test]
    fn display_zone_renders_moscow_time() {
        let zone = DisplayZone::default();
        // 22:13 UTC is 01:13 the next day in UTC+3.
        assert_eq!(zone.format_short(fixed_now()), "15.11.2023 01:13");
    }

    #[test]
    fn display_zone_rejects_out_of_range_offsets() {
        assert!(DisplayZone::from_hours(30).is_none());
        assert!(DisplayZone::from_hours(-5).is_some());
    }
}
