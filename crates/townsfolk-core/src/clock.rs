//! World clock for the Townsfolk simulation.
//!
//! The clock tracks the in-world time of day, the day counter, today's
//! weather, and a monotonic total-minutes counter used to timestamp
//! narrative events. Weather is re-rolled once for every day boundary the
//! clock crosses.
//!
//! All arithmetic is checked: the clock refuses to advance rather than
//! wrap.

use rand::Rng;
use townsfolk_types::Weather;
use townsfolk_world::roll_weather;

use crate::config::WorldConfig;

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * 60;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// A counter would overflow.
    #[error("clock overflow: cannot advance past day {day}")]
    Overflow {
        /// Day the clock was on.
        day: u32,
    },

    /// Starting time is not a valid time of day.
    #[error("invalid start time {hour}:{minute:02}")]
    InvalidTime {
        /// Offending hour.
        hour: u8,
        /// Offending minute.
        minute: u8,
    },
}

/// What one call to [`WorldClock::advance`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockAdvance {
    /// Number of midnights crossed.
    pub days_rolled: u32,
    /// Whether the weather was re-rolled.
    pub weather_changed: bool,
}

/// The in-world clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldClock {
    hour: u8,
    minute: u8,
    day: u32,
    weather: Weather,
    total_minutes: u64,
}

impl Default for WorldClock {
    /// Day 1, 08:00, sunny.
    fn default() -> Self {
        Self {
            hour: 8,
            minute: 0,
            day: 1,
            weather: Weather::Sunny,
            total_minutes: 0,
        }
    }
}

impl WorldClock {
    /// Create a clock at the configured start time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidTime`] if the start hour or minute is
    /// out of range.
    pub fn new(config: &WorldConfig) -> Result<Self, ClockError> {
        Self::from_parts(
            config.start_day,
            config.start_hour,
            config.start_minute,
            config.start_weather,
        )
    }

    /// Create a clock from explicit parameters (useful for testing and
    /// state restoration). The total-minutes counter starts at zero.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidTime`] if `hour > 23` or `minute > 59`.
    pub const fn from_parts(day: u32, hour: u8, minute: u8, weather: Weather) -> Result<Self, ClockError> {
        if hour > 23 || minute > 59 {
            return Err(ClockError::InvalidTime { hour, minute });
        }
        Ok(Self {
            hour,
            minute,
            day,
            weather,
            total_minutes: 0,
        })
    }

    /// Advance by `minutes` of in-world time, re-rolling the weather once
    /// per day boundary crossed.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if the day or total-minutes counter
    /// would overflow; the clock is left unchanged in that case.
    pub fn advance<R: Rng + ?Sized>(&mut self, minutes: u32, rng: &mut R) -> Result<ClockAdvance, ClockError> {
        let overflow = ClockError::Overflow { day: self.day };
        let minutes = u64::from(minutes);

        let of_day = u64::from(self.hour)
            .saturating_mul(MINUTES_PER_HOUR)
            .saturating_add(u64::from(self.minute))
            .saturating_add(minutes);
        let days = of_day / MINUTES_PER_DAY;
        let remainder = of_day % MINUTES_PER_DAY;

        let days_rolled = u32::try_from(days).map_err(|_err| ClockError::Overflow { day: self.day })?;
        let day = self.day.checked_add(days_rolled).ok_or(overflow)?;
        let total_minutes = self
            .total_minutes
            .checked_add(minutes)
            .ok_or(ClockError::Overflow { day: self.day })?;
        let hour = u8::try_from(remainder / MINUTES_PER_HOUR)
            .map_err(|_err| ClockError::Overflow { day: self.day })?;
        let minute = u8::try_from(remainder % MINUTES_PER_HOUR)
            .map_err(|_err| ClockError::Overflow { day: self.day })?;

        self.hour = hour;
        self.minute = minute;
        self.day = day;
        self.total_minutes = total_minutes;

        for _ in 0..days_rolled {
            self.weather = roll_weather(rng);
        }

        Ok(ClockAdvance {
            days_rolled,
            weather_changed: days_rolled > 0,
        })
    }

    /// Hour of day, `0..=23`.
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute of hour, `0..=59`.
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Day counter, starting at 1 by default.
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Today's weather.
    pub const fn weather(&self) -> Weather {
        self.weather
    }

    /// Override today's weather.
    pub const fn set_weather(&mut self, weather: Weather) {
        self.weather = weather;
    }

    /// In-world minutes elapsed since the clock was created.
    pub const fn total_minutes(&self) -> u64 {
        self.total_minutes
    }
}

impl core::fmt::Display for WorldClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "day {} {:02}:{:02} ({})",
            self.day, self.hour, self.minute, self.weather
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn make_rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn clock_starts_at_eight_on_day_one() {
        let clock = WorldClock::default();
        assert_eq!((clock.day(), clock.hour(), clock.minute()), (1, 8, 0));
        assert_eq!(clock.weather(), Weather::Sunny);
        assert_eq!(clock.total_minutes(), 0);
    }

    #[test]
    fn config_start_time_is_used() {
        let config = WorldConfig {
            start_hour: 22,
            start_minute: 15,
            start_day: 3,
            start_weather: Weather::Rain,
            ..WorldConfig::default()
        };
        let clock = WorldClock::new(&config).unwrap();
        assert_eq!(clock.to_string(), "day 3 22:15 (rain)");
    }

    #[test]
    fn advance_within_day_keeps_weather() {
        let mut clock = WorldClock::default();
        let mut rng = make_rng();
        let step = clock.advance(125, &mut rng).unwrap();
        assert_eq!((clock.hour(), clock.minute()), (10, 5));
        assert_eq!(step.days_rolled, 0);
        assert!(!step.weather_changed);
        assert_eq!(clock.weather(), Weather::Sunny);
        assert_eq!(clock.total_minutes(), 125);
    }

    #[test]
    fn crossing_midnight_rolls_day_and_weather() {
        let mut clock = WorldClock::from_parts(1, 23, 0, Weather::Sunny).unwrap();
        let mut rng = make_rng();
        let step = clock.advance(90, &mut rng).unwrap();
        assert_eq!((clock.hour(), clock.minute()), (0, 30));
        assert_eq!(clock.day(), 2);
        assert_eq!(step.days_rolled, 1);
        assert!(step.weather_changed);
    }

    #[test]
    fn weather_roll_is_seeded() {
        let mut a = WorldClock::from_parts(1, 23, 0, Weather::Sunny).unwrap();
        let mut b = a.clone();
        let _ = a.advance(24 * 60 * 5, &mut make_rng()).unwrap();
        let _ = b.advance(24 * 60 * 5, &mut make_rng()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.day(), 6);
    }

    #[test]
    fn invalid_start_rejected() {
        assert!(matches!(
            WorldClock::from_parts(1, 24, 0, Weather::Sunny),
            Err(ClockError::InvalidTime { hour: 24, .. })
        ));
        assert!(WorldClock::from_parts(1, 12, 60, Weather::Sunny).is_err());
    }

    #[test]
    fn day_overflow_leaves_clock_unchanged() {
        let mut clock = WorldClock::from_parts(u32::MAX, 23, 59, Weather::Snow).unwrap();
        let before = clock.clone();
        let err = clock.advance(1, &mut make_rng()).unwrap_err();
        assert!(matches!(err, ClockError::Overflow { .. }));
        assert_eq!(clock, before);
    }
}
