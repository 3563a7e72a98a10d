//! Sunrise and sunset for a fixed location
//!
//! Times come from the `sunrise` crate. It has no answer when the sun stays
//! above or below the horizon all day, so those days are classified by
//! hemisphere and season.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use timelimit_config::Location;
use timelimit_host_api::DaylightOracle;

/// Daylight for one calendar day
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DaylightWindow {
    Between {
        sunrise: DateTime<Utc>,
        sunset: DateTime<Utc>,
    },
    /// The sun never sets
    PolarDay,
    /// The sun never rises
    PolarNight,
}

/// Compute sunrise and sunset at `location` on `date`
pub fn daylight_window(location: Location, date: NaiveDate) -> DaylightWindow {
    let (sunrise, sunset) = sunrise::sunrise_sunset(
        location.latitude,
        location.longitude,
        date.year(),
        date.month(),
        date.day(),
    );

    let day_length = sunset.saturating_sub(sunrise);
    match (
        DateTime::from_timestamp(sunrise, 0),
        DateTime::from_timestamp(sunset, 0),
    ) {
        (Some(sunrise), Some(sunset)) if (1..86_400).contains(&day_length) => {
            DaylightWindow::Between { sunrise, sunset }
        }
        _ if is_summer(location, date) => DaylightWindow::PolarDay,
        _ => DaylightWindow::PolarNight,
    }
}

fn is_summer(location: Location, date: NaiveDate) -> bool {
    let northern_summer = (4..=9).contains(&date.month());
    (location.latitude >= 0.0) == northern_summer
}

/// Night is anything before today's sunrise or after today's sunset
#[derive(Debug, Clone, Copy)]
pub struct SolarDaylight {
    location: Location,
}

impl SolarDaylight {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl DaylightOracle for SolarDaylight {
    fn is_outside_daylight(&self, now: DateTime<Local>) -> bool {
        match daylight_window(self.location, now.date_naive()) {
            DaylightWindow::Between { sunrise, sunset } => !(now > sunrise && now < sunset),
            DaylightWindow::PolarDay => false,
            DaylightWindow::PolarNight => true,
        }
    }
}
