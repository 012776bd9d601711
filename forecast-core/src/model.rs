use serde::{Deserialize, Serialize};

/// Every n-th forecast entry becomes a daily point.
///
/// The upstream API returns 3-hour steps, so a stride of 8 lands roughly one
/// sample per day. It is not a calendar-day aggregation: a list that starts
/// at 21:00 samples 21:00 of each day.
pub const DAILY_STRIDE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// Local wall-clock time, `HH:MM`.
    pub time: String,
    pub temperature_c: f64,
    pub icon_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    /// Short weekday name, e.g. `Mon`.
    pub day_label: String,
    pub temperature_c: f64,
    pub icon_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city_name: String,
    pub temperature_c: f64,
    pub description: String,
    pub icon_ref: String,
    /// Today's date as shown in the header, e.g. `Monday, January 1`.
    pub display_date: String,
}

/// Everything one fetch produces. Replaced as a whole, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    /// `None` when the forecast list was empty.
    pub current: Option<CurrentConditions>,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyPoint>,
}

impl ForecastSnapshot {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.hourly.is_empty() && self.daily.is_empty()
    }
}
