//! Turns a raw OpenWeather `/forecast` body into a [`ForecastSnapshot`].
//!
//! Parsing is fail-fast: the first missing field or bad timestamp aborts the
//! whole payload, so callers never see a half-built list.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::{
    error::{ForecastError, MalformedReason},
    model::{CurrentConditions, DAILY_STRIDE, DailyPoint, ForecastSnapshot, HourlyPoint},
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_LABEL_FORMAT: &str = "%H:%M";
const DAY_LABEL_FORMAT: &str = "%a";
const DISPLAY_DATE_FORMAT: &str = "%A, %B %-d";

// The body is walked as a `Value` rather than derived structs so that every
// failure names the exact path, e.g. `list[3].main.temp`.

fn wrong_type(path: &str, expected: &'static str) -> ForecastError {
    ForecastError::MalformedResponse {
        field: path.to_string(),
        reason: MalformedReason::WrongType(expected),
    }
}

fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ForecastError> {
    value.as_object().ok_or_else(|| wrong_type(path, "object"))
}

/// `null` counts as missing.
fn require<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Value, ForecastError> {
    obj.get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ForecastError::missing(path))
}

fn string<'a>(value: &'a Value, path: &str) -> Result<&'a str, ForecastError> {
    value.as_str().ok_or_else(|| wrong_type(path, "string"))
}

fn number(value: &Value, path: &str) -> Result<f64, ForecastError> {
    value.as_f64().ok_or_else(|| wrong_type(path, "number"))
}

fn array<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], ForecastError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| wrong_type(path, "array"))
}

/// One entry after validation.
struct Sample<'a> {
    at: NaiveDateTime,
    temperature_c: f64,
    description: &'a str,
    icon: &'a str,
}

/// Parse a forecast body, using the local wall-clock date for the header.
pub fn parse_forecast(body: &str) -> Result<ForecastSnapshot, ForecastError> {
    parse_forecast_on(body, Local::now().date_naive())
}

/// Parse a forecast body with an explicit "today" for
/// [`CurrentConditions::display_date`].
pub fn parse_forecast_on(body: &str, today: NaiveDate) -> Result<ForecastSnapshot, ForecastError> {
    let root: Value = serde_json::from_str(body).map_err(|e| ForecastError::MalformedResponse {
        field: "body".to_string(),
        reason: MalformedReason::InvalidJson(e.to_string()),
    })?;
    let root = object(&root, "body")?;

    let city = object(require(root, "city", "city")?, "city")?;
    let city_name = string(require(city, "name", "city.name")?, "city.name")?.to_string();

    let entries = array(require(root, "list", "list")?, "list")?;

    let mut snapshot = ForecastSnapshot {
        current: None,
        hourly: Vec::with_capacity(entries.len()),
        daily: Vec::with_capacity(entries.len().div_ceil(DAILY_STRIDE)),
    };

    for (i, entry) in entries.iter().enumerate() {
        let sample = validate_entry(i, entry)?;

        if i == 0 {
            snapshot.current = Some(CurrentConditions {
                city_name: city_name.clone(),
                temperature_c: sample.temperature_c,
                description: sample.description.to_string(),
                icon_ref: sample.icon.to_string(),
                display_date: today.format(DISPLAY_DATE_FORMAT).to_string(),
            });
        }

        snapshot.hourly.push(HourlyPoint {
            time: sample.at.format(TIME_LABEL_FORMAT).to_string(),
            temperature_c: sample.temperature_c,
            icon_ref: sample.icon.to_string(),
        });

        if i % DAILY_STRIDE == 0 {
            snapshot.daily.push(DailyPoint {
                day_label: sample.at.format(DAY_LABEL_FORMAT).to_string(),
                temperature_c: sample.temperature_c,
                icon_ref: sample.icon.to_string(),
            });
        }
    }

    tracing::debug!(
        city = %city_name,
        hourly = snapshot.hourly.len(),
        daily = snapshot.daily.len(),
        "Parsed forecast payload"
    );

    Ok(snapshot)
}

fn validate_entry(i: usize, entry: &Value) -> Result<Sample<'_>, ForecastError> {
    let field = |name: &str| format!("list[{i}].{name}");

    let entry = object(entry, &format!("list[{i}]"))?;
    let main = object(require(entry, "main", &field("main"))?, &field("main"))?;
    let weather = array(require(entry, "weather", &field("weather"))?, &field("weather"))?
        .first()
        .ok_or_else(|| ForecastError::missing(field("weather[0]")))?;
    let weather = object(weather, &field("weather[0]"))?;
    let dt_txt = string(require(entry, "dt_txt", &field("dt_txt"))?, &field("dt_txt"))?;

    let at = NaiveDateTime::parse_from_str(dt_txt, TIMESTAMP_FORMAT).map_err(|_| {
        ForecastError::MalformedResponse {
            field: field("dt_txt"),
            reason: MalformedReason::InvalidTimestamp(dt_txt.to_string()),
        }
    })?;

    let temperature_c = number(require(main, "temp", &field("main.temp"))?, &field("main.temp"))?;
    let description = string(
        require(weather, "description", &field("weather[0].description"))?,
        &field("weather[0].description"),
    )?;
    let icon = string(
        require(weather, "icon", &field("weather[0].icon"))?,
        &field("weather[0].icon"),
    )?;

    Ok(Sample {
        at,
        temperature_c,
        description,
        icon,
    })
}
