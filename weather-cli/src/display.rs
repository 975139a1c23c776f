//! Human-readable rendering of a weather record.

use chrono::{DateTime, Local};
use weather_core::WeatherRecord;

const TIME_FORMAT: &str = "%d %b %Y, %H:%M";

/// Render `record` as seven labelled lines, stamped with `now`.
pub fn render(record: &WeatherRecord, now: DateTime<Local>) -> String {
    format!(
        "City:        {city}\n\
         Time:        {time}\n\
         Temperature: {temp:.1}°C\n\
         Feels like:  {feels:.1}°C\n\
         Weather:     {condition}\n\
         Humidity:    {humidity}%\n\
         Wind speed:  {wind:.1} m/s\n",
        city = record.city,
        time = now.format(TIME_FORMAT),
        temp = record.temperature_c,
        feels = record.feels_like_c,
        condition = capitalize_first(&record.condition),
        humidity = record.humidity_pct,
        wind = record.wind_speed_mps,
    )
}

/// Upper-case the first character, ASCII only.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(text.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}
