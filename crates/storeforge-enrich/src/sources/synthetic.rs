//! Stand-in observations for sources whose credentials are missing.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rand::Rng;

use storeforge_core::values::round_to;
use storeforge_core::{EconomicIndicator, WeatherObservation};

use super::slug;

pub const WEATHER_DAYS: i64 = 30;
pub const ECONOMIC_DAYS: i64 = 365;
const CONDITIONS: [&str; 5] = ["Clear", "Clouds", "Rain", "Snow", "Thunderstorm"];
const SOURCE: &str = "synthetic";

/// One observation per city per day, ending at `now`.
pub fn weather<R: Rng>(rng: &mut R, cities: &[String], now: NaiveDateTime) -> Vec<WeatherObservation> {
    let mut records = Vec::with_capacity(cities.len() * WEATHER_DAYS as usize);
    for city in cities {
        for days_back in 0..WEATHER_DAYS {
            let observed_at = now - TimeDelta::days(days_back);
            records.push(WeatherObservation {
                observation_id: format!("{}:{}", slug(city), observed_at.format("%Y%m%dT%H%M%S")),
                city: city.clone(),
                observed_at,
                temperature_c: round_to(rng.random_range(-10.0..=35.0), 1),
                humidity: rng.random_range(20..=100),
                condition: CONDITIONS[rng.random_range(0..CONDITIONS.len())].to_string(),
                source: SOURCE.to_string(),
            });
        }
    }
    records
}

/// One value per series per day, ending at `today`.
pub fn economic<R: Rng>(rng: &mut R, series: &[String], today: NaiveDate) -> Vec<EconomicIndicator> {
    let mut records = Vec::with_capacity(series.len() * ECONOMIC_DAYS as usize);
    for series_id in series {
        let (low, high) = series_range(series_id);
        for days_back in 0..ECONOMIC_DAYS {
            let observation_date = today - TimeDelta::days(days_back);
            records.push(EconomicIndicator {
                indicator_id: format!("{series_id}:{observation_date}"),
                series_id: series_id.clone(),
                observation_date,
                value: round_to(rng.random_range(low..=high), 1),
                source: SOURCE.to_string(),
            });
        }
    }
    records
}

fn series_range(series_id: &str) -> (f64, f64) {
    match series_id {
        "UNRATE" => (3.5, 8.0),
        "CPIAUCSL" | "FPCPITOTLZGUSA" => (0.5, 6.0),
        "UMCSENT" => (80.0, 130.0),
        "A191RL1Q225SBEA" | "GDP" => (-2.0, 5.0),
        _ => (0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;

    use super::*;

    #[test]
    fn weather_covers_thirty_days_per_city() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid timestamp");
        let cities = vec!["Chicago".to_string(), "New York".to_string()];
        let records = weather(&mut rng, &cities, now);
        assert_eq!(records.len(), 60);
        let ids: HashSet<_> = records.iter().map(|r| r.observation_id.as_str()).collect();
        assert_eq!(ids.len(), 60);
        assert!(records.iter().all(|r| (20..=100).contains(&r.humidity)));
    }

    #[test]
    fn economic_covers_a_year_per_series() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
        let records = economic(&mut rng, &["UNRATE".to_string()], today);
        assert_eq!(records.len(), 365);
        assert_eq!(records[0].indicator_id, "UNRATE:2024-05-01");
        assert!(records.iter().all(|r| (3.5..=8.0).contains(&r.value)));
    }
}
