use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Observation, TimeSeries};
use crate::utils::constants::{
    DAILY_PRECIPITATION_SUM, DAILY_TEMPERATURE_MAX, DAILY_TEMPERATURE_MIN, DAILY_WIND_SPEED_MAX,
};

/// Parameter-direction pairs flagged on daily observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremeEvent {
    HighTemp,
    LowTemp,
    HighPrecipitation,
    LowPrecipitation,
    HighWindSpeed,
    LowWindSpeed,
}

impl ExtremeEvent {
    pub const ALL: [ExtremeEvent; 6] = [
        ExtremeEvent::HighTemp,
        ExtremeEvent::LowTemp,
        ExtremeEvent::HighPrecipitation,
        ExtremeEvent::LowPrecipitation,
        ExtremeEvent::HighWindSpeed,
        ExtremeEvent::LowWindSpeed,
    ];

    pub fn index(&self) -> usize {
        match self {
            ExtremeEvent::HighTemp => 0,
            ExtremeEvent::LowTemp => 1,
            ExtremeEvent::HighPrecipitation => 2,
            ExtremeEvent::LowPrecipitation => 3,
            ExtremeEvent::HighWindSpeed => 4,
            ExtremeEvent::LowWindSpeed => 5,
        }
    }

    pub fn column_name(&self) -> &'static str {
        match self {
            ExtremeEvent::HighTemp => "extreme_high_temp",
            ExtremeEvent::LowTemp => "extreme_low_temp",
            ExtremeEvent::HighPrecipitation => "extreme_high_precipitation",
            ExtremeEvent::LowPrecipitation => "extreme_low_precipitation",
            ExtremeEvent::HighWindSpeed => "extreme_high_wind_speed",
            ExtremeEvent::LowWindSpeed => "extreme_low_wind_speed",
        }
    }

    /// Daily column the flag is evaluated against.
    ///
    /// Both wind flags read `wind_speed_10m_max_kmh`.
    pub fn source_parameter(&self) -> &'static str {
        match self {
            ExtremeEvent::HighTemp => DAILY_TEMPERATURE_MAX,
            ExtremeEvent::LowTemp => DAILY_TEMPERATURE_MIN,
            ExtremeEvent::HighPrecipitation | ExtremeEvent::LowPrecipitation => {
                DAILY_PRECIPITATION_SUM
            }
            ExtremeEvent::HighWindSpeed | ExtremeEvent::LowWindSpeed => DAILY_WIND_SPEED_MAX,
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(
            self,
            ExtremeEvent::HighTemp | ExtremeEvent::HighPrecipitation | ExtremeEvent::HighWindSpeed
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExtremeEvent::HighTemp => "High Temperature",
            ExtremeEvent::LowTemp => "Low Temperature",
            ExtremeEvent::HighPrecipitation => "High Precipitation",
            ExtremeEvent::LowPrecipitation => "Low Precipitation",
            ExtremeEvent::HighWindSpeed => "High Wind Speed",
            ExtremeEvent::LowWindSpeed => "Low Wind Speed",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ExtremeEvent::HighTemp | ExtremeEvent::LowTemp => "°C",
            ExtremeEvent::HighPrecipitation | ExtremeEvent::LowPrecipitation => "mm",
            ExtremeEvent::HighWindSpeed | ExtremeEvent::LowWindSpeed => "km/h",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub low: f64,
    pub high: f64,
}

/// Percentile bounds computed once over a full daily history.
///
/// Passed by value to flagging; recompute it whenever the series changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtremeThresholds {
    pub temperature: Bounds,
    pub precipitation: Bounds,
    pub wind_speed: Bounds,
}

impl ExtremeThresholds {
    pub fn bound(&self, event: ExtremeEvent) -> f64 {
        match event {
            ExtremeEvent::HighTemp => self.temperature.high,
            ExtremeEvent::LowTemp => self.temperature.low,
            ExtremeEvent::HighPrecipitation => self.precipitation.high,
            ExtremeEvent::LowPrecipitation => self.precipitation.low,
            ExtremeEvent::HighWindSpeed => self.wind_speed.high,
            ExtremeEvent::LowWindSpeed => self.wind_speed.low,
        }
    }

    /// Strict comparison; NaN never qualifies
    pub fn is_extreme(&self, event: ExtremeEvent, value: f64) -> bool {
        let bound = self.bound(event);
        if event.is_high() {
            value > bound
        } else {
            value < bound
        }
    }

    pub fn with_bound(mut self, event: ExtremeEvent, value: f64) -> Self {
        match event {
            ExtremeEvent::HighTemp => self.temperature.high = value,
            ExtremeEvent::LowTemp => self.temperature.low = value,
            ExtremeEvent::HighPrecipitation => self.precipitation.high = value,
            ExtremeEvent::LowPrecipitation => self.precipitation.low = value,
            ExtremeEvent::HighWindSpeed => self.wind_speed.high = value,
            ExtremeEvent::LowWindSpeed => self.wind_speed.low = value,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFlags([bool; 6]);

impl EventFlags {
    pub fn get(&self, event: ExtremeEvent) -> bool {
        self.0[event.index()]
    }

    pub fn set(&mut self, event: ExtremeEvent, flagged: bool) {
        self.0[event.index()] = flagged;
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|f| *f)
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|f| **f).count()
    }
}

/// Daily series with the six extreme flags attached to each row
#[derive(Debug, Clone)]
pub struct FlaggedSeries {
    series: TimeSeries,
    thresholds: ExtremeThresholds,
    source_columns: [usize; 6],
    flags: Vec<EventFlags>,
}

impl FlaggedSeries {
    pub(crate) fn new(
        series: TimeSeries,
        thresholds: ExtremeThresholds,
        source_columns: [usize; 6],
        flags: Vec<EventFlags>,
    ) -> Self {
        Self {
            series,
            thresholds,
            source_columns,
            flags,
        }
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn thresholds(&self) -> &ExtremeThresholds {
        &self.thresholds
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Observation, &EventFlags)> {
        self.series.observations().iter().zip(self.flags.iter())
    }

    pub fn flags(&self) -> &[EventFlags] {
        &self.flags
    }

    /// Raw source value of an event's column for one row
    pub fn source_value(&self, observation: &Observation, event: ExtremeEvent) -> Option<f64> {
        observation.value(self.source_columns[event.index()])
    }

    pub fn count(&self, event: ExtremeEvent) -> usize {
        self.flags.iter().filter(|f| f.get(event)).count()
    }

    /// Source values of the rows where `event` is flagged
    pub fn flagged_values(&self, event: ExtremeEvent) -> Vec<f64> {
        self.rows()
            .filter(|(_, flags)| flags.get(event))
            .filter_map(|(observation, _)| self.source_value(observation, event))
            .collect()
    }

    pub fn flagged_dates(&self, event: ExtremeEvent) -> Vec<NaiveDate> {
        self.rows()
            .filter(|(_, flags)| flags.get(event))
            .map(|(observation, _)| observation.date())
            .collect()
    }
}

/// Number of flagged days per event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub extreme_high_temp: u32,
    pub extreme_low_temp: u32,
    pub extreme_high_precipitation: u32,
    pub extreme_low_precipitation: u32,
    pub extreme_high_wind_speed: u32,
    pub extreme_low_wind_speed: u32,
}

impl EventCounts {
    pub fn get(&self, event: ExtremeEvent) -> u32 {
        match event {
            ExtremeEvent::HighTemp => self.extreme_high_temp,
            ExtremeEvent::LowTemp => self.extreme_low_temp,
            ExtremeEvent::HighPrecipitation => self.extreme_high_precipitation,
            ExtremeEvent::LowPrecipitation => self.extreme_low_precipitation,
            ExtremeEvent::HighWindSpeed => self.extreme_high_wind_speed,
            ExtremeEvent::LowWindSpeed => self.extreme_low_wind_speed,
        }
    }

    pub fn add(&mut self, flags: &EventFlags) {
        for event in ExtremeEvent::ALL {
            if flags.get(event) {
                let slot = match event {
                    ExtremeEvent::HighTemp => &mut self.extreme_high_temp,
                    ExtremeEvent::LowTemp => &mut self.extreme_low_temp,
                    ExtremeEvent::HighPrecipitation => &mut self.extreme_high_precipitation,
                    ExtremeEvent::LowPrecipitation => &mut self.extreme_low_precipitation,
                    ExtremeEvent::HighWindSpeed => &mut self.extreme_high_wind_speed,
                    ExtremeEvent::LowWindSpeed => &mut self.extreme_low_wind_speed,
                };
                *slot += 1;
            }
        }
    }

    pub fn total(&self) -> u32 {
        ExtremeEvent::ALL.iter().map(|e| self.get(*e)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyFrequency {
    pub year: i32,
    #[serde(flatten)]
    pub counts: EventCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFrequency {
    pub period_end: NaiveDate,
    #[serde(flatten)]
    pub counts: EventCounts,
}

/// Mean raw value over the flagged rows of each event, 0 when none are flagged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtremeAverages {
    pub avg_high_temp: f64,
    pub avg_low_temp: f64,
    pub avg_high_precip: f64,
    pub avg_low_precip: f64,
    pub avg_high_wind: f64,
    pub avg_low_wind: f64,
}

impl ExtremeAverages {
    pub fn from_fn(mut average: impl FnMut(ExtremeEvent) -> f64) -> Self {
        Self {
            avg_high_temp: average(ExtremeEvent::HighTemp),
            avg_low_temp: average(ExtremeEvent::LowTemp),
            avg_high_precip: average(ExtremeEvent::HighPrecipitation),
            avg_low_precip: average(ExtremeEvent::LowPrecipitation),
            avg_high_wind: average(ExtremeEvent::HighWindSpeed),
            avg_low_wind: average(ExtremeEvent::LowWindSpeed),
        }
    }

    pub fn get(&self, event: ExtremeEvent) -> f64 {
        match event {
            ExtremeEvent::HighTemp => self.avg_high_temp,
            ExtremeEvent::LowTemp => self.avg_low_temp,
            ExtremeEvent::HighPrecipitation => self.avg_high_precip,
            ExtremeEvent::LowPrecipitation => self.avg_low_precip,
            ExtremeEvent::HighWindSpeed => self.avg_high_wind,
            ExtremeEvent::LowWindSpeed => self.avg_low_wind,
        }
    }

    pub fn summary(&self) -> String {
        ExtremeEvent::ALL
            .iter()
            .map(|event| {
                format!(
                    "Average {} (Extreme Events): {:.2} {}",
                    event.label(),
                    self.get(*event),
                    event.unit()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Outcome of one extreme-event pass over a daily series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeReport {
    pub thresholds: ExtremeThresholds,
    pub total_days: usize,
    pub flagged_days: usize,
    pub yearly: Vec<YearlyFrequency>,
    pub averages: ExtremeAverages,
}

impl ExtremeReport {
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Extreme Weather Report ===\n");
        summary.push_str(&format!(
            "Days analysed: {}, days with at least one extreme: {}\n",
            self.total_days, self.flagged_days
        ));
        summary.push_str("\nThresholds:\n");
        for event in ExtremeEvent::ALL {
            summary.push_str(&format!(
                "  {:<20} {} {:.2} {}\n",
                event.label(),
                if event.is_high() { ">" } else { "<" },
                self.thresholds.bound(event),
                event.unit()
            ));
        }

        summary.push_str("\nYearly frequency (high temp / low temp / high precip / low precip / high wind / low wind):\n");
        for row in &self.yearly {
            summary.push_str(&format!(
                "  {}: {} / {} / {} / {} / {} / {}\n",
                row.year,
                row.counts.extreme_high_temp,
                row.counts.extreme_low_temp,
                row.counts.extreme_high_precipitation,
                row.counts.extreme_low_precipitation,
                row.counts.extreme_high_wind_speed,
                row.counts.extreme_low_wind_speed
            ));
        }

        summary.push('\n');
        summary.push_str(&self.averages.summary());
        summary
    }
}
