pub mod aggregated;
pub mod extreme;
pub mod score;
pub mod series;
pub mod timeframe;

pub use aggregated::{AggregatedPeriod, AggregatedTable, Statistic, Statistics};
pub use extreme::{
    Bounds, EventCounts, EventFlags, ExtremeAverages, ExtremeEvent, ExtremeReport,
    ExtremeThresholds, FlaggedSeries, PeriodFrequency, YearlyFrequency,
};
pub use score::{ScoreRecord, ScoreSummary, ScoreTable};
pub use series::{Cadence, Observation, TimeSeries, TimeSeriesBuilder};
pub use timeframe::{season_name, Timeframe};
