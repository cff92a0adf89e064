pub mod aggregator;
pub mod extreme_events;
pub mod suitability;
pub mod variability;
pub mod weather_analyzer;

pub use aggregator::Aggregator;
pub use extreme_events::ExtremeEventDetector;
pub use suitability::SuitabilityScorer;
pub use variability::{VariabilityFilter, VariabilityMode};
pub use weather_analyzer::{ParameterSummary, SeriesSummary, WeatherAnalyzer};
