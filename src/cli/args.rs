use crate::analyzers::VariabilityMode;
use crate::models::{Cadence, Timeframe};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weather-analyzer")]
#[command(about = "Aggregate weather history, detect extreme events and score days for outdoor events")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resample one table into week, month, season or year buckets
    Aggregate {
        #[arg(short, long, help = "SQLite database with hourly_data and daily_data")]
        database: PathBuf,

        #[arg(long, default_value = "daily")]
        cadence: Cadence,

        #[arg(short, long, help = "week, month, season or year")]
        timeframe: Timeframe,

        #[arg(
            short,
            long,
            help = "Output Parquet file path [default: {output_dir}/{cadence}-{timeframe}-{YYMMDD}.parquet]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Write the Parquet file to the default location")]
        save: bool,

        #[arg(short, long, help = "Parquet compression [default: from configuration]")]
        compression: Option<String>,

        #[arg(long, help = "Leave out buckets without observations")]
        drop_empty: bool,
    },

    /// Aggregate one table into every timeframe in parallel
    AggregateAll {
        #[arg(short, long)]
        database: PathBuf,

        #[arg(long, default_value = "daily")]
        cadence: Cadence,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,

        #[arg(long, help = "Write one Parquet file per timeframe into this directory")]
        output_dir: Option<PathBuf>,
    },

    /// List buckets whose standard deviation is above or below a threshold
    Variability {
        #[arg(short, long)]
        database: PathBuf,

        #[arg(short, long)]
        parameter: String,

        #[arg(short, long)]
        timeframe: Timeframe,

        #[arg(long)]
        threshold: f64,

        #[arg(short, long, help = "above or below")]
        mode: VariabilityMode,

        #[arg(long, default_value = "daily")]
        cadence: Cadence,
    },

    /// Percentile-based extreme event thresholds, counts and averages
    Extremes {
        #[arg(short, long)]
        database: PathBuf,

        #[arg(short, long, help = "Write the frequency table to this CSV file")]
        output: Option<PathBuf>,

        #[arg(long, help = "Print the report as JSON")]
        json: bool,

        #[arg(long, help = "Count per week, month or season instead of per year")]
        by: Option<Timeframe>,
    },

    /// Score every day for outdoor event suitability
    Score {
        #[arg(short, long)]
        database: PathBuf,

        #[arg(
            short,
            long,
            help = "Output CSV file path [default: {output_dir}/event-suitability-scores-{YYMMDD}.csv]"
        )]
        output_file: Option<PathBuf>,
    },

    /// Describe the tables in a database and check their integrity
    Info {
        #[arg(short, long)]
        database: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variability_command() {
        let cli = Cli::try_parse_from([
            "weather-analyzer",
            "variability",
            "--database",
            "weather.db",
            "--parameter",
            "temperature_2m_C",
            "--timeframe",
            "month",
            "--threshold",
            "2.5",
            "--mode",
            "under",
            "--cadence",
            "hourly",
        ])
        .unwrap();

        match cli.command {
            Commands::Variability {
                timeframe,
                mode,
                cadence,
                threshold,
                ..
            } => {
                assert_eq!(timeframe, Timeframe::Month);
                assert_eq!(mode, VariabilityMode::Below);
                assert_eq!(cadence, Cadence::Hourly);
                assert_eq!(threshold, 2.5);
            }
            _ => panic!("expected variability command"),
        }
    }

    #[test]
    fn test_rejects_unknown_timeframe() {
        let result = Cli::try_parse_from([
            "weather-analyzer",
            "aggregate",
            "--database",
            "weather.db",
            "--timeframe",
            "fortnight",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "weather-analyzer",
            "score",
            "--database",
            "weather.db",
            "--verbose",
            "--config",
            "analysis.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("analysis.toml")));
    }
}
