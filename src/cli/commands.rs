use crate::analyzers::{
    Aggregator, ExtremeEventDetector, SeriesSummary, SuitabilityScorer, WeatherAnalyzer,
};
use crate::cli::args::{Cli, Commands};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{AggregatedTable, Cadence, ScoreTable};
use crate::processors::IntegrityChecker;
use crate::readers::SqliteReader;
use crate::utils::filename::{generate_default_aggregate_filename, generate_default_scores_filename};
use crate::utils::progress::ProgressReporter;
use crate::writers::{csv_writer, ParquetWriter};
use std::path::Path;
use tracing::{info, warn};

fn open_session(database: &Path) -> Result<WeatherAnalyzer> {
    let progress = ProgressReporter::new_spinner("Loading observations...", false);
    let reader = SqliteReader::open(database)?;
    let session = WeatherAnalyzer::from_store(&reader)?;
    progress.finish_with_message(&format!(
        "Loaded {} hourly and {} daily observations",
        session.hourly().len(),
        session.daily().len()
    ));
    Ok(session)
}

fn print_table(table: &AggregatedTable) {
    println!(
        "{} {} aggregate: {} buckets ({} empty)",
        table.cadence,
        table.timeframe,
        table.len(),
        table.empty_period_count()
    );

    for period in &table.periods {
        let cells: Vec<String> = table
            .parameters
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let stats = period.statistics(index);
                format!("{}={:.2}±{:.2}", name, stats.mean, stats.std)
            })
            .collect();
        println!(
            "  {:<22} n={:<5} {}",
            table.timeframe.label(period.period_end),
            period.observation_count,
            cells.join("  ")
        );
    }
}

fn print_scores(scores: &ScoreTable, good_event_threshold: f64) {
    match scores.describe() {
        Some(summary) => println!("\n{}", summary.summary()),
        None => println!("\nNo days could be scored"),
    }

    println!("\nAverage event suitability score by month:");
    for (month, average) in scores.monthly_averages() {
        let name = u8::try_from(month)
            .ok()
            .and_then(|m| chrono::Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("Unknown");
        println!("  {:<10} {:.2}", name, average);
    }

    println!(
        "\nGood event days (score >= {}): {}",
        good_event_threshold,
        scores.good_days(good_event_threshold)
    );
    if scores.skipped_rows > 0 || scores.failed_rows > 0 {
        println!(
            "Rows left out: {} with missing values, {} failed",
            scores.skipped_rows, scores.failed_rows
        );
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = AnalysisConfig::load(cli.config.as_deref())?;
    info!("Configuration loaded");

    match cli.command {
        Commands::Aggregate {
            database,
            cadence,
            timeframe,
            output,
            save,
            compression,
            drop_empty,
        } => {
            let session = open_session(&database)?;

            let mut table = session.aggregate(cadence, timeframe)?;
            if drop_empty {
                table = table.drop_empty();
            }
            print_table(&table);

            let output = output.or_else(|| {
                save.then(|| {
                    generate_default_aggregate_filename(&config.output.directory, cadence, timeframe)
                })
            });

            if let Some(output) = output {
                let compression = compression.unwrap_or_else(|| config.output.compression.clone());
                let writer = ParquetWriter::new().with_compression(&compression)?;
                writer.write_table(&table, &output)?;

                let file_info = writer.get_file_info(&output)?;
                println!("\n{}", file_info.summary());
            }
        }

        Commands::AggregateAll {
            database,
            cadence,
            max_workers,
            output_dir,
        } => {
            let session = open_session(&database)?;
            println!("Aggregating {} data with {} workers", cadence, max_workers);

            let tables = session.aggregate_all(cadence, Some(max_workers))?;
            let writer = ParquetWriter::new().with_compression(&config.output.compression)?;

            for (timeframe, table) in &tables {
                println!(
                    "  {:<7} {} buckets ({} empty)",
                    timeframe,
                    table.len(),
                    table.empty_period_count()
                );

                if let Some(dir) = &output_dir {
                    let path = generate_default_aggregate_filename(dir, cadence, *timeframe);
                    writer.write_table(table, &path)?;
                }
            }
        }

        Commands::Variability {
            database,
            parameter,
            timeframe,
            threshold,
            mode,
            cadence,
        } => {
            let session = open_session(&database)?;
            let periods =
                session.filter_variability(cadence, &parameter, timeframe, threshold, mode)?;
            let index = session
                .series(cadence)
                .column_index(&parameter)
                .unwrap_or_default();

            println!(
                "{} {} buckets with {} std {} {}: {}",
                cadence,
                timeframe,
                parameter,
                mode,
                threshold,
                periods.len()
            );
            for period in &periods {
                let stats = period.statistics(index);
                println!(
                    "  {:<22} std={:.2} mean={:.2} (n={})",
                    timeframe.label(period.period_end),
                    stats.std,
                    stats.mean,
                    stats.count
                );
            }
        }

        Commands::Extremes {
            database,
            output,
            json,
            by,
        } => {
            let session = open_session(&database)?;
            let detector = ExtremeEventDetector::new(Aggregator::new()).with_percentiles(
                config.extremes.low_percentile,
                config.extremes.high_percentile,
            );

            let report = detector.detect(session.daily())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.summary());
            }

            match by {
                Some(timeframe) => {
                    let flagged = detector.flag_events(session.daily(), &report.thresholds)?;
                    let periods = detector.calculate_frequency_for(&flagged, timeframe);

                    if !json {
                        println!("\nFrequency by {}:", timeframe);
                        for row in &periods {
                            println!(
                                "  {:<22} {} flags",
                                timeframe.label(row.period_end),
                                row.counts.total()
                            );
                        }
                    }
                    if let Some(output) = &output {
                        csv_writer::write_period_frequency(output, &periods)?;
                    }
                }
                None => {
                    if let Some(output) = &output {
                        csv_writer::write_yearly_frequency(output, &report.yearly)?;
                    }
                }
            }
        }

        Commands::Score {
            database,
            output_file,
        } => {
            let session = open_session(&database)?;
            let output_file = output_file
                .unwrap_or_else(|| generate_default_scores_filename(&config.output.directory));

            let scorer = SuitabilityScorer::with_config(config.scoring.clone());
            let progress =
                ProgressReporter::new(session.daily().len() as u64, "Scoring days...", false);
            let scores = scorer.score_series_with_progress(session.daily(), &progress)?;

            csv_writer::write_scores(&output_file, &scores)?;
            println!("Event suitability scores saved to {}", output_file.display());

            print_scores(&scores, config.scoring.good_event_threshold);
        }

        Commands::Info { database } => {
            println!("Analyzing database: {}", database.display());

            let reader = SqliteReader::open(&database)?;
            let checker = IntegrityChecker::new();

            for cadence in [Cadence::Hourly, Cadence::Daily] {
                let table = cadence.table_name();
                if !reader.table_exists(table)? {
                    println!("\n{}: not present", table);
                    continue;
                }

                let series = match reader.read_series(cadence) {
                    Ok(series) => series,
                    Err(e) => {
                        warn!("Could not load {}: {}", table, e);
                        println!("\n{}: {} rows, unreadable ({})", table, reader.row_count(table)?, e);
                        continue;
                    }
                };

                println!("\n{}", SeriesSummary::from_series(&series).detailed_summary());

                let report = checker.check_integrity(&series)?;
                println!("{}", checker.generate_summary(&report));
            }
        }
    }

    Ok(())
}
