use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::stats;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub date: NaiveDate,
    pub score: f64,
}

impl ScoreRecord {
    pub fn new(date: NaiveDate, score: f64) -> Self {
        Self { date, score }
    }
}

/// Per-day suitability scores plus bookkeeping about the rows left out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    pub records: Vec<ScoreRecord>,
    pub skipped_rows: usize,
    pub failed_rows: usize,
}

impl ScoreTable {
    pub fn from_records(records: Vec<ScoreRecord>) -> Self {
        Self {
            records,
            skipped_rows: 0,
            failed_rows: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn scores(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.score).collect()
    }

    /// Descriptive statistics; `None` for an empty table
    pub fn describe(&self) -> Option<ScoreSummary> {
        if self.records.is_empty() {
            return None;
        }

        let mut scores = self.scores();
        scores.sort_by(|a, b| a.total_cmp(b));

        Some(ScoreSummary {
            count: scores.len(),
            mean: stats::mean(&scores),
            std: stats::sample_std(&scores),
            min: scores[0],
            q25: stats::quantile_sorted(&scores, 0.25),
            median: stats::quantile_sorted(&scores, 0.5),
            q75: stats::quantile_sorted(&scores, 0.75),
            max: scores[scores.len() - 1],
        })
    }

    /// Mean score per calendar month (1-12), across all years
    pub fn monthly_averages(&self) -> BTreeMap<u32, f64> {
        let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for record in &self.records {
            by_month
                .entry(record.date.month())
                .or_default()
                .push(record.score);
        }

        by_month
            .into_iter()
            .map(|(month, scores)| (month, stats::mean(&scores)))
            .collect()
    }

    pub fn good_days(&self, threshold: f64) -> usize {
        self.records.iter().filter(|r| r.score >= threshold).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ScoreSummary {
    pub fn summary(&self) -> String {
        format!(
            "Descriptive statistics for event suitability scores:\n\
            - count: {}\n\
            - mean:  {:.2}\n\
            - std:   {:.2}\n\
            - min:   {:.2}\n\
            - 25%:   {:.2}\n\
            - 50%:   {:.2}\n\
            - 75%:   {:.2}\n\
            - max:   {:.2}",
            self.count,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max
        )
    }
}
