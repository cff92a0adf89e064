use crate::error::Result;
use crate::models::{ExtremeEvent, PeriodFrequency, ScoreRecord, ScoreTable, YearlyFrequency};
use std::fs;
use std::path::Path;
use tracing::info;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write the score table as `date,score`
pub fn write_scores(path: &Path, scores: &ScoreTable) -> Result<()> {
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    for record in &scores.records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Wrote {} scores to {}", scores.len(), path.display());
    Ok(())
}

pub fn read_scores(path: &Path) -> Result<ScoreTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize::<ScoreRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ScoreTable::from_records(records))
}

/// Write yearly flag counts as `year,extreme_high_temp,...`
pub fn write_yearly_frequency(path: &Path, yearly: &[YearlyFrequency]) -> Result<()> {
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["year"];
    header.extend(ExtremeEvent::ALL.iter().map(|e| e.column_name()));
    writer.write_record(&header)?;

    for row in yearly {
        let mut record = vec![row.year.to_string()];
        record.extend(ExtremeEvent::ALL.iter().map(|e| row.counts.get(*e).to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!("Wrote {} yearly frequency rows to {}", yearly.len(), path.display());
    Ok(())
}

/// Write per-period flag counts as `period_end,extreme_high_temp,...`
pub fn write_period_frequency(path: &Path, periods: &[PeriodFrequency]) -> Result<()> {
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["period_end"];
    header.extend(ExtremeEvent::ALL.iter().map(|e| e.column_name()));
    writer.write_record(&header)?;

    for row in periods {
        let mut record = vec![row.period_end.to_string()];
        record.extend(ExtremeEvent::ALL.iter().map(|e| row.counts.get(*e).to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!("Wrote {} frequency rows to {}", periods.len(), path.display());
    Ok(())
}
