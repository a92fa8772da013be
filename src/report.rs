//! Persistence of a finished sweep run.
//!
//! One run produces a JSON report (per-image stats plus the averaged
//! curves) and a CSV table of the averaged series, both named from the
//! sweep subject and written beside the chart artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregatedCurve;
use crate::error::{Error, Result};
use crate::sweep::ImageStat;

/// Everything measured and derived in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Sweep subject (image or directory name).
    pub subject: String,
    /// When the run finished.
    pub created_at: DateTime<Utc>,
    /// Stats of every successfully processed image.
    pub images: Vec<ImageStat>,
    /// The averaged series, one per [`crate::aggregate::CurveKind`].
    pub curves: Vec<AggregatedCurve>,
}

impl SweepReport {
    /// Assemble a report stamped with the current time.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        images: Vec<ImageStat>,
        curves: Vec<AggregatedCurve>,
    ) -> Self {
        Self {
            subject: subject.into(),
            created_at: Utc::now(),
            images,
            curves,
        }
    }

    /// Write the full report as pretty JSON, returning the path.
    pub fn write_json(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{} - sweep.json", self.subject));
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Write the averaged series as one CSV table, returning the path.
    ///
    /// All curves share the aggregator's level set, so each row is one
    /// quality level across every series.
    pub fn write_csv(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{} - sweep.csv", self.subject));
        let mut wtr = csv::Writer::from_path(&path)?;

        let mut header = vec!["quality".to_string()];
        header.extend(self.curves.iter().map(|c| c.kind.label().to_string()));
        wtr.write_record(&header)?;

        let rows = self.curves.first().map_or(0, |c| c.points.len());
        for i in 0..rows {
            let mut record = vec![self.curves[0].points[i].0.to_string()];
            for curve in &self.curves {
                let (level, value) = curve.points.get(i).ok_or_else(|| {
                    Error::QualityMismatch(format!(
                        "curve {} has {} points, expected {rows}",
                        curve.kind.label(),
                        curve.points.len()
                    ))
                })?;
                if *level != self.curves[0].points[i].0 {
                    return Err(Error::QualityMismatch(format!(
                        "curve {} lists quality {level} where {} was expected",
                        curve.kind.label(),
                        self.curves[0].points[i].0
                    )));
                }
                record.push(format!("{value:.6}"));
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(path)
    }
}
