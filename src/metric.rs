//! Objective quality metrics computed by an external comparison tool.
//!
//! The tool of record is ffmpeg: `ssim` and `psnr` filters write per-frame
//! statistics to a null sink with `stats_file=-`, and the aggregate value is
//! extracted from the combined output stream by a metric-specific textual
//! signature. The report format is a hard external dependency; a missing
//! signature is a [`Error::MetricParse`], never a silent default.

use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static SSIM_ALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bAll:(\d+(?:\.\d+)?)").expect("Invalid SSIM regex"));

static PSNR_AVG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bpsnr_avg:(inf|[-+]?[0-9]*\.?[0-9]+)").expect("Invalid PSNR regex")
});

/// Objective quality metric reported by the comparison tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Structural similarity index (1.0 = identical).
    Ssim,
    /// Peak signal-to-noise ratio in dB (infinite for identical images).
    Psnr,
}

impl Metric {
    /// Both supported metrics, in measurement order.
    #[must_use]
    pub fn all() -> [Self; 2] {
        [Self::Ssim, Self::Psnr]
    }

    /// Name of the comparison tool's filter for this metric.
    #[must_use]
    pub fn filter_name(self) -> &'static str {
        match self {
            Self::Ssim => "ssim",
            Self::Psnr => "psnr",
        }
    }

    /// Extract this metric's aggregate value from the tool's output.
    ///
    /// SSIM is reported as `All:<value>`; PSNR as `psnr_avg:<value>`, where
    /// identical inputs yield `psnr_avg:inf`.
    pub fn parse_stats(self, output: &str) -> Result<f64> {
        let captures = match self {
            Self::Ssim => SSIM_ALL.captures(output),
            Self::Psnr => PSNR_AVG.captures(output),
        };

        let Some(captures) = captures else {
            return Err(Error::MetricParse {
                metric: self.to_string(),
                reason: format!("expected signature not found in {} bytes", output.len()),
            });
        };

        let value = &captures[1];
        if value == "inf" {
            return Ok(f64::INFINITY);
        }
        value.parse().map_err(|_| Error::MetricParse {
            metric: self.to_string(),
            reason: format!("unreadable value {value:?}"),
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ssim => write!(f, "SSIM"),
            Self::Psnr => write!(f, "PSNR"),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("ssim") {
            Ok(Self::Ssim)
        } else if s.eq_ignore_ascii_case("psnr") {
            Ok(Self::Psnr)
        } else {
            Err(Error::UnsupportedMetric(s.to_string()))
        }
    }
}

/// Computes one metric value for a (reference, candidate) pair.
///
/// The production implementation shells out to ffmpeg; tests substitute
/// in-process fakes.
pub trait Comparator: Send + Sync {
    /// Compare `candidate` against `reference`, returning the metric value.
    fn compare(&self, reference: &Path, candidate: &Path, metric: Metric) -> Result<f64>;
}

/// [`Comparator`] backed by an ffmpeg subprocess.
#[derive(Debug, Clone)]
pub struct FfmpegComparator {
    program: String,
}

impl Default for FfmpegComparator {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }
}

impl FfmpegComparator {
    /// Use a specific ffmpeg executable instead of resolving from `PATH`.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Comparator for FfmpegComparator {
    fn compare(&self, reference: &Path, candidate: &Path, metric: Metric) -> Result<f64> {
        let filter = format!("{}=stats_file=-", metric.filter_name());
        let output = Command::new(&self.program)
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(reference)
            .arg("-i")
            .arg(candidate)
            .args(["-filter_complex", &filter, "-f", "null", "-"])
            .output()
            .map_err(|e| Error::ComparisonTool(format!("failed to run {}: {e}", self.program)))?;

        // The per-frame stats land on stdout, diagnostics on stderr; parse
        // the combined stream so a format change surfaces as MetricParse.
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        metric.parse_stats(&combined)
    }
}
