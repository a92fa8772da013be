//! Cross-image averaging of sweep results.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sweep::{ImageStat, QualityPoint};

/// One of the three series plotted per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurveKind {
    /// Structural similarity.
    Ssim,
    /// Peak signal-to-noise ratio.
    Psnr,
    /// Variant size in kilobytes.
    SizeKb,
}

impl CurveKind {
    /// All plotted series, in output order.
    #[must_use]
    pub fn all() -> [Self; 3] {
        [Self::Ssim, Self::Psnr, Self::SizeKb]
    }

    /// Human-readable label used in chart axes and file names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Ssim => "SSIM",
            Self::Psnr => "PSNR",
            Self::SizeKb => "size, kb",
        }
    }

    fn value(self, point: &QualityPoint) -> f64 {
        match self {
            Self::Ssim => point.ssim,
            Self::Psnr => point.psnr,
            Self::SizeKb => point.size_kb,
        }
    }
}

/// A series averaged across all retained images, ascending by level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedCurve {
    /// Which series this is.
    pub kind: CurveKind,
    /// (quality level, mean value) pairs.
    pub points: Vec<(u8, f64)>,
}

/// Average one series across every retained image, keyed by quality level.
///
/// The first image's level set defines the curve. Every retained image must
/// have swept exactly the same levels; a divergent set fails fast rather
/// than averaging around the gap. An empty input fails: there is nothing to
/// average.
pub fn average_curve(stats: &[ImageStat], kind: CurveKind) -> Result<AggregatedCurve> {
    let first = stats.first().ok_or(Error::EmptyAggregate)?;

    for stat in &stats[1..] {
        if !stat.quality.keys().eq(first.quality.keys()) {
            return Err(Error::QualityMismatch(format!(
                "{} swept {} levels, expected the {} levels of {}",
                stat.source.display(),
                stat.quality.len(),
                first.quality.len(),
                first.source.display(),
            )));
        }
    }

    let points = first
        .quality
        .keys()
        .map(|level| {
            let sum: f64 = stats.iter().map(|s| kind.value(&s.quality[level])).sum();
            (*level, sum / stats.len() as f64)
        })
        .collect();

    Ok(AggregatedCurve { kind, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn stat(name: &str, points: &[(u8, f64)]) -> ImageStat {
        let quality = points
            .iter()
            .map(|&(level, v)| {
                (
                    level,
                    QualityPoint {
                        ssim: v,
                        psnr: v * 10.0,
                        size_kb: v * 100.0,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        ImageStat {
            source: PathBuf::from(name),
            output_dir: PathBuf::from(name).with_extension(""),
            quality,
        }
    }

    #[test]
    fn test_average_over_two_images() {
        let stats = vec![
            stat("a.png", &[(10, 0.2), (20, 0.4)]),
            stat("b.png", &[(10, 0.4), (20, 0.8)]),
        ];

        let curve = average_curve(&stats, CurveKind::Ssim).unwrap();
        assert_eq!(curve.points, vec![(10, 0.3), (20, 0.6)]);

        let sizes = average_curve(&stats, CurveKind::SizeKb).unwrap();
        assert_eq!(sizes.points, vec![(10, 30.0), (20, 60.0)]);
    }

    #[test]
    fn test_points_ascend_by_level() {
        let stats = vec![stat("a.png", &[(90, 1.0), (5, 0.1), (40, 0.5)])];
        let curve = average_curve(&stats, CurveKind::Psnr).unwrap();
        let levels: Vec<u8> = curve.points.iter().map(|&(l, _)| l).collect();
        assert_eq!(levels, vec![5, 40, 90]);
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = average_curve(&[], CurveKind::Ssim).unwrap_err();
        assert!(matches!(err, Error::EmptyAggregate));
    }

    #[test]
    fn test_divergent_level_sets_rejected() {
        let stats = vec![
            stat("a.png", &[(10, 0.2), (20, 0.4)]),
            stat("b.png", &[(10, 0.4), (30, 0.8)]),
        ];
        let err = average_curve(&stats, CurveKind::Ssim).unwrap_err();
        assert!(matches!(err, Error::QualityMismatch(_)));
    }
}
