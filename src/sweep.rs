//! Per-image sweep pipeline.
//!
//! One [`SweepSession`] drives the whole measurement for a source image:
//! generate variants across the quality range, measure SSIM and PSNR for
//! each variant against the original, collect sizes, and assemble the
//! per-level results. Each stage is a separate coordinator batch; tasks
//! carry their quality level explicitly, and assembly joins the series by
//! that key. A failure anywhere marks the image as failed without aborting
//! a multi-image run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metric::{Comparator, FfmpegComparator, Metric};
use crate::pool::WorkerPool;
use crate::variant::{self, VariantFile, generate_variants, output_dir_for};

/// Configuration for a sweep run.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Quality levels to sweep, unique per run.
    pub quality_levels: Vec<u8>,
    /// Keep the generated variant directory after the run.
    pub retain_variants: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            quality_levels: variant::DEFAULT_QUALITY_RANGE.collect(),
            retain_variants: false,
        }
    }
}

impl SweepConfig {
    /// Configuration sweeping the given levels.
    #[must_use]
    pub fn new(quality_levels: Vec<u8>) -> Self {
        Self {
            quality_levels,
            ..Default::default()
        }
    }

    /// Sets whether the variant directory survives the run.
    #[must_use]
    pub fn with_retain_variants(mut self, retain: bool) -> Self {
        self.retain_variants = retain;
        self
    }
}

/// Measured values for one quality level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityPoint {
    /// Structural similarity against the source.
    pub ssim: f64,
    /// Peak signal-to-noise ratio against the source, in dB.
    pub psnr: f64,
    /// Variant size on disk, in kilobytes.
    pub size_kb: f64,
}

/// Result of sweeping one source image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageStat {
    /// The source image.
    pub source: PathBuf,
    /// Directory the variants were written to.
    pub output_dir: PathBuf,
    /// Measured values keyed by quality level, ascending.
    pub quality: BTreeMap<u8, QualityPoint>,
}

/// Sweep driver holding the configuration, comparison backend, and worker
/// pool.
pub struct SweepSession {
    config: SweepConfig,
    comparator: Box<dyn Comparator>,
    pool: WorkerPool,
}

impl SweepSession {
    /// Session comparing through ffmpeg on `PATH`.
    #[must_use]
    pub fn new(config: SweepConfig) -> Self {
        Self::with_comparator(config, Box::new(FfmpegComparator::default()))
    }

    /// Session with a custom comparison backend.
    #[must_use]
    pub fn with_comparator(config: SweepConfig, comparator: Box<dyn Comparator>) -> Self {
        Self {
            config,
            comparator,
            pool: WorkerPool::new(),
        }
    }

    /// Swept quality levels.
    #[must_use]
    pub fn quality_levels(&self) -> &[u8] {
        &self.config.quality_levels
    }

    /// Run the full pipeline for one source image.
    ///
    /// On completion, success or failure, the variant directory is deleted
    /// unless retention was requested; deletion errors are ignored.
    pub fn sweep_image(&self, source: &Path) -> Result<ImageStat> {
        let dir = output_dir_for(source);
        let result = self.run_pipeline(source, &dir);

        if !self.config.retain_variants {
            let _ = fs::remove_dir_all(&dir);
        }

        result
    }

    fn run_pipeline(&self, source: &Path, dir: &Path) -> Result<ImageStat> {
        eprintln!("  generating jpeg variants...");
        let variants = generate_variants(source, dir, &self.config.quality_levels, &self.pool)?;

        eprintln!("  measuring SSIM...");
        let ssim = self.measure(source, &variants, Metric::Ssim)?;

        eprintln!("  measuring PSNR...");
        let psnr = self.measure(source, &variants, Metric::Psnr)?;

        let quality = assemble(&variants, &ssim, &psnr)?;

        Ok(ImageStat {
            source: source.to_path_buf(),
            output_dir: dir.to_path_buf(),
            quality,
        })
    }

    /// One metric batch: every variant against the original source, each
    /// task returning its quality level alongside the value.
    fn measure(
        &self,
        source: &Path,
        variants: &[VariantFile],
        metric: Metric,
    ) -> Result<BTreeMap<u8, f64>> {
        let inputs: Vec<(u8, PathBuf)> = variants
            .iter()
            .map(|v| (v.quality, v.path.clone()))
            .collect();

        let scores = self.pool.run(inputs, |(quality, path)| {
            self.comparator
                .compare(source, &path, metric)
                .map(|value| (quality, value))
        })?;

        Ok(scores.into_iter().collect())
    }
}

/// Join the generated variants with both metric series by quality level and
/// attach each variant's on-disk size.
fn assemble(
    variants: &[VariantFile],
    ssim: &BTreeMap<u8, f64>,
    psnr: &BTreeMap<u8, f64>,
) -> Result<BTreeMap<u8, QualityPoint>> {
    let mut quality = BTreeMap::new();

    for v in variants {
        let ssim = *ssim
            .get(&v.quality)
            .ok_or_else(|| Error::Assembly(format!("no SSIM value for quality {}", v.quality)))?;
        let psnr = *psnr
            .get(&v.quality)
            .ok_or_else(|| Error::Assembly(format!("no PSNR value for quality {}", v.quality)))?;
        let point = QualityPoint {
            ssim,
            psnr,
            size_kb: v.size_kb()?,
        };

        if quality.insert(v.quality, point).is_some() {
            return Err(Error::Assembly(format!(
                "duplicate quality level {}",
                v.quality
            )));
        }
    }

    if quality.is_empty() {
        return Err(Error::Assembly("no variants were produced".to_string()));
    }

    Ok(quality)
}

/// Sweep every source sequentially, skipping images whose pipeline fails.
///
/// Returns the stats of the images that succeeded; failures are reported on
/// stderr and do not abort the run.
pub fn sweep_all(session: &SweepSession, sources: &[PathBuf]) -> Vec<ImageStat> {
    let mut stats = Vec::new();

    for (i, source) in sources.iter().enumerate() {
        if sources.len() > 1 {
            let name = source
                .file_name()
                .map_or_else(|| source.display().to_string(), |n| {
                    n.to_string_lossy().into_owned()
                });
            eprintln!("{} of {}: {}", i + 1, sources.len(), name);
        }

        match session.sweep_image(source) {
            Ok(stat) => stats.push(stat),
            Err(e) => eprintln!("  image skipped: {e}"),
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// Comparator returning a deterministic value derived from the quality
    /// level encoded in the candidate's filename.
    struct FakeComparator;

    impl Comparator for FakeComparator {
        fn compare(&self, _reference: &Path, candidate: &Path, metric: Metric) -> Result<f64> {
            let quality: f64 = candidate
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0);
            match metric {
                Metric::Ssim => Ok(quality / 100.0),
                Metric::Psnr => Ok(20.0 + quality),
            }
        }
    }

    /// Comparator that always fails parsing, as if the tool output changed.
    struct BrokenComparator;

    impl Comparator for BrokenComparator {
        fn compare(&self, _: &Path, _: &Path, metric: Metric) -> Result<f64> {
            Err(Error::MetricParse {
                metric: metric.to_string(),
                reason: "signature not found".to_string(),
            })
        }
    }

    fn write_test_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_fn(16, 16, |x, y| image::Rgb([x as u8 * 16, y as u8 * 16, 128]));
        img.save(&path).unwrap();
        path
    }

    fn test_session(levels: Vec<u8>) -> SweepSession {
        SweepSession::with_comparator(SweepConfig::new(levels), Box::new(FakeComparator))
    }

    #[test]
    fn test_sweep_assembles_every_level() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_test_png(tmp.path(), "img.png");

        let session = test_session(vec![10, 20, 30]);
        let stat = session.sweep_image(&source).unwrap();

        assert_eq!(stat.quality.len(), 3);
        let p20 = &stat.quality[&20];
        assert!((p20.ssim - 0.2).abs() < 1e-9);
        assert!((p20.psnr - 40.0).abs() < 1e-9);
        assert!(p20.size_kb > 0.0);
    }

    #[test]
    fn test_variant_dir_removed_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_test_png(tmp.path(), "img.png");

        let session = test_session(vec![50]);
        let stat = session.sweep_image(&source).unwrap();
        assert!(!stat.output_dir.exists());
    }

    #[test]
    fn test_variant_dir_retained_on_request() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_test_png(tmp.path(), "img.png");

        let config = SweepConfig::new(vec![50]).with_retain_variants(true);
        let session = SweepSession::with_comparator(config, Box::new(FakeComparator));
        let stat = session.sweep_image(&source).unwrap();
        assert!(stat.output_dir.join("50.jpeg").is_file());
    }

    #[test]
    fn test_metric_failure_fails_image_and_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_test_png(tmp.path(), "img.png");

        let session = SweepSession::with_comparator(
            SweepConfig::new(vec![10, 20]),
            Box::new(BrokenComparator),
        );
        let err = session.sweep_image(&source).unwrap_err();
        assert!(matches!(err, Error::MetricParse { .. }));
        assert!(!output_dir_for(&source).exists());
    }

    #[test]
    fn test_failed_image_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let good1 = write_test_png(tmp.path(), "a.png");
        let bad = tmp.path().join("b.png");
        fs::write(&bad, b"definitely not a png").unwrap();
        let good2 = write_test_png(tmp.path(), "c.png");

        let session = test_session(vec![25, 75]);
        let stats = sweep_all(&session, &[good1, bad, good2]);

        assert_eq!(stats.len(), 2);
        assert!(stats.iter().all(|s| s.quality.len() == 2));
    }

    #[test]
    fn test_assemble_rejects_missing_key() {
        let variants = vec![VariantFile {
            quality: 10,
            path: PathBuf::from("/nonexistent/10.jpeg"),
        }];
        let ssim = BTreeMap::new();
        let psnr = BTreeMap::from([(10, 30.0)]);

        let err = assemble(&variants, &ssim, &psnr).unwrap_err();
        assert!(matches!(err, Error::Assembly(_)));
    }

    #[test]
    fn test_assemble_rejects_empty() {
        let err = assemble(&[], &BTreeMap::new(), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Error::Assembly(_)));
    }
}
