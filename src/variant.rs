//! Re-encoding of a source image across quality levels.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;

use crate::error::{Error, Result};
use crate::pool::WorkerPool;

/// Full quality range of the JPEG encoder.
pub const DEFAULT_QUALITY_RANGE: std::ops::RangeInclusive<u8> = 1..=100;

/// One re-encoded output, identified by its quality level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantFile {
    /// Encoder quality setting used for this variant.
    pub quality: u8,
    /// Where the variant was written.
    pub path: PathBuf,
}

impl VariantFile {
    /// Size of the variant on disk, in kilobytes.
    pub fn size_kb(&self) -> Result<f64> {
        let len = fs::metadata(&self.path)?.len();
        Ok(len as f64 / 1024.0)
    }
}

/// Directory that holds one source image's variants: the source path with
/// its extension stripped.
#[must_use]
pub fn output_dir_for(source: &Path) -> PathBuf {
    source.with_extension("")
}

/// Re-encode `source` once per quality level into `dir`.
///
/// The source is decoded a single time and converted to RGB before
/// encoding; it is never mutated. Each variant is written to
/// `<dir>/<quality>.jpeg`, so sibling tasks cannot collide. The levels are
/// embarrassingly parallel and run as one coordinator batch; any decode or
/// encode failure aborts the batch.
pub fn generate_variants(
    source: &Path,
    dir: &Path,
    levels: &[u8],
    pool: &WorkerPool,
) -> Result<Vec<VariantFile>> {
    let rgb = image::open(source)
        .map_err(|e| Error::Generation {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?
        .to_rgb8();

    fs::create_dir_all(dir)?;

    pool.run(levels.to_vec(), |quality| encode_variant(&rgb, quality, dir))
}

fn encode_variant(rgb: &RgbImage, quality: u8, dir: &Path) -> Result<VariantFile> {
    let path = dir.join(format!("{quality}.jpeg"));
    let file = fs::File::create(&path)?;
    let mut writer = BufWriter::new(file);

    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(rgb)
        .map_err(|e| Error::Generation {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    Ok(VariantFile { quality, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn write_test_png(dir: &Path) -> PathBuf {
        let path = dir.join("source.png");
        let img = RgbImage::from_fn(32, 24, |x, y| {
            image::Rgb([(x * 8) as u8, (y * 10) as u8, ((x + y) * 4) as u8])
        });
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_one_variant_per_level_no_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_test_png(tmp.path());
        let out = tmp.path().join("variants");
        let levels: Vec<u8> = (1..=20).collect();

        let variants =
            generate_variants(&source, &out, &levels, &WorkerPool::new()).unwrap();

        assert_eq!(variants.len(), 20);
        let qualities: HashSet<u8> = variants.iter().map(|v| v.quality).collect();
        assert_eq!(qualities.len(), 20);
        for v in &variants {
            assert!(v.path.is_file());
            assert!(v.size_kb().unwrap() > 0.0);
        }
        assert_eq!(fs::read_dir(&out).unwrap().count(), 20);
    }

    #[test]
    fn test_variants_keep_submission_order() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_test_png(tmp.path());
        let out = tmp.path().join("variants");
        let levels = [40u8, 10, 90, 60];

        let variants =
            generate_variants(&source, &out, &levels, &WorkerPool::new()).unwrap();
        let got: Vec<u8> = variants.iter().map(|v| v.quality).collect();
        assert_eq!(got, levels);
    }

    #[test]
    fn test_unreadable_source_is_generation_error() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("garbage.png");
        fs::write(&source, b"not an image at all").unwrap();

        let err = generate_variants(
            &source,
            &tmp.path().join("variants"),
            &[50],
            &WorkerPool::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Generation { .. }));
    }

    #[test]
    fn test_output_dir_strips_extension() {
        assert_eq!(
            output_dir_for(Path::new("/data/photo.png")),
            PathBuf::from("/data/photo")
        );
    }
}
