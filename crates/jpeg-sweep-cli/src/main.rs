//! jpeg-sweep CLI - quality/size curve graphing for JPEG re-encoding.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use clap::Parser;
use jpeg_sweep::{
    ChartConfig, CurveKind, SweepConfig, SweepReport, SweepSession, average_curve,
    collect_sources, render_chart, sweep_all,
};

/// Graphs objective quality (SSIM/PSNR) and file size against the JPEG
/// quality setting. Requires ffmpeg on PATH.
#[derive(Parser)]
#[command(name = "jpeg-sweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source image, or a directory of images to average across
    source: PathBuf,

    /// Keep the directory of generated JPEG variants
    #[arg(short, long)]
    store: bool,

    /// Label the highlighted stems' values on the Y axis
    #[arg(short = 'p', long)]
    label_highlighted: bool,

    /// Quality levels as start,end[,step]
    #[arg(short, long, default_value = "1,100")]
    quality_range: String,
}

fn parse_quality_range(spec: &str) -> anyhow::Result<Vec<u8>> {
    let parts: Vec<u8> = spec
        .split(',')
        .map(|s| {
            s.trim()
                .parse()
                .with_context(|| format!("bad quality range component {s:?}"))
        })
        .collect::<anyhow::Result<_>>()?;

    let (start, end, step) = match parts.as_slice() {
        [start, end] => (*start, *end, 1),
        [start, end, step] => (*start, *end, *step),
        _ => bail!("quality range must be start,end or start,end,step"),
    };

    if start < 1 || end > 100 || start > end || step < 1 {
        bail!("quality range {spec:?} is outside 1..=100");
    }

    Ok((start..=end).step_by(usize::from(step)).collect())
}

/// Charts and reports are saved beside the source: next to a source file,
/// or next to the source directory, named after it.
fn subject_of(input: &Path) -> anyhow::Result<(PathBuf, String)> {
    let abs = fs::canonicalize(input)?;
    let dest = abs
        .parent()
        .map(Path::to_path_buf)
        .context("source path has no parent directory")?;

    let name = if abs.is_dir() {
        abs.file_name()
            .context("source directory has no name")?
            .to_string_lossy()
            .into_owned()
    } else {
        abs.file_stem()
            .context("source file has no name")?
            .to_string_lossy()
            .into_owned()
    };

    Ok((dest, name))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let start = Instant::now();

    let levels = parse_quality_range(&cli.quality_range)?;
    let sources = collect_sources(&cli.source)?;
    if sources.is_empty() {
        bail!("no supported images in {}", cli.source.display());
    }

    println!(
        "jpeg-sweep -- {} image(s), {} quality level(s)\n",
        sources.len(),
        levels.len()
    );

    let config = SweepConfig::new(levels).with_retain_variants(cli.store);
    let session = SweepSession::new(config);
    let stats = sweep_all(&session, &sources);

    let (dest_dir, subject) = subject_of(&cli.source)?;

    println!("\ndrawing graphs...");
    let mut curves = Vec::new();
    for kind in CurveKind::all() {
        let curve = average_curve(&stats, kind)?;
        let chart_config = ChartConfig::new(&subject, kind.label())
            .with_label_highlighted(cli.label_highlighted);
        let path = render_chart(&curve.points, &dest_dir, &chart_config)?;
        println!("  {}", path.display());
        curves.push(curve);
    }

    let report = SweepReport::new(&subject, stats, curves);
    println!("  {}", report.write_json(&dest_dir)?.display());
    println!("  {}", report.write_csv(&dest_dir)?.display());

    println!("\nfinished in {:.1?}", start.elapsed());
    Ok(())
}
