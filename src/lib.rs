//! # jpeg-sweep
//!
//! Quality-sweep measurement and aggregation for JPEG re-encoding.
//!
//! Re-encodes one or more source images at every quality level in a range,
//! measures objective fidelity loss (SSIM and PSNR, via an external ffmpeg
//! process) and output size per level, averages the results across images,
//! and renders the three curves as SVG chart artifacts.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jpeg_sweep::{
//!     average_curve, render_chart, sweep_all, ChartConfig, CurveKind, SweepConfig,
//!     SweepSession,
//! };
//!
//! let sources = jpeg_sweep::collect_sources("photos/".as_ref())?;
//! let session = SweepSession::new(SweepConfig::default());
//! let stats = sweep_all(&session, &sources);
//!
//! for kind in CurveKind::all() {
//!     let curve = average_curve(&stats, kind)?;
//!     render_chart(&curve.points, "photos/".as_ref(), &ChartConfig::new("photos", kind.label()))?;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`source`]: Source image discovery
//! - [`variant`]: Re-encoding across quality levels
//! - [`metric`]: Metric names, ffmpeg invocation, and output parsing
//! - [`pool`]: Order-preserving parallel task batches
//! - [`sweep`]: Per-image pipeline and multi-image runner
//! - [`aggregate`]: Cross-image curve averaging
//! - [`chart`]: Stem-plot SVG rendering
//! - [`report`]: JSON/CSV persistence of a run

pub mod aggregate;
pub mod chart;
pub mod error;
pub mod metric;
pub mod pool;
pub mod report;
pub mod source;
pub mod sweep;
pub mod variant;

// Re-export commonly used types
pub use aggregate::{AggregatedCurve, CurveKind, average_curve};
pub use chart::{ChartConfig, generate_svg, render_chart};
pub use error::{Error, Result};
pub use metric::{Comparator, FfmpegComparator, Metric};
pub use pool::{BelowNormal, KeepPriority, PriorityHook, WorkerPool};
pub use report::SweepReport;
pub use source::{SUPPORTED_EXTENSIONS, collect_sources};
pub use sweep::{ImageStat, QualityPoint, SweepConfig, SweepSession, sweep_all};
pub use variant::{DEFAULT_QUALITY_RANGE, VariantFile, generate_variants, output_dir_for};
