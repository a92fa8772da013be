//! SVG chart generation for quality sweep curves.
//!
//! Renders one averaged (quality level, value) series as a stem plot:
//! every fifth level is highlighted in a distinct color, the rest stay
//! neutral, and a scatter overlay marks every point. Charts support light
//! and dark mode via CSS media queries. Each call is stateless and
//! produces one artifact.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Levels divisible by this step are highlighted and drive the X tick grid.
pub const HIGHLIGHT_STEP: u8 = 5;

/// Chart configuration.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Sweep subject (image or directory name), used in the file name.
    pub subject: String,
    /// Label of the plotted series, used in the file name and Y axis.
    pub metric_label: String,
    /// X-axis label.
    pub x_label: String,
    /// Label the highlighted points' own values on the Y axis instead of an
    /// evenly spaced scale.
    pub label_highlighted: bool,
    /// Chart width in pixels.
    pub width: u32,
    /// Chart height in pixels.
    pub height: u32,
}

impl ChartConfig {
    /// Creates a configuration for the given subject and series label.
    #[must_use]
    pub fn new(subject: impl Into<String>, metric_label: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            metric_label: metric_label.into(),
            x_label: "jpeg quality, %".to_string(),
            label_highlighted: false,
            width: 800,
            height: 800,
        }
    }

    /// Sets the X-axis label.
    #[must_use]
    pub fn with_x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    /// Sets the Y-axis labeling policy.
    #[must_use]
    pub fn with_label_highlighted(mut self, label_highlighted: bool) -> Self {
        self.label_highlighted = label_highlighted;
        self
    }

    /// File name of the rendered artifact.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{} - {} graph.svg", self.subject, self.metric_label)
    }
}

/// Split a series into the highlighted subset (level divisible by
/// [`HIGHLIGHT_STEP`]) and the remainder.
#[must_use]
pub fn partition_highlighted(points: &[(u8, f64)]) -> (Vec<(u8, f64)>, Vec<(u8, f64)>) {
    points
        .iter()
        .copied()
        .partition(|&(level, _)| level % HIGHLIGHT_STEP == 0)
}

/// Generates an SVG stem plot from the given series.
///
/// Returns an empty string for an empty series.
#[must_use]
pub fn generate_svg(points: &[(u8, f64)], config: &ChartConfig) -> String {
    if points.is_empty() {
        return String::new();
    }

    let (highlighted, rest) = partition_highlighted(points);

    let mut levels: Vec<u8> = points.iter().map(|&(l, _)| l).collect();
    levels.sort_unstable();
    let min_level = levels[0];
    let max_level = levels[levels.len() - 1];
    let sweep_step = if levels.len() > 1 {
        levels[1] - levels[0]
    } else {
        1
    };

    let min_y = points.iter().map(|&(_, v)| v).fold(f64::INFINITY, f64::min);
    let max_y = points
        .iter()
        .map(|&(_, v)| v)
        .fold(f64::NEG_INFINITY, f64::max);
    // Degenerate flat series still needs a nonzero Y span to scale into.
    let (min_y, max_y) = if max_y > min_y {
        (min_y, max_y)
    } else {
        (min_y - 0.5, max_y + 0.5)
    };

    // Axis padded by one sweep-step on each side.
    let min_x = f64::from(min_level) - f64::from(sweep_step);
    let max_x = f64::from(max_level) + f64::from(sweep_step);

    let width = config.width;
    let height = config.height;
    let margin_top = 40;
    let margin_right = 40;
    let margin_bottom = 70;
    let margin_left = 90;
    let plot_width = width - margin_left - margin_right;
    let plot_height = height - margin_top - margin_bottom;
    let plot_bottom = height - margin_bottom;

    let scale_x = |v: f64| -> f64 {
        f64::from(margin_left) + (v - min_x) / (max_x - min_x) * f64::from(plot_width)
    };
    let scale_y = |v: f64| -> f64 {
        f64::from(margin_top) + (1.0 - (v - min_y) / (max_y - min_y)) * f64::from(plot_height)
    };

    let mut svg = String::with_capacity(16384);

    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}">"#,
        width, height
    );

    // CSS with dark mode support
    svg.push_str(
        r#"<style>
  :root {
    --bg-color: #ffffff;
    --text-color: #1a1a1a;
    --axis-color: #333333;
    --stem-color: #1a1a1a;
  }
  @media (prefers-color-scheme: dark) {
    :root {
      --bg-color: #1a1a1a;
      --text-color: #e0e0e0;
      --axis-color: #b0b0b0;
      --stem-color: #e0e0e0;
    }
  }
  .background { fill: var(--bg-color); }
  .title { font: bold 16px system-ui, sans-serif; fill: var(--text-color); }
  .axis-label { font: 13px system-ui, sans-serif; fill: var(--text-color); }
  .tick-label { font: 11px system-ui, sans-serif; fill: var(--text-color); }
  .axis { stroke: var(--axis-color); stroke-width: 1.5; }
  .stem { stroke: var(--stem-color); stroke-width: 0.5; }
  .stem-highlight { stroke: #ff00ff; stroke-width: 0.5; }
  .dot { fill: #e74c3c; }
</style>
"#,
    );

    let _ = writeln!(
        svg,
        r#"<rect class="background" width="{}" height="{}"/>"#,
        width, height
    );

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="25" text-anchor="middle" class="title">{} - {}</text>"#,
        f64::from(width) / 2.0,
        config.subject,
        config.metric_label
    );

    // Axes
    let _ = writeln!(
        svg,
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>"#,
        margin_left,
        plot_bottom,
        width - margin_right,
        plot_bottom
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>"#,
        margin_left, margin_top, margin_left, plot_bottom
    );

    // X ticks every HIGHLIGHT_STEP levels across the observed range.
    let mut tick = min_level;
    while tick <= max_level {
        let x = scale_x(f64::from(tick));
        let _ = writeln!(
            svg,
            r#"<line x1="{x:.2}" y1="{}" x2="{x:.2}" y2="{}" class="axis"/>"#,
            plot_bottom,
            plot_bottom + 5
        );
        let _ = writeln!(
            svg,
            r#"<text x="{x:.2}" y="{}" text-anchor="middle" class="tick-label">{tick}</text>"#,
            plot_bottom + 20
        );
        match tick.checked_add(HIGHLIGHT_STEP) {
            Some(next) => tick = next,
            None => break,
        }
    }

    // Y ticks: either the highlighted points' own values, or 24 evenly
    // spaced values plus the observed maximum.
    let y_ticks: Vec<f64> = if config.label_highlighted {
        highlighted.iter().map(|&(_, v)| v).collect()
    } else {
        let mut ticks: Vec<f64> = (0..24)
            .map(|i| min_y + f64::from(i) * (max_y - min_y) / 24.0)
            .collect();
        ticks.push(max_y);
        ticks
    };

    for value in y_ticks {
        let y = scale_y(value);
        let _ = writeln!(
            svg,
            r#"<line x1="{}" y1="{y:.2}" x2="{}" y2="{y:.2}" class="axis"/>"#,
            margin_left - 5,
            margin_left
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{:.2}" text-anchor="end" class="tick-label">{}</text>"#,
            margin_left - 10,
            y + 4.0,
            format_tick(value)
        );
    }

    // Axis labels
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" class="axis-label">{}</text>"#,
        f64::from(width) / 2.0,
        height - 20,
        config.x_label
    );
    let _ = writeln!(
        svg,
        r#"<text x="25" y="{0}" text-anchor="middle" class="axis-label" transform="rotate(-90 25 {0})">{1}</text>"#,
        f64::from(height) / 2.0,
        config.metric_label
    );

    // Stems rise from the axis floor to each value, neutral first so the
    // highlighted ones stay visible on overlap.
    for (class, subset) in [("stem", &rest), ("stem-highlight", &highlighted)] {
        for &(level, value) in subset {
            let x = scale_x(f64::from(level));
            let _ = writeln!(
                svg,
                r#"<line x1="{x:.2}" y1="{}" x2="{x:.2}" y2="{:.2}" class="{class}"/>"#,
                plot_bottom,
                scale_y(value)
            );
        }
    }

    // Scatter overlay of all points.
    for &(level, value) in points {
        let _ = writeln!(
            svg,
            r#"<circle cx="{:.2}" cy="{:.2}" r="3" class="dot"/>"#,
            scale_x(f64::from(level)),
            scale_y(value)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn format_tick(value: f64) -> String {
    if value.abs() < 0.0001 {
        format!("{:.6}", value)
    } else if value.abs() < 0.1 {
        format!("{:.4}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Renders the series and writes the artifact into `dest_dir`, overwriting
/// any previous run's output.
pub fn render_chart(points: &[(u8, f64)], dest_dir: &Path, config: &ChartConfig) -> Result<PathBuf> {
    let path = dest_dir.join(config.file_name());
    fs::write(&path, generate_svg(points, config))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(levels: std::ops::RangeInclusive<u8>) -> Vec<(u8, f64)> {
        levels.map(|l| (l, f64::from(l) / 100.0)).collect()
    }

    #[test]
    fn test_highlight_partition() {
        let (highlighted, rest) = partition_highlighted(&series(1..=20));
        let levels: Vec<u8> = highlighted.iter().map(|&(l, _)| l).collect();
        assert_eq!(levels, vec![5, 10, 15, 20]);
        assert_eq!(rest.len(), 16);
        assert!(rest.iter().all(|(l, _)| l % 5 != 0));
    }

    #[test]
    fn test_generate_svg_basic() {
        let config = ChartConfig::new("lena", "SSIM");
        let svg = generate_svg(&series(1..=100), &config);

        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
        assert!(svg.contains("lena - SSIM"));
        assert!(svg.contains("stem-highlight"));
        assert!(svg.contains("jpeg quality, %"));
    }

    #[test]
    fn test_empty_series() {
        let config = ChartConfig::new("lena", "SSIM");
        assert!(generate_svg(&[], &config).is_empty());
    }

    #[test]
    fn test_single_point_series() {
        let config = ChartConfig::new("lena", "PSNR");
        let svg = generate_svg(&[(50, 33.0)], &config);
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_artifact_name_is_deterministic() {
        let config = ChartConfig::new("holiday photos", "size, kb");
        assert_eq!(config.file_name(), "holiday photos - size, kb graph.svg");
    }

    #[test]
    fn test_render_chart_writes_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ChartConfig::new("img", "PSNR");

        let first = render_chart(&series(1..=10), tmp.path(), &config).unwrap();
        let second = render_chart(&series(1..=20), tmp.path(), &config).unwrap();
        assert_eq!(first, second);
        assert!(fs::read_to_string(&second).unwrap().contains("<svg"));
    }

    #[test]
    fn test_labeled_y_ticks_match_highlighted_values() {
        let points = series(1..=20);
        let config = ChartConfig::new("img", "SSIM").with_label_highlighted(true);
        let svg = generate_svg(&points, &config);

        // 0.05, 0.10, 0.15, 0.20 labeled; the 24-step scale is absent.
        assert!(svg.contains(">0.0500<"));
        assert!(svg.contains(">0.20<"));
        assert!(!svg.contains(">0.0100<"));
    }
}
