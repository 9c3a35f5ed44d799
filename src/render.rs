//! Chart rendering boundary.
//!
//! The core hands a renderer the normalized series, the interval spec, and
//! the summary; it never draws anything itself. [`SvgRenderer`] is the
//! built-in implementation and writes one candlestick SVG per (pair,
//! window). Presentation constants live in the [`ChartStyle`] table, keyed
//! by window, so the pipeline stays free of styling decisions.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::models::{candle::CandleSeries, interval::IntervalSpec, window::TimeWindow};
use crate::summary::Summary;

/// Errors from chart rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The series holds no candles; there is nothing to draw.
    #[error("nothing to draw for the {0} window")]
    EmptySeries(TimeWindow),

    /// Writing the image artifact failed.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Renders one window's chart and returns the image path.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        series: &CandleSeries,
        spec: &IntervalSpec,
        summary: &Summary,
    ) -> Result<PathBuf, RenderError>;
}

/// Declarative per-window presentation constants.
#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    /// Number of x-axis tick labels.
    pub time_ticks: u32,
    /// Fill for candles that closed at or above their open.
    pub rise: &'static str,
    /// Fill for candles that closed below their open.
    pub fall: &'static str,
    /// Stroke for the dashed VWAP overlay.
    pub vwap_stroke: &'static str,
}

/// Style table keyed by window.
pub const fn style_for(window: TimeWindow) -> ChartStyle {
    let time_ticks = match window {
        TimeWindow::Hour | TimeWindow::Day | TimeWindow::Month => 6,
        TimeWindow::Week => 7,
        TimeWindow::Year => 12,
    };
    ChartStyle {
        time_ticks,
        rise: "#2e7d32",
        fall: "#c62828",
        vwap_stroke: "#5c6bc0",
    }
}

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 72.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 56.0;

/// Writes candlestick charts as SVG files into an output directory.
pub struct SvgRenderer {
    out_dir: PathBuf,
    /// Display time zone for axis labels. Candle instants stay UTC.
    tz: Tz,
}

impl SvgRenderer {
    pub fn new(out_dir: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            out_dir: out_dir.into(),
            tz,
        }
    }

    fn label(&self, time: DateTime<Utc>, format: &str) -> String {
        time.with_timezone(&self.tz).format(format).to_string()
    }
}

impl Renderer for SvgRenderer {
    fn render(
        &self,
        series: &CandleSeries,
        spec: &IntervalSpec,
        summary: &Summary,
    ) -> Result<PathBuf, RenderError> {
        if series.candles.is_empty() {
            return Err(RenderError::EmptySeries(series.window));
        }

        let style = style_for(series.window);
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

        let span_secs = (spec.end - spec.start).num_seconds() as f64;
        let pad = ((summary.high - summary.low) * 0.04).max(summary.high * 0.001);
        let y_min = (summary.low - pad).max(0.0);
        let y_max = summary.high + pad;
        let y_span = y_max - y_min;

        let x = |time: DateTime<Utc>| -> f64 {
            let frac = (time - spec.start).num_seconds() as f64 / span_secs;
            MARGIN_LEFT + frac * plot_w
        };
        let y = |price: f64| -> f64 { MARGIN_TOP + (y_max - price) / y_span * plot_h };

        // bar_width is in day units; scale it to pixels for this span and
        // keep it inside one candle slot.
        let px_per_day = plot_w / (span_secs / 86_400.0);
        let slot = plot_w / series.candles.len() as f64;
        let body_w = (spec.bar_width * px_per_day).clamp(1.0, slot * 0.9);

        let mut svg = String::with_capacity(32 * 1024);
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
        ));
        svg.push_str(&format!(
            r##"<rect width="{WIDTH}" height="{HEIGHT}" fill="#ffffff"/>"##
        ));

        // Title and summary line.
        svg.push_str(&format!(
            r##"<text x="{MARGIN_LEFT}" y="22" font-family="sans-serif" font-size="16" fill="#212121">{} ({})</text>"##,
            series.pair,
            spec.span_label(),
        ));
        svg.push_str(&format!(
            r##"<text x="{MARGIN_LEFT}" y="40" font-family="sans-serif" font-size="12" fill="#616161">{}</text>"##,
            summary.display_text.trim_start(),
        ));

        // Horizontal gridlines with price labels.
        for i in 0..=4 {
            let price = y_min + y_span * f64::from(i) / 4.0;
            let gy = y(price);
            svg.push_str(&format!(
                r##"<line x1="{MARGIN_LEFT}" y1="{gy:.1}" x2="{:.1}" y2="{gy:.1}" stroke="#e0e0e0"/>"##,
                MARGIN_LEFT + plot_w,
            ));
            svg.push_str(&format!(
                r##"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="11" fill="#616161" text-anchor="end">{}</text>"##,
                MARGIN_LEFT - 6.0,
                gy + 4.0,
                format_price(price),
            ));
        }

        // Time axis labels in the display time zone.
        for i in 0..=style.time_ticks {
            let frac = f64::from(i) / f64::from(style.time_ticks);
            let tick_time = spec.start
                + chrono::Duration::seconds((span_secs * frac) as i64);
            svg.push_str(&format!(
                r##"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="11" fill="#616161" text-anchor="middle">{}</text>"##,
                x(tick_time),
                HEIGHT - MARGIN_BOTTOM + 18.0,
                self.label(tick_time, spec.label_format),
            ));
        }

        // Candles: wick first, body on top.
        for candle in &series.candles {
            let cx = x(candle.time);
            let color = if candle.close >= candle.open {
                style.rise
            } else {
                style.fall
            };
            svg.push_str(&format!(
                r#"<line class="wick" x1="{cx:.1}" y1="{:.1}" x2="{cx:.1}" y2="{:.1}" stroke="{color}"/>"#,
                y(candle.high),
                y(candle.low),
            ));
            let body_top = y(candle.open.max(candle.close));
            let body_h = (y(candle.open.min(candle.close)) - body_top).max(1.0);
            svg.push_str(&format!(
                r#"<rect class="body" x="{:.1}" y="{body_top:.1}" width="{body_w:.1}" height="{body_h:.1}" fill="{color}"/>"#,
                cx - body_w / 2.0,
            ));
        }

        // VWAP overlay, omitted when volume was degenerate.
        if let Some(vwap) = summary.vwap {
            let vy = y(vwap.clamp(y_min, y_max));
            svg.push_str(&format!(
                r#"<line class="vwap" x1="{MARGIN_LEFT}" y1="{vy:.1}" x2="{:.1}" y2="{vy:.1}" stroke="{}" stroke-dasharray="6 4"/>"#,
                MARGIN_LEFT + plot_w,
                style.vwap_stroke,
            ));
            svg.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="11" fill="{}">vwap {}</text>"#,
                MARGIN_LEFT + 4.0,
                vy - 4.0,
                style.vwap_stroke,
                format_price(vwap),
            ));
        }

        svg.push_str("</svg>");

        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!(
            "{}-{}.svg",
            series.pair.to_lowercase(),
            series.window
        ));
        fs::write(&path, svg)?;
        Ok(path)
    }
}

/// Price label formatting: sub-10 assets need the decimals, majors do not.
fn format_price(price: f64) -> String {
    if price < 10.0 {
        format!("{price:.4}")
    } else {
        format!("{price:.0}")
    }
}
