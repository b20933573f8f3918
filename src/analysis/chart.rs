use crate::errors::{Result, SectorHubError};
use crate::models::sector::PerformanceSeries;
use chrono::NaiveDate;
use log::info;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const PALETTE: [&str; 11] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
    "#393b79",
];

/// 板块表现图的输出接口
pub trait ChartRenderer {
    fn render(&self, series: &PerformanceSeries, dates: &[NaiveDate], path: &Path) -> Result<()>;
}

/// 折线图，输出为 SVG 文件
pub struct SvgChartRenderer {
    width: f64,
    height: f64,
    title: String,
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self {
            width: 1500.0,
            height: 720.0,
            title: "Sector Performances Over the Past Quarter".to_string(),
        }
    }
}

impl SvgChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn render_svg(&self, series: &PerformanceSeries, dates: &[NaiveDate]) -> Result<String> {
        if series.is_empty() || dates.is_empty() {
            return Err(SectorHubError::DataError("nothing to plot".to_string()));
        }

        let (left, right, top, bottom) = (70.0, 220.0, 50.0, 90.0);
        let plot_w = self.width - left - right;
        let plot_h = self.height - top - bottom;

        // y 轴范围总是包含 0
        let (mut lo, mut hi) = (0.0f64, 0.0f64);
        for (_, values) in series.iter() {
            for v in values {
                lo = lo.min(*v);
                hi = hi.max(*v);
            }
        }
        if hi - lo < f64::EPSILON {
            hi = lo + 1.0;
        }

        let x_at = |i: usize| {
            if dates.len() > 1 {
                left + plot_w * i as f64 / (dates.len() - 1) as f64
            } else {
                left + plot_w / 2.0
            }
        };
        let y_at = |v: f64| top + plot_h * (hi - v) / (hi - lo);

        let mut svg = String::new();
        let fmt_err = |e: std::fmt::Error| SectorHubError::Unknown(e.to_string());

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        )
        .map_err(fmt_err)?;
        writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#).map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<text x="{}" y="30" font-size="20" text-anchor="middle">{}</text>"#,
            left + plot_w / 2.0,
            escape(&self.title)
        )
        .map_err(fmt_err)?;

        // 坐标轴
        writeln!(
            svg,
            r##"<line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="#444"/><line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="#444"/>"##,
            l = left,
            t = top,
            b = top + plot_h,
            r = left + plot_w
        )
        .map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="14" text-anchor="middle">date</text>"#,
            left + plot_w / 2.0,
            self.height - 15.0
        )
        .map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<text x="20" y="{y}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {y})">% gain / loss</text>"#,
            y = top + plot_h / 2.0
        )
        .map_err(fmt_err)?;

        for tick in 0..=4 {
            let value = lo + (hi - lo) * tick as f64 / 4.0;
            writeln!(
                svg,
                r#"<text x="{}" y="{}" font-size="11" text-anchor="end">{:.1}</text>"#,
                left - 6.0,
                y_at(value) + 4.0,
                value
            )
            .map_err(fmt_err)?;
        }

        for (i, date) in dates.iter().enumerate() {
            let x = x_at(i);
            let y = top + plot_h + 14.0;
            writeln!(
                svg,
                r#"<text x="{x}" y="{y}" font-size="10" text-anchor="end" transform="rotate(-45 {x} {y})">{}</text>"#,
                date,
                x = x,
                y = y
            )
            .map_err(fmt_err)?;
        }

        // 零线
        writeln!(
            svg,
            r##"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="#000000" stroke-width="1.5"/>"##,
            left,
            left + plot_w,
            y = y_at(0.0)
        )
        .map_err(fmt_err)?;

        for (n, (sector, values)) in series.iter().enumerate() {
            let color = PALETTE[n % PALETTE.len()];
            let points: Vec<String> = values
                .iter()
                .take(dates.len())
                .enumerate()
                .map(|(i, v)| format!("{:.2},{:.2}", x_at(i), y_at(*v)))
                .collect();
            writeln!(
                svg,
                r#"<polyline fill="none" stroke="{}" stroke-width="2" points="{}"/>"#,
                color,
                points.join(" ")
            )
            .map_err(fmt_err)?;

            let ly = top + 20.0 * n as f64;
            let lx = left + plot_w + 20.0;
            writeln!(
                svg,
                r#"<line x1="{}" y1="{ly}" x2="{}" y2="{ly}" stroke="{}" stroke-width="3"/><text x="{}" y="{}" font-size="12">{}</text>"#,
                lx,
                lx + 20.0,
                color,
                lx + 26.0,
                ly + 4.0,
                escape(sector),
                ly = ly
            )
            .map_err(fmt_err)?;
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, series: &PerformanceSeries, dates: &[NaiveDate], path: &Path) -> Result<()> {
        let svg = self.render_svg(series, dates)?;
        fs::write(path, svg)?;
        info!("Chart saved to {}", path.display());
        Ok(())
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
