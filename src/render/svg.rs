use std::fmt::Write;

use crate::models::{TopicSummary, TopicTable};
use crate::render::{Rect, sentiment_color, squarify, text_color};

/// Layout options for the treemap image
#[derive(Debug, Clone)]
pub struct SvgOptions {
    pub width: f64,
    pub height: f64,
    pub title: String,
    /// Gap between neighbouring tiles
    pub padding: f64,
    /// Height reserved below the map for the colour legend
    pub legend_height: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            title: "Earnings Call Sentiment by Topic (size = time, color = sentiment)".to_string(),
            padding: 2.0,
            legend_height: 60.0,
        }
    }
}

const TITLE_HEIGHT: f64 = 48.0;

/// Render the topic table as a standalone SVG treemap
///
/// Tile area follows estimated minutes; tile colour follows aggregate sentiment.
pub fn render_treemap_svg(table: &TopicTable, options: &SvgOptions) -> String {
    let topics: Vec<&TopicSummary> = table.ranked();
    let values: Vec<f64> = topics.iter().map(|t| t.estimated_minutes).collect();

    let map_bounds = Rect::new(
        0.0,
        TITLE_HEIGHT,
        options.width,
        (options.height - TITLE_HEIGHT - options.legend_height).max(0.0),
    );
    let tiles = squarify(&values, map_bounds);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="Helvetica, Arial, sans-serif">"#,
        w = options.width,
        h = options.height
    );
    let _ = writeln!(
        svg,
        r##"  <rect x="0" y="0" width="{}" height="{}" fill="#ffffff"/>"##,
        options.width, options.height
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="30" font-size="20" font-weight="bold" text-anchor="middle">{}</text>"#,
        options.width / 2.0,
        escape_xml(&options.title)
    );

    for (topic, tile) in topics.iter().zip(&tiles) {
        let tile = tile.inset(options.padding / 2.0);
        if tile.area() <= 0.0 {
            continue;
        }
        write_tile(&mut svg, topic, &tile);
    }

    write_legend(&mut svg, options);
    svg.push_str("</svg>\n");
    svg
}

fn write_tile(svg: &mut String, topic: &TopicSummary, tile: &Rect) {
    let fill = sentiment_color(topic.aggregate_sentiment);
    let ink = text_color(fill);

    let _ = writeln!(svg, "  <g>");
    let _ = writeln!(
        svg,
        r#"    <title>{} | {:.2} min | {} words | sentiment {:+.2}</title>"#,
        escape_xml(&topic.topic_label),
        topic.estimated_minutes,
        topic.total_word_count,
        topic.aggregate_sentiment
    );
    let _ = writeln!(
        svg,
        r##"    <rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" stroke="#ffffff"/>"##,
        tile.x, tile.y, tile.w, tile.h, fill
    );

    // Skip text on tiles too small to hold it
    if tile.w >= 60.0 && tile.h >= 36.0 {
        let font_size = (tile.w / 10.0).clamp(10.0, 18.0);
        let cx = tile.x + tile.w / 2.0;
        let cy = tile.y + tile.h / 2.0;
        let _ = writeln!(
            svg,
            r#"    <text x="{:.2}" y="{:.2}" font-size="{:.1}" font-weight="bold" fill="{}" text-anchor="middle">{}</text>"#,
            cx,
            cy - font_size * 0.2,
            font_size,
            ink,
            escape_xml(&topic.topic_label)
        );
        let _ = writeln!(
            svg,
            r#"    <text x="{:.2}" y="{:.2}" font-size="{:.1}" fill="{}" text-anchor="middle">{:.1} min · {:+.2}</text>"#,
            cx,
            cy + font_size,
            font_size * 0.75,
            ink,
            topic.estimated_minutes,
            topic.aggregate_sentiment
        );
    }
    let _ = writeln!(svg, "  </g>");
}

fn write_legend(svg: &mut String, options: &SvgOptions) {
    if options.legend_height < 30.0 {
        return;
    }

    let bar_w = (options.width * 0.4).min(480.0);
    let bar_h = 14.0;
    let x = (options.width - bar_w) / 2.0;
    let y = options.height - options.legend_height + 16.0;
    let steps = 40;

    let _ = writeln!(svg, r#"  <g font-size="12">"#);
    for i in 0..steps {
        let score = -1.0 + 2.0 * (i as f64 + 0.5) / steps as f64;
        let _ = writeln!(
            svg,
            r#"    <rect x="{:.2}" y="{:.2}" width="{:.2}" height="{}" fill="{}"/>"#,
            x + bar_w * i as f64 / steps as f64,
            y,
            bar_w / steps as f64 + 0.5,
            bar_h,
            sentiment_color(score)
        );
    }
    for (label, frac) in [("-1.0", 0.0), ("0.0", 0.5), ("+1.0", 1.0)] {
        let _ = writeln!(
            svg,
            r#"    <text x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
            x + bar_w * frac,
            y + bar_h + 16.0,
            label
        );
    }
    let _ = writeln!(
        svg,
        r#"    <text x="{:.2}" y="{:.2}" text-anchor="end">Avg. sentiment</text>"#,
        x - 10.0,
        y + bar_h - 2.0
    );
    let _ = writeln!(svg, "  </g>");
}

/// Escape text for use in SVG element content and attribute values
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
