use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::io::{HumanReport, ReportMetadata, TopicReport};
use crate::models::TopicTable;
use crate::render::{SvgOptions, render_treemap_svg};

pub const REPORT_JSON_FILE: &str = "topics.json";
pub const REPORT_TEXT_FILE: &str = "report.txt";
pub const TREEMAP_FILE: &str = "treemap.svg";

/// Configuration for Stage 4 rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Whether to generate the JSON report
    pub generate_json: bool,
    /// Whether to generate the text report
    pub generate_text: bool,
    /// Whether to generate the treemap image
    pub generate_svg: bool,
    pub svg: SvgOptions,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            generate_json: true,
            generate_text: true,
            generate_svg: true,
            svg: SvgOptions::default(),
        }
    }
}

/// Paths of the artifacts Stage 4 wrote
#[derive(Debug, Default)]
pub struct RenderResult {
    pub json_path: Option<PathBuf>,
    pub text_path: Option<PathBuf>,
    pub svg_path: Option<PathBuf>,
}

/// Execute Stage 4: write the report artifacts into `output_dir`
///
/// Produces up to three views of the same topic table:
/// 1. JSON report with ranked summaries and run metadata
/// 2. Text report with a ranked table and key takeaways
/// 3. SVG treemap sized by minutes and coloured by sentiment
pub fn execute_render(
    table: &TopicTable,
    model: &str,
    source: Option<&Path>,
    metadata: ReportMetadata,
    output_dir: &Path,
    config: &RenderConfig,
) -> Result<RenderResult> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut result = RenderResult::default();

    if config.generate_json {
        let path = output_dir.join(REPORT_JSON_FILE);
        info!("Writing JSON report to {:?}", path);
        TopicReport::new(table, model, source, metadata.clone()).write_json(&path)?;
        result.json_path = Some(path);
    }

    if config.generate_text {
        let path = output_dir.join(REPORT_TEXT_FILE);
        info!("Writing text report to {:?}", path);
        HumanReport::new(table, &metadata).write_file(&path)?;
        result.text_path = Some(path);
    }

    if config.generate_svg {
        let path = output_dir.join(TREEMAP_FILE);
        info!("Writing treemap to {:?}", path);
        std::fs::write(&path, render_treemap_svg(table, &config.svg))
            .with_context(|| format!("Failed to write file: {:?}", path))?;
        result.svg_path = Some(path);
    }

    Ok(result)
}
