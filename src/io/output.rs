use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{TopicSummary, TopicTable};

/// Machine-readable report: ranked topic summaries plus run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicReport {
    /// Unique id of the analysis run
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Classifier model that produced the observations
    pub model: String,
    /// Transcript the report was built from
    pub source: Option<PathBuf>,
    pub metadata: ReportMetadata,
    /// Topics ordered by estimated minutes, largest first
    pub topics: Vec<TopicSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub total_words: usize,
    pub chunk_count: usize,
    pub chunks_classified: usize,
    pub chunks_dropped: usize,
    pub words_per_minute: u32,
    pub max_topics: usize,
    pub total_minutes: f64,
    pub overall_sentiment: f64,
    pub served_from_cache: bool,
}

impl TopicReport {
    pub fn new(
        table: &TopicTable,
        model: &str,
        source: Option<&Path>,
        metadata: ReportMetadata,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            model: model.to_string(),
            source: source.map(Path::to_path_buf),
            metadata,
            topics: table.ranked().into_iter().cloned().collect(),
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Human-readable topic report
pub struct HumanReport<'a> {
    table: &'a TopicTable,
    metadata: &'a ReportMetadata,
}

impl<'a> HumanReport<'a> {
    pub fn new(table: &'a TopicTable, metadata: &'a ReportMetadata) -> Self {
        Self { table, metadata }
    }

    /// Format the report as plain text
    pub fn format(&self) -> String {
        let mut output = String::new();

        output.push_str("Earnings Call Topic Report\n");
        output.push_str("==========================\n\n");

        output.push_str(&format!(
            "{:<4} {:<24} {:>8} {:>8} {:>10}  {}\n",
            "#", "Topic", "Words", "Minutes", "Sentiment", "Band"
        ));
        output.push_str(&format!("{}\n", "-".repeat(70)));

        for (rank, topic) in self.table.ranked().into_iter().enumerate() {
            output.push_str(&format!(
                "{:<4} {:<24} {:>8} {:>8.1} {:>+10.2}  {}\n",
                rank + 1,
                truncate(&topic.topic_label, 24),
                topic.total_word_count,
                topic.estimated_minutes,
                topic.aggregate_sentiment,
                topic.band().as_str()
            ));
        }
        output.push('\n');

        output.push_str("Topic Details\n");
        output.push_str("-------------\n");
        for topic in self.table.ranked() {
            output.push_str(&format!(
                "\n{} ({:.1} min, {}, chunks {})\n",
                topic.topic_label,
                topic.estimated_minutes,
                topic.band().as_str(),
                join_indices(&topic.chunk_indices)
            ));
            if !topic.representative_rationale.trim().is_empty() {
                output.push_str(&indent(&wrap_text(&topic.representative_rationale, 76), "  "));
                output.push('\n');
            }
        }
        output.push('\n');

        output.push_str("Key Takeaways\n");
        output.push_str("-------------\n");
        for line in self.takeaways() {
            output.push_str(&format!("- {}\n", line));
        }

        output
    }

    fn takeaways(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "{} topics across {} words ({:.1} min at {} wpm)",
                self.table.len(),
                self.metadata.total_words,
                self.metadata.total_minutes,
                self.metadata.words_per_minute
            ),
            format!(
                "Overall weighted sentiment: {:+.2} ({})",
                self.metadata.overall_sentiment,
                crate::models::SentimentBand::from_score(self.metadata.overall_sentiment).as_str()
            ),
        ];

        if let Some(largest) = self.table.largest() {
            lines.push(format!(
                "Most discussed: {} ({:.1} min)",
                largest.topic_label, largest.estimated_minutes
            ));
        }
        if let Some(positive) = self.table.most_positive() {
            lines.push(format!(
                "Most positive: {} ({:+.2})",
                positive.topic_label, positive.aggregate_sentiment
            ));
        }
        if self.metadata.chunks_dropped > 0 {
            lines.push(format!(
                "{} of {} chunks dropped after malformed responses",
                self.metadata.chunks_dropped, self.metadata.chunk_count
            ));
        }

        lines
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        if line_len + word.len() + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word.len();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TopicTable {
        let mut table = TopicTable::new();
        table.insert(TopicSummary {
            topic_label: "Revenue".to_string(),
            total_word_count: 450,
            estimated_minutes: 450.0 / 155.0,
            aggregate_sentiment: 0.2667,
            representative_rationale: "Management pointed to record subscription growth in every region."
                .to_string(),
            chunk_indices: vec![1, 2],
        });
        table.insert(TopicSummary {
            topic_label: "Costs".to_string(),
            total_word_count: 150,
            estimated_minutes: 150.0 / 155.0,
            aggregate_sentiment: -0.8,
            representative_rationale: "Input costs rose sharply.".to_string(),
            chunk_indices: vec![3],
        });
        table
    }

    fn metadata(dropped: usize) -> ReportMetadata {
        ReportMetadata {
            total_words: 600,
            chunk_count: 3 + dropped,
            chunks_classified: 3,
            chunks_dropped: dropped,
            words_per_minute: 155,
            max_topics: 10,
            total_minutes: 600.0 / 155.0,
            overall_sentiment: 0.0,
            served_from_cache: false,
        }
    }

    #[test]
    fn test_wrap_text() {
        let text = "This is a test of the text wrapping function that should wrap at 20 chars";
        let wrapped = wrap_text(text, 20);
        for line in wrapped.lines() {
            assert!(line.len() <= 25);
        }
    }

    #[test]
    fn test_human_report_is_ranked() {
        let table = table();
        let meta = metadata(0);
        let text = HumanReport::new(&table, &meta).format();

        let revenue = text.find("Revenue").unwrap();
        let costs = text.find("Costs").unwrap();
        assert!(revenue < costs);
        assert!(text.contains("negative"));
        assert!(text.contains("Most discussed: Revenue"));
        assert!(!text.contains("dropped"));
    }

    #[test]
    fn test_human_report_mentions_dropped_chunks() {
        let table = table();
        let meta = metadata(2);
        let text = HumanReport::new(&table, &meta).format();

        assert!(text.contains("2 of 5 chunks dropped"));
    }

    #[test]
    fn test_topic_report_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.json");

        let report = TopicReport::new(&table(), "test-model", None, metadata(0));
        report.write_json(&path).unwrap();

        let loaded: TopicReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.run_id, report.run_id);
        assert_eq!(loaded.topics.len(), 2);
        assert_eq!(loaded.topics[0].topic_label, "Revenue");
        assert_eq!(loaded.metadata.total_words, 600);
        assert_eq!(loaded.metadata.chunks_dropped, 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Revenue", 24), "Revenue");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
