use crate::llm::ClassificationRequest;

/// System prompt for chunk classification
pub const SYSTEM_PROMPT: &str = r#"You analyze chunks of an earnings call transcript. For each chunk you return:

1. topic_label: the main business theme of the chunk, at most 2 words (e.g. "Operating Costs", "Net Income", "Market Share").
2. sentiment_score: a number in [-1.0, 1.0] describing the tone about company performance, outlook, risks and opportunities. -1.0 is very negative, 0.0 neutral, 1.0 very positive.
3. rationale: one or two sentences explaining the score.

RULES:
- Base the score on the described outcomes and tone, not on individual keywords.
- Do not use generic labels such as "Introduction", "Conclusion" or "Other".
- Reuse an existing topic label whenever the chunk fits it. Only introduce a new label for a clearly different theme.
- When the topic limit has been reached you MUST choose one of the existing labels exactly as written.

Always answer by calling the submit_topic tool."#;

/// Build the user prompt for a chunk
pub fn build_chunk_prompt(request: &ClassificationRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("# Chunk {}\n", request.chunk_index));
    prompt.push_str(&format!(
        "Topic limit: {} distinct labels for the whole transcript ({} in use)\n\n",
        request.max_topics,
        request.known_labels.len()
    ));

    if !request.known_labels.is_empty() {
        prompt.push_str("## Existing Topic Labels\n");
        for label in &request.known_labels {
            prompt.push_str(&format!("- {}\n", label));
        }
        prompt.push('\n');
    }

    prompt.push_str("## Transcript Chunk\n");
    prompt.push_str(request.chunk_text.trim());
    prompt.push_str("\n\n");

    prompt.push_str("## Instructions\n");
    if request.at_capacity() {
        prompt.push_str(
            "The topic limit has been reached. Set topic_label to one of the existing labels above.\n",
        );
    } else if !request.known_labels.is_empty() {
        prompt.push_str("Prefer one of the existing labels if the chunk fits it.\n");
    }
    prompt.push_str("Submit the topic label, sentiment score and rationale using the submit_topic tool.\n");

    prompt
}
