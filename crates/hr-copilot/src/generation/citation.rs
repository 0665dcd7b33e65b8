//! Citation block appended to generated answers

/// Append a visually separated source list; the answer is unchanged when `sources` is empty
pub fn append_citation_block(answer: &str, sources: &[String]) -> String {
    if sources.is_empty() {
        return answer.to_string();
    }
    format!("{}\n\n---\n**Sources:** {}", answer, sources.join(", "))
}
