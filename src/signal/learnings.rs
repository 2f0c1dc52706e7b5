pub const LEARNINGS_MARKER: &str = "RALPH_LEARNINGS:";

fn is_placeholder(body: &str) -> bool {
    body.lines().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed == "-"
    })
}

/// Pull the free-form notes that follow a `RALPH_LEARNINGS:` marker.
///
/// Text on the marker line itself wins. Otherwise the following lines are
/// collected up to a blank line, a code fence, or the end of input. Empty
/// blocks and blocks made only of bare `-` bullets yield `None`.
pub fn extract_learnings(text: &str) -> Option<String> {
    let mut lines = text.lines();
    let inline = lines.by_ref().find_map(|line| {
        line.find(LEARNINGS_MARKER)
            .map(|idx| line[idx + LEARNINGS_MARKER.len()..].trim())
    })?;
    if !inline.is_empty() {
        return Some(inline.to_string());
    }

    let body = lines
        .take_while(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with("```")
        })
        .collect::<Vec<_>>()
        .join("\n");
    let body = body.trim();

    if is_placeholder(body) {
        return None;
    }
    Some(body.to_string())
}
