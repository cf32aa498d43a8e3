use regex::Regex;

/// Strip leading code-fence marker lines from a raw transcription.
///
/// The recognition models occasionally wrap their output in a fenced code
/// block, with or without a `text` language tag. Any line that is such a
/// marker is dropped and the remaining text is trimmed.
pub fn clean_transcription(raw: &str) -> String {
    let fence = Regex::new(r"^```(text)?").unwrap();
    raw.lines()
        .filter(|line| !fence.is_match(line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
