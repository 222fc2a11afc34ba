/// Only the top of a block can hold its heading.
pub const TITLE_SCAN_LINES: usize = 5;
pub const TITLE_MIN_LEN: usize = 8;
pub const TITLE_MAX_LEN: usize = 80;

/// First plausible heading line of a block, or a numbered placeholder.
/// `position` is the block's 1-based position within its issue.
pub fn infer_title(block: &str, position: usize) -> String {
    block
        .lines()
        .take(TITLE_SCAN_LINES)
        .map(str::trim)
        .find(|line| is_title_like(line))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Untitled Article {}", position))
}

fn is_title_like(line: &str) -> bool {
    let len = line.chars().count();
    (TITLE_MIN_LEN..=TITLE_MAX_LEN).contains(&len)
        && line.chars().any(|c| c.is_alphanumeric() || c == '_')
}
