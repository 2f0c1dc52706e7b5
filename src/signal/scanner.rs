#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InString,
    EscapePending,
}

/// Return the byte length of the brace-balanced block that opens at `text[0]`.
///
/// Braces inside string literals are ignored and `\"` does not close a
/// string. Returns `None` when `text` does not start with `{` or the block is
/// never closed.
pub fn balanced_block_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'{') {
        return None;
    }

    let mut state = ScanState::Normal;
    let mut depth = 0usize;
    for (idx, &byte) in bytes.iter().enumerate() {
        state = match (state, byte) {
            (ScanState::EscapePending, _) => ScanState::InString,
            (ScanState::InString, b'\\') => ScanState::EscapePending,
            (ScanState::InString, b'"') => ScanState::Normal,
            (ScanState::InString, _) => ScanState::InString,
            (ScanState::Normal, b'"') => ScanState::InString,
            (ScanState::Normal, b'{') => {
                depth += 1;
                ScanState::Normal
            }
            (ScanState::Normal, b'}') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx + 1);
                }
                ScanState::Normal
            }
            (ScanState::Normal, _) => ScanState::Normal,
        };
    }

    None
}

/// Slice out the balanced block starting at byte offset `start`.
pub fn balanced_block_at(text: &str, start: usize) -> Option<&str> {
    let rest = text.get(start..)?;
    let len = balanced_block_len(rest)?;
    rest.get(..len)
}
