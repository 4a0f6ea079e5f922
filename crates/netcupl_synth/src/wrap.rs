//! Word wrapping for CUPL equations.

/// Line terminator required by WinCUPL on every platform.
pub const ENDLINE: &str = "\r\n";

/// Column at which equations are wrapped.
pub const LINE_WIDTH: usize = 80;

/// Continuation line prefix.
const CONTINUATION: &str = "\r\n  ";

/// Re-flows `text` into lines of at most `width` characters.
///
/// Runs of whitespace collapse to one space. A word whose length added to
/// the current line length reaches `width` starts a continuation line indented
/// by two spaces; the indent does not count toward the width. A single word
/// longer than `width` is never split.
pub fn wrap(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut current = 0;
    for word in text.split_whitespace() {
        if current != 0 {
            if current + word.len() < width {
                out.push(' ');
                current += 1;
            } else {
                out.push_str(CONTINUATION);
                current = 0;
            }
        }
        out.push_str(word);
        current += word.len();
    }
    out
}
