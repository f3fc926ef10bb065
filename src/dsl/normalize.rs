//! Surface-syntax pre-pass.
//!
//! Bytebeat snippets are usually shared as JavaScript: either a bare
//! expression or a short program with a `return <expr>;` statement, often
//! calling `Math.sin` and friends. This pass reduces such text to a plain
//! expression the lexer understands. It never fails.

const RETURN_KEYWORD: &str = "return";

/// Reduce a JavaScript-flavored snippet to an expression source string.
pub fn normalize(text: &str) -> String {
    let body = match find_keyword(text, RETURN_KEYWORD) {
        Some(at) => {
            let rest = &text[at + RETURN_KEYWORD.len()..];
            match rest.find(';') {
                Some(end) => &rest[..end],
                None => rest,
            }
        }
        None => text.trim().trim_end_matches(';'),
    };

    body.trim().replace("Math.", "")
}

/// Byte offset of `word` in `text` where it is not part of a longer identifier.
fn find_keyword(text: &str, word: &str) -> Option<usize> {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut from = 0;
    while let Some(found) = text[from..].find(word) {
        let at = from + found;
        let before_ok = text[..at].chars().next_back().map_or(true, |c| !is_ident(c));
        let after_ok = text[at + word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident(c));
        if before_ok && after_ok {
            return Some(at);
        }
        from = at + word.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_expression_is_trimmed() {
        assert_eq!(normalize("  t*(t>>5)  \n"), "t*(t>>5)");
    }

    #[test]
    fn return_statement_is_extracted() {
        assert_eq!(normalize("return t>>4;"), "t>>4");
        assert_eq!(
            normalize("var x = 1; return (t*x)&255; // done"),
            "(t*x)&255"
        );
    }

    #[test]
    fn return_without_semicolon_runs_to_end() {
        assert_eq!(normalize("return  t|t>>8  "), "t|t>>8");
    }

    #[test]
    fn math_prefix_is_stripped() {
        assert_eq!(
            normalize("return Math.sin(t/10)*Math.floor(a);"),
            "sin(t/10)*floor(a)"
        );
    }

    #[test]
    fn trailing_semicolon_dropped_without_return() {
        assert_eq!(normalize("t*5;"), "t*5");
    }

    #[test]
    fn return_must_be_a_whole_word() {
        assert_eq!(normalize("returned+1"), "returned+1");
        assert_eq!(normalize("x_return; return t;"), "t");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize("   "), "");
    }
}
