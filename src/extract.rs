//! Recovers plain source text from a model response.
//!
//! Models are asked to wrap their answer in a markdown fenced block, but they
//! often add a sentence before or after it. Extraction is best effort: when no
//! complete fence is present the whole response is used.

use regex::Regex;
use std::sync::LazyLock;

/// Opening fence, optional language tag (`html`, `tsx`, `c++`, `objective-c`),
/// optional line break, then the lazily matched body up to the next fence.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[\w+#.-]*[ \t]*\r?\n?(.*?)```").expect("fenced block pattern is valid")
});

/// Returns the trimmed body of the first fenced code block in `raw`, or all of
/// `raw` trimmed when it contains no complete fenced block.
pub fn extract_code(raw: &str) -> String {
    match FENCED_BLOCK.captures(raw).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim().to_string(),
        None => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_with_preamble() {
        let raw = "Here you go:\n```html\n<div>Hi</div>\n```";
        assert_eq!(extract_code(raw), "<div>Hi</div>");
    }

    #[test]
    fn test_extract_without_fence() {
        assert_eq!(extract_code("<div>Hi</div>"), "<div>Hi</div>");
        assert_eq!(extract_code("  \n<p>x</p>\n\n"), "<p>x</p>");
    }

    #[test]
    fn test_extract_ignores_language_tag() {
        let body = "<main>\n  <h1>Title</h1>\n</main>";
        for tag in ["", "html", "HTML", "tsx", "c++", "objective-c", "vue.js"] {
            let raw = format!("Sure!\n```{}\n{}\n```\nEnjoy.", tag, body);
            assert_eq!(extract_code(&raw), body, "tag {:?}", tag);
        }
    }

    #[test]
    fn test_extract_trims_interior_whitespace() {
        let raw = "```html\n\n\n   <span>a</span>   \n\n```";
        assert_eq!(extract_code(raw), "<span>a</span>");
    }

    #[test]
    fn test_extract_uses_first_block_only() {
        let raw = "```html\n<div>first</div>\n```\ntext\n```css\n.second {}\n```";
        assert_eq!(extract_code(raw), "<div>first</div>");
    }

    #[test]
    fn test_extract_empty_input() {
        assert_eq!(extract_code(""), "");
        assert_eq!(extract_code("   \n\t "), "");
    }

    #[test]
    fn test_extract_empty_block() {
        assert_eq!(extract_code("```html\n```"), "");
    }

    #[test]
    fn test_extract_unterminated_fence_falls_back() {
        let raw = "```html\n<div>never closed</div>";
        assert_eq!(extract_code(raw), raw);
    }

    #[test]
    fn test_extract_crlf_line_endings() {
        let raw = "```html\r\n<b>x</b>\r\n```";
        assert_eq!(extract_code(raw), "<b>x</b>");
    }

    #[test]
    fn test_extract_is_idempotent_on_plain_text() {
        for raw in ["<div>Hi</div>", "  spaced out  ", "", "line one\nline two\n"] {
            let once = extract_code(raw);
            assert_eq!(extract_code(&once), once);
        }
    }

    #[test]
    fn test_extract_single_line_fence() {
        let raw = "``` <code>x</code> ```";
        assert_eq!(extract_code(raw), "<code>x</code>");
    }
}
