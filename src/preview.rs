//! Preview surfaces for generated markup.
//!
//! Generated code is untrusted. The browser preview embeds it in an
//! `<iframe sandbox>` without `allow-same-origin`, so its scripts run in an
//! opaque origin and cannot reach the wrapper page, its storage, or cookies.
//! The terminal preview never executes anything: it reduces the page to a
//! text outline.

use anyhow::{anyhow, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

pub const PREVIEW_FILE_NAME: &str = "genui-preview.html";

/// Scripts only; without `allow-same-origin` the frame runs in an opaque origin.
const SANDBOX_FLAGS: &str = "allow-scripts";

/// Escapes text for a double-quoted HTML attribute value.
pub fn escape_attribute(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrapper page that renders `code` inside a sandboxed frame.
pub fn sandboxed_document(code: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>GenUI Preview</title>
<style>html,body{{margin:0;height:100%;background:#fff}}iframe{{display:block;border:0;width:100%;height:100%}}</style>
</head>
<body>
<iframe title="preview" sandbox="{}" srcdoc="{}"></iframe>
</body>
</html>
"#,
        SANDBOX_FLAGS,
        escape_attribute(code)
    )
}

pub fn default_preview_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("genui"))
        .unwrap_or_else(std::env::temp_dir)
}

/// Writes the sandboxed wrapper for `code` into `dir` and returns its path.
pub fn write_preview(dir: &Path, code: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(PREVIEW_FILE_NAME);
    fs::write(&path, sandboxed_document(code))?;
    Ok(path)
}

/// Opens `path` with the platform's default handler.
pub fn open_in_browser(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };

    command
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow!("could not launch a browser: {}", e))?;

    tracing::info!(path = %path.display(), "opened preview");
    Ok(())
}

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").expect("valid pattern"));
static HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b.*?</head\s*>").expect("valid pattern"));
static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("valid pattern"));
static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").expect("valid pattern"));
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid pattern"));
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(br|p|div|h[1-6]|li|ul|ol|tr|td|th|table|section|article|header|footer|nav|main|aside|form|button|label|blockquote|pre|hr|figure|figcaption)\b[^>]*>",
    )
    .expect("valid pattern")
});
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid pattern"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid pattern"));

/// Text-only view of a page for the terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOutline {
    pub title: Option<String>,
    pub lines: Vec<String>,
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&copy;", "©")
        .replace("&amp;", "&")
}

fn clean_line(text: &str) -> String {
    SPACES.replace_all(&decode_entities(text), " ").trim().to_string()
}

pub fn outline(code: &str) -> PageOutline {
    let title = TITLE
        .captures(code)
        .and_then(|c| c.get(1))
        .map(|m| clean_line(m.as_str()))
        .filter(|t| !t.is_empty());

    let body = HEAD.replace_all(code, "");
    let body = SCRIPT.replace_all(&body, "");
    let body = STYLE.replace_all(&body, "");
    let body = COMMENT.replace_all(&body, "");
    let body = BLOCK_TAG.replace_all(&body, "\n");
    let body = ANY_TAG.replace_all(&body, "");

    let lines = body
        .lines()
        .map(clean_line)
        .filter(|l| !l.is_empty())
        .collect();

    PageOutline { title, lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_escape_attribute() {
        assert_eq!(
            escape_attribute(r#"<a href="x">Tom & Jerry</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&lt;/a&gt;"
        );
    }

    #[test]
    fn test_sandboxed_document_isolates_code() {
        let doc = sandboxed_document(r#"<script>parent.document.title = "pwned"</script>"#);
        assert!(doc.contains(&format!(r#"sandbox="{}""#, SANDBOX_FLAGS)));
        assert!(doc.contains(r#"<iframe title="preview" sandbox="allow-scripts" srcdoc=""#));
        assert!(!doc.contains("allow-same-origin"));
        assert!(!doc.contains("<script>"));
        assert!(doc.contains("&lt;script&gt;parent.document.title = &quot;pwned&quot;&lt;/script&gt;"));
    }

    #[test]
    fn test_write_preview() {
        let dir = tempdir().unwrap();
        let path = write_preview(dir.path(), "<p>hello</p>").unwrap();
        assert_eq!(path.file_name().unwrap(), PREVIEW_FILE_NAME);
        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains("srcdoc=\"&lt;p&gt;hello&lt;/p&gt;\""));
    }

    #[test]
    fn test_outline_strips_markup() {
        let page = r#"<!DOCTYPE html>
<html><head><title>Pricing &amp; Plans</title>
<style>.card { color: red; }</style>
<script src="https://cdn.tailwindcss.com"></script></head>
<body>
  <!-- hero -->
  <h1 class="text-3xl">Choose   your plan</h1>
  <div class="card"><p>Basic</p><span>$9</span>&nbsp;/mo</div>
  <button onclick="buy()">Buy now</button>
  <script>function buy() { alert("<b>thanks</b>"); }</script>
</body></html>"#;

        let outline = outline(page);
        assert_eq!(outline.title.as_deref(), Some("Pricing & Plans"));
        assert_eq!(outline.lines, vec!["Choose your plan", "Basic", "$9 /mo", "Buy now"]);
    }

    #[test]
    fn test_outline_of_fragment() {
        let outline = outline("<div>Hi</div>");
        assert_eq!(outline.title, None);
        assert_eq!(outline.lines, vec!["Hi"]);
    }

    #[test]
    fn test_outline_of_empty_code() {
        assert_eq!(outline(""), PageOutline::default());
    }
}
