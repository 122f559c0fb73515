//! The clean strategy's document builder.
//!
//! Builds a brand-new minimal document from the typed block sequence, so
//! none of the source site's CSS can leak into the artifact. Every text
//! fragment is escaped on its way into the markup; page text is never
//! interpolated raw.

use crate::results::{Block, PageContent};

const CLEAN_CSS: &str = r#"
  body { font-family: Georgia, 'Times New Roman', serif; color: #000;
         max-width: 44em; margin: 0 auto; line-height: 1.55; }
  h1, h2, h3, h4, h5, h6 { break-after: avoid; color: #000; }
  h1 { font-size: 1.6em; border-bottom: 1px solid #999; padding-bottom: 0.3em; }
  p { break-inside: avoid; }
  ul { padding-left: 1.4em; }
  pre { font-family: 'SF Mono', Consolas, monospace; font-size: 0.85em;
        background: #f4f4f4; padding: 0.8em; break-inside: avoid;
        white-space: pre-wrap; }
  .meta { color: #444; font-size: 0.9em; margin-bottom: 2em; }
"#;

/// Render the extracted content as a standalone HTML document.
pub fn document(content: &PageContent) -> String {
    let mut out = String::with_capacity(content.body.len() * 2);

    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>");
    out.push_str(&escape(&content.title));
    out.push_str("</title><style>");
    out.push_str(CLEAN_CSS);
    out.push_str("</style></head><body>");

    out.push_str("<h1>");
    out.push_str(&escape(&content.title));
    out.push_str("</h1>");

    out.push_str("<div class=\"meta\">");
    push_meta_line(&mut out, "Source", &content.url);
    if let Some(author) = &content.author {
        push_meta_line(&mut out, "Author", author);
    }
    if let Some(description) = &content.description {
        push_meta_line(&mut out, "Description", description);
    }
    push_meta_line(
        &mut out,
        "Reading time",
        &format!("{} min", content.reading_minutes),
    );
    out.push_str("</div>");

    push_blocks(&mut out, &content.blocks);

    out.push_str("</body></html>");
    out
}

fn push_blocks(out: &mut String, blocks: &[Block]) {
    let mut in_list = false;
    for block in blocks {
        // Consecutive list items share one <ul>
        if in_list && !matches!(block, Block::ListItem(_)) {
            out.push_str("</ul>");
            in_list = false;
        }
        match block {
            Block::Heading(level, text) => {
                // The page title already took h1; shift everything down one
                let level = (*level + 1).min(6);
                out.push_str(&format!("<h{level}>{}</h{level}>", escape(text)));
            }
            Block::Paragraph(text) => {
                out.push_str("<p>");
                out.push_str(&escape(text));
                out.push_str("</p>");
            }
            Block::ListItem(text) => {
                if !in_list {
                    out.push_str("<ul>");
                    in_list = true;
                }
                out.push_str("<li>");
                out.push_str(&escape(text));
                out.push_str("</li>");
            }
            Block::Code(text) => {
                out.push_str("<pre>");
                out.push_str(&escape(text));
                out.push_str("</pre>");
            }
        }
    }
    if in_list {
        out.push_str("</ul>");
    }
}

fn push_meta_line(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("{label}: {}<br>", escape(value)));
}

/// Minimal HTML escaping for text interpolated into the document.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_with(title: &str, blocks: Vec<Block>) -> PageContent {
        PageContent {
            url: "https://example.com/learn/a".to_string(),
            title: title.to_string(),
            body: String::new(),
            blocks,
            description: None,
            keywords: None,
            author: None,
            word_count: 0,
            reading_minutes: 1,
            selector: None,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b>"cache" & 'cdn'</b>"#),
            "&lt;b&gt;&quot;cache&quot; &amp; &#39;cdn&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_title_with_markup_is_escaped() {
        let content = content_with("<script>alert(1)</script>", vec![]);
        let html = document(&content);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_blocks_render_as_typed_elements() {
        let content = content_with(
            "Title",
            vec![
                Block::Heading(2, "Section".to_string()),
                Block::Paragraph("Some text".to_string()),
                Block::ListItem("one".to_string()),
                Block::ListItem("two".to_string()),
                Block::Code("let x = 1;".to_string()),
            ],
        );
        let html = document(&content);
        assert!(html.contains("<h3>Section</h3>"));
        assert!(html.contains("<p>Some text</p>"));
        assert!(html.contains("<ul><li>one</li><li>two</li></ul>"));
        assert!(html.contains("<pre>let x = 1;</pre>"));
    }

    #[test]
    fn test_trailing_list_is_closed() {
        let content = content_with("Title", vec![Block::ListItem("last".to_string())]);
        let html = document(&content);
        assert!(html.contains("<ul><li>last</li></ul></body>"));
    }

    #[test]
    fn test_meta_lines_present() {
        let mut content = content_with("Title", vec![]);
        content.author = Some("Docs Team".to_string());
        let html = document(&content);
        assert!(html.contains("Source: https://example.com/learn/a"));
        assert!(html.contains("Author: Docs Team"));
        assert!(html.contains("Reading time: 1 min"));
    }
}
