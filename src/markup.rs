use crate::post::Post;

pub const PAGE_BREAK: &str = "page-break-after: always;";

pub const STYLESHEET: &str = "BODY {color: black;} IMG {display: block; margin: 0 auto;}";

/// Escape text for use in XHTML content and attribute values.
///
/// Characters XML 1.0 cannot represent at all are dropped.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(|&c| is_xml_char(c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..)
}

/// Header line and body of one post.
pub fn text_block(post: &Post, page_break: bool) -> String {
    let style = if page_break { PAGE_BREAK } else { "" };
    let body = escape_xml(&post.text).replace("\r\n", "\n").replace('\n', "<br/>");
    format!(
        "<p style='{}'><b>{} - {}</b>: {}</p>\n",
        style,
        post.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        escape_xml(&post.channel_title),
        body
    )
}

/// An image alone on its page.
pub fn image_fragment(filename: &str, position: usize) -> String {
    format!(
        "<div style='{}'><img src='{}' alt='Image {}' /></div>\n",
        PAGE_BREAK,
        escape_xml(filename),
        position
    )
}
