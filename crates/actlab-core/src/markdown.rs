//! Markdown to HTML for notebook pages.
//!
//! Active Collab strips `<pre>` formatting from page bodies, so code blocks
//! are rewritten into a monospace blockquote with explicit spacing and line
//! breaks.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

pub fn to_html(text: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(text, options);

    let mut events: Vec<Event<'_>> = Vec::new();
    let mut code: Option<String> = None;
    for event in parser {
        match (event, code.as_mut()) {
            (Event::Start(Tag::CodeBlock(_)), None) => code = Some(String::new()),
            (Event::End(TagEnd::CodeBlock), Some(buf)) => {
                let block = code_block_html(buf);
                events.push(Event::Html(CowStr::from(block)));
                code = None;
            }
            (Event::Text(t), Some(buf)) => buf.push_str(&t),
            (_, Some(_)) => {}
            (other, None) => events.push(other),
        }
    }

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Escape a code block so it survives as flowing text. Order matters: `&`
/// first so later entities are not double escaped.
pub fn code_block_html(code: &str) -> String {
    let text = code
        .trim_end_matches(['\n', '\r'])
        .replace('\t', "    ")
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace(' ', "&nbsp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace("\r\n", "<br/>")
        .replace('\n', "<br/>");
    format!("<blockquote style='font-family:monospace'><p>{text}</p></blockquote>\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prose_renders_normally() {
        let html = to_html("# Title\n\nSome *emphasis*.\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
    }

    #[test]
    fn fenced_code_becomes_blockquote() {
        let html = to_html("```\nif a < b {\n\treturn \"x\";\n}\n```\n");
        assert!(!html.contains("<pre>"));
        assert!(html.contains(
            "<blockquote style='font-family:monospace'><p>if&nbsp;a&nbsp;&lt;&nbsp;b&nbsp;{<br/>\
             &nbsp;&nbsp;&nbsp;&nbsp;return&nbsp;&quot;x&quot;;<br/>}</p></blockquote>"
        ));
    }

    #[test]
    fn indented_code_is_rewritten_too() {
        let html = to_html("para\n\n    a && b\n");
        assert!(html.contains("<p>para</p>"));
        assert!(html.contains("<p>a&nbsp;&amp;&amp;&nbsp;b</p>"));
    }

    #[test]
    fn inline_code_is_untouched() {
        let html = to_html("use `x < y` here\n");
        assert!(html.contains("<code>x &lt; y</code>"));
    }

    #[test]
    fn escape_order() {
        assert_eq!(
            code_block_html("<a href=\"&\">"),
            "<blockquote style='font-family:monospace'><p>&lt;a&nbsp;href=&quot;&amp;&quot;&gt;</p></blockquote>\n"
        );
    }
}
