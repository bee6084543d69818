//! Markdown body handling: plain-text extraction and HTML rendering.

use pulldown_cmark::{html, Event, Options, Parser, TagEnd};

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
}

/// Render a Markdown body to HTML.
///
/// Raw HTML in the source is escaped rather than passed through, since bodies
/// are rendered into public pages.
pub fn render_html(body: &str) -> String {
    let parser = Parser::new_ext(body, options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Extract the readable text of a Markdown body with whitespace collapsed.
///
/// Markup, raw HTML and image alt text are dropped. Block boundaries become a
/// single space.
pub fn plain_text(body: &str) -> String {
    let mut raw = String::with_capacity(body.len());
    let mut in_image = 0usize;

    for event in Parser::new_ext(body, options()) {
        match event {
            Event::Start(pulldown_cmark::Tag::Image { .. }) => in_image += 1,
            Event::End(TagEnd::Image) => in_image = in_image.saturating_sub(1),
            Event::Text(text) | Event::Code(text) if in_image == 0 => raw.push_str(&text),
            Event::SoftBreak | Event::HardBreak | Event::Rule => raw.push(' '),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_)
                | TagEnd::TableCell,
            ) => raw.push(' '),
            _ => {}
        }
    }

    collapse_whitespace(&raw)
}

/// Collapse every run of whitespace into one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Count words in the readable text of a Markdown body.
pub fn word_count(body: &str) -> usize {
    plain_text(body).split_whitespace().count()
}
