//! Anchor extraction from bookmark HTML
//!
//! A small streaming scanner instead of a DOM: the input is split into
//! [`Token`]s and only `<a>` elements are materialized. Netscape bookmark
//! files are rarely well-formed (`<DT>` and `<p>` are never closed), so the
//! scanner never fails. Missing attributes become `None`, unclosed anchors
//! end at the next `<a>` or at end of input.

use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::LazyLock;

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#)
        .expect("attribute pattern")
});

/// Raw `(href, text, add_date)` triple read from one `<a>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorCandidate {
    pub href: Option<String>,
    pub inner_text: String,
    pub add_date_raw: Option<String>,
}

/// One lexical unit of the HTML input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag {
        name: &'a str,
        attrs: Attributes<'a>,
        self_closing: bool,
    },
    EndTag {
        name: &'a str,
    },
    Text(&'a str),
}

/// Unparsed attribute section of a start tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes<'a>(&'a str);

impl<'a> Attributes<'a> {
    /// Look up an attribute by name (ASCII case-insensitive), entity-decoded.
    ///
    /// A bare attribute (`<a download>`) yields an empty string.
    pub fn get(&self, name: &str) -> Option<String> {
        ATTRIBUTE.captures_iter(self.0).find_map(|cap| {
            if !cap[1].eq_ignore_ascii_case(name) {
                return None;
            }
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map_or("", |m| m.as_str());
            Some(decode_entities(value).into_owned())
        })
    }
}

/// Streaming tokenizer over an HTML string
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    raw_text_end: Option<&'static str>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_text_end: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Skip a `<script>`/`<style>` body without emitting its text
    fn skip_raw_text(&mut self, closing: &str) {
        self.pos = find_ascii_ci(self.input, self.pos, closing).unwrap_or(self.input.len());
    }

    /// Skip to just past `end`, or to end of input
    fn skip_past(&mut self, end: &str) {
        self.pos = match self.rest().find(end) {
            Some(i) => self.pos + i + end.len(),
            None => self.input.len(),
        };
    }

    fn text_until_next_tag(&mut self, from: usize) -> Token<'a> {
        let start = self.pos;
        let end = self.input[from..]
            .find('<')
            .map_or(self.input.len(), |i| from + i);
        self.pos = end;
        Token::Text(&self.input[start..end])
    }

    fn end_tag(&mut self) -> Token<'a> {
        let name_start = self.pos + 2;
        let name_end = name_start + tag_name_len(&self.input[name_start..]);
        let name = &self.input[name_start..name_end];
        self.pos = name_end;
        self.skip_past(">");
        Token::EndTag { name }
    }

    fn start_tag(&mut self) -> Token<'a> {
        let name_start = self.pos + 1;
        let name_end = name_start + tag_name_len(&self.input[name_start..]);
        let name = &self.input[name_start..name_end];

        let close = find_tag_close(self.input, name_end);
        let attrs_end = close.unwrap_or(self.input.len());
        let mut attrs = &self.input[name_end..attrs_end];
        // `<a href=/x/>` keeps its slash; only a detached `/` self-closes
        let self_closing = match attrs.trim_end().strip_suffix('/') {
            Some(before)
                if before.is_empty()
                    || before.ends_with(|c: char| c.is_whitespace() || c == '"' || c == '\'') =>
            {
                attrs = before;
                true
            }
            _ => false,
        };
        self.pos = close.map_or(self.input.len(), |i| i + 1);

        if !self_closing {
            if name.eq_ignore_ascii_case("script") {
                self.raw_text_end = Some("</script");
            } else if name.eq_ignore_ascii_case("style") {
                self.raw_text_end = Some("</style");
            }
        }

        Token::StartTag {
            name,
            attrs: Attributes(attrs),
            self_closing,
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(closing) = self.raw_text_end.take() {
            self.skip_raw_text(closing);
        }

        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return None;
            }
            if !rest.starts_with('<') {
                return Some(self.text_until_next_tag(self.pos));
            }

            let bytes = rest.as_bytes();
            match bytes.get(1) {
                Some(b'!') if rest.starts_with("<!--") => self.skip_past("-->"),
                Some(b'!') | Some(b'?') => self.skip_past(">"),
                Some(b'/') if bytes.get(2).is_some_and(u8::is_ascii_alphabetic) => {
                    return Some(self.end_tag())
                }
                Some(b) if b.is_ascii_alphabetic() => return Some(self.start_tag()),
                // a lone '<' is plain text
                _ => return Some(self.text_until_next_tag(self.pos + 1)),
            }
        }
    }
}

/// Extract one candidate per `<a>` element, in document order
pub fn extract_anchors(html: &str) -> Vec<AnchorCandidate> {
    let mut anchors = Vec::new();
    let mut current: Option<AnchorCandidate> = None;

    for token in Tokenizer::new(html) {
        match token {
            // `<a/>` is not a void element; its text runs to `</a>` or the next `<a>`
            Token::StartTag { name, attrs, .. } if name.eq_ignore_ascii_case("a") => {
                anchors.extend(current.take());
                current = Some(AnchorCandidate {
                    href: attrs.get("href"),
                    inner_text: String::new(),
                    add_date_raw: attrs.get("add_date"),
                });
            }
            Token::EndTag { name } if name.eq_ignore_ascii_case("a") => {
                anchors.extend(current.take());
            }
            Token::Text(text) => {
                if let Some(anchor) = current.as_mut() {
                    anchor.inner_text.push_str(&decode_entities(text));
                }
            }
            _ => {}
        }
    }

    anchors.extend(current);
    anchors
}

/// Decode the character references that show up in bookmark exports.
///
/// Unknown or malformed references are kept verbatim.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

fn tag_name_len(s: &str) -> usize {
    s.bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b':' | b'_'))
        .count()
}

/// Index of the `>` closing a start tag, honoring quoted attribute values.
///
/// Falls back to the first `>` when quotes are unbalanced.
fn find_tag_close(input: &str, from: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut quote: Option<u8> = None;

    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i),
            (None, _) => {}
        }
    }

    input[from..].find('>').map(|i| from + i)
}

fn find_ascii_ci(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack.as_bytes()[from..]
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|i| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(href: Option<&str>, text: &str, add_date: Option<&str>) -> AnchorCandidate {
        AnchorCandidate {
            href: href.map(String::from),
            inner_text: text.to_string(),
            add_date_raw: add_date.map(String::from),
        }
    }

    #[test]
    fn test_netscape_export() {
        let html = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<!-- This is an automatically generated file. -->
<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
    <DT><H3 ADD_DATE="1600000000" PERSONAL_TOOLBAR_FOLDER="true">Bookmarks bar</H3>
    <DL><p>
        <DT><A HREF="https://www.rust-lang.org/" ADD_DATE="1600000001" ICON="data:image/png;base64,AAA=">Rust</A>
        <DT><A HREF="https://docs.rs/?q=a&amp;b=c" ADD_DATE="1600000002">Docs &amp; crates</A>
    </DL><p>
</DL><p>
"#;
        let anchors = extract_anchors(html);
        assert_eq!(
            anchors,
            vec![
                anchor(Some("https://www.rust-lang.org/"), "Rust", Some("1600000001")),
                anchor(
                    Some("https://docs.rs/?q=a&b=c"),
                    "Docs & crates",
                    Some("1600000002")
                ),
            ]
        );
    }

    #[test]
    fn test_case_insensitive_tags_and_attributes() {
        let html = r#"<a Href='https://a.example' Add_Date=1234567890>A</a><A href="https://b.example">B</A>"#;
        let anchors = extract_anchors(html);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].href.as_deref(), Some("https://a.example"));
        assert_eq!(anchors[0].add_date_raw.as_deref(), Some("1234567890"));
        assert_eq!(anchors[1].inner_text, "B");
        assert_eq!(anchors[1].add_date_raw, None);
    }

    #[test]
    fn test_missing_href_and_nested_markup() {
        let anchors = extract_anchors("<a name=top><b>Bold</b> text</a>");
        assert_eq!(anchors, vec![anchor(None, "Bold text", None)]);
    }

    #[test]
    fn test_unclosed_anchor() {
        let anchors =
            extract_anchors(r#"<a href="https://one.example">One<a href="https://two.example">Two"#);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].inner_text, "One");
        assert_eq!(anchors[1].inner_text, "Two");
    }

    #[test]
    fn test_truncated_tag() {
        let anchors = extract_anchors(r#"<p>intro</p><a href="https://cut.example" add_da"#);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].href.as_deref(), Some("https://cut.example"));
        assert_eq!(anchors[0].inner_text, "");
    }

    #[test]
    fn test_unquoted_href_with_trailing_slash() {
        let anchors = extract_anchors("<a href=https://u.example/>U</a><a href='https://s.example'/>");
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].href.as_deref(), Some("https://u.example/"));
        assert_eq!(anchors[0].inner_text, "U");
        assert_eq!(anchors[1].href.as_deref(), Some("https://s.example"));
        assert_eq!(anchors[1].inner_text, "");
    }

    #[test]
    fn test_self_closing_anchor_keeps_following_text() {
        let anchors = extract_anchors(
            r#"<A HREF="https://x.example/"/>Title</A><a href="https://y.example" />Y<a href="https://z.example">Z</a>"#,
        );
        assert_eq!(
            anchors,
            vec![
                anchor(Some("https://x.example/"), "Title", None),
                anchor(Some("https://y.example"), "Y", None),
                anchor(Some("https://z.example"), "Z", None),
            ]
        );
    }

    #[test]
    fn test_quoted_gt_in_attribute() {
        let anchors = extract_anchors(r#"<a title="a > b" href="https://q.example">Q</a>"#);
        assert_eq!(anchors[0].href.as_deref(), Some("https://q.example"));
        assert_eq!(anchors[0].inner_text, "Q");
    }

    #[test]
    fn test_script_and_comments_ignored() {
        let html = r#"<script>var s = "<a href='https://evil.example'>x</a>";</SCRIPT>
<!-- <a href="https://commented.example">c</a> -->
<a href="https://real.example">real</a>"#;
        let anchors = extract_anchors(html);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].href.as_deref(), Some("https://real.example"));
    }

    #[test]
    fn test_garbage_input() {
        assert!(extract_anchors("").is_empty());
        assert!(extract_anchors("just text < not a tag").is_empty());
        assert!(extract_anchors("<<<>>>&&&;</").is_empty());
        assert_eq!(extract_anchors("\u{fffd}<a\u{e9}>"), vec![anchor(None, "", None)]);
    }

    #[test]
    fn test_tokenizer_stream() {
        let tokens: Vec<Token> = Tokenizer::new("<p>hi<br/></p>").collect();
        assert!(matches!(tokens[0], Token::StartTag { name: "p", self_closing: false, .. }));
        assert_eq!(tokens[1], Token::Text("hi"));
        assert!(matches!(tokens[2], Token::StartTag { name: "br", self_closing: true, .. }));
        assert_eq!(tokens[3], Token::EndTag { name: "p" });
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("plain"), "plain");
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#39;q&#x27; &quot;"), "'q' \"");
        assert_eq!(decode_entities("AT&T &unknown; &"), "AT&T &unknown; &");
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
    }
}
