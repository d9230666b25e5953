/// Text helpers shared by the parser and the transformer

/// URL utilities for feed entries
pub mod url {
    use url::Url;

    /// Only absolute http(s) links can serve as canonical article links
    pub fn is_http_url(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => url.scheme() == "http" || url.scheme() == "https",
            Err(_) => false,
        }
    }
}

/// HTML handling for feed bodies
pub mod html {
    use regex::Regex;
    use std::sync::LazyLock;

    /// Extract clean text content from HTML
    pub fn extract_text(html: &str) -> String {
        html.chars()
            .fold((String::new(), false), |(mut text, in_tag), c| match c {
                '<' => (text, true),
                '>' => {
                    text.push(' ');
                    (text, false)
                }
                _ if !in_tag => {
                    text.push(c);
                    (text, in_tag)
                }
                _ => (text, in_tag),
            })
            .0
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `src` of the first `<img>` tag, if any. The greedy attribute run
    /// lands on the last `src=` in the tag, so a lazy-load `data-src`
    /// placeholder ahead of the real `src` is skipped.
    pub fn first_image_src(html: &str) -> Option<String> {
        static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"(?i)<img[^>]+src="([^">]+)""#).expect("valid regex")
        });

        IMG_SRC_RE
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Character-safe truncation
pub mod text {
    /// At most `max_chars` characters, never splitting a code point
    pub fn prefix_chars(text: &str, max_chars: usize) -> &str {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }

    pub fn char_len(text: &str) -> usize {
        text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let text = html::extract_text("<p>Hello <b>world</b></p>\n<p>again</p>");
        assert_eq!(text, "Hello world again");
    }

    #[test]
    fn finds_first_image_source() {
        let body = r#"<p>intro</p><IMG alt="x" SRC="https://cdn.example.com/a.png"><img src="https://cdn.example.com/b.png">"#;
        assert_eq!(
            html::first_image_src(body).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(html::first_image_src("<p>no images</p>"), None);
    }

    #[test]
    fn lazy_loaded_image_resolves_to_real_source() {
        let body = r#"<img data-src="https://cdn.example.com/placeholder.gif" src="https://cdn.example.com/real.jpg">"#;
        assert_eq!(
            html::first_image_src(body).as_deref(),
            Some("https://cdn.example.com/real.jpg")
        );
    }

    #[test]
    fn prefix_respects_multibyte_characters() {
        assert_eq!(text::prefix_chars("héllo", 2), "hé");
        assert_eq!(text::prefix_chars("abc", 10), "abc");
        assert_eq!(text::char_len("\u{2014}ab"), 3);
    }

    #[test]
    fn http_url_check() {
        assert!(url::is_http_url("https://x/1"));
        assert!(!url::is_http_url("mailto:someone@example.com"));
    }
}
