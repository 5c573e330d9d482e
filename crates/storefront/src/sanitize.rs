//! HTML sanitization for hub-supplied rich text.
//!
//! Product descriptions arrive from the hub as HTML authored by vendors.
//! They render with `|safe`, so everything that goes into a template must
//! pass through here first.

use std::collections::HashSet;
use std::sync::LazyLock;

use ammonia::Builder;

static DESCRIPTION_CLEANER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let tags: HashSet<&str> = [
        "p", "br", "b", "strong", "i", "em", "u", "s", "ul", "ol", "li", "a", "h3", "h4",
        "blockquote", "table", "thead", "tbody", "tr", "th", "td",
    ]
    .into_iter()
    .collect();

    let mut builder = Builder::default();
    builder
        .tags(tags)
        .link_rel(Some("noopener noreferrer"))
        .url_schemes(["http", "https", "mailto"].into_iter().collect());
    builder
});

/// Sanitize vendor-authored description HTML for safe rendering.
#[must_use]
pub fn clean_description(html: &str) -> String {
    DESCRIPTION_CLEANER.clean(html).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_formatting_tags() {
        let cleaned = clean_description("<p>Крепкий <strong>чай</strong></p>");
        assert_eq!(cleaned, "<p>Крепкий <strong>чай</strong></p>");
    }

    #[test]
    fn test_strips_scripts() {
        let cleaned = clean_description("<p>ок</p><script>alert(1)</script>");
        assert!(!cleaned.contains("script"));
        assert!(cleaned.contains("<p>ок</p>"));
    }

    #[test]
    fn test_strips_event_handlers_and_js_urls() {
        let cleaned = clean_description(r#"<a href="javascript:alert(1)" onclick="x()">ссылка</a>"#);
        assert!(!cleaned.contains("javascript:"));
        assert!(!cleaned.contains("onclick"));
        assert!(cleaned.contains("ссылка"));
    }
}
