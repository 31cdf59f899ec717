//! HTML chat-export parsing: message containers and their anchors.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// Message body containers in a chat export (`<div class="text">`).
#[allow(clippy::expect_used)]
static MESSAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.text").expect("message selector is valid")); // Static pattern, safe to panic

/// Anchors carrying an href.
#[allow(clippy::expect_used)]
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid")); // Static pattern, safe to panic

/// One anchor inside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Raw href attribute value.
    pub href: String,
    /// Visible text of the anchor, all descendant text nodes joined.
    pub text: String,
}

/// One message with its anchors in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Anchors in document order, repeats included.
    pub anchors: Vec<Anchor>,
}

impl Message {
    /// Visible text of the first anchor pointing at `href`.
    #[must_use]
    pub fn anchor_text(&self, href: &str) -> Option<&str> {
        self.anchors
            .iter()
            .find(|anchor| anchor.href == href)
            .map(|anchor| anchor.text.as_str())
    }
}

/// Extracts all messages from an HTML chat export, in document order.
#[must_use]
pub fn extract_messages(html: &str) -> Vec<Message> {
    let document = Html::parse_document(html);
    document
        .select(&MESSAGE_SELECTOR)
        .map(|message| Message {
            anchors: message.select(&ANCHOR_SELECTOR).filter_map(anchor).collect(),
        })
        .collect()
}

fn anchor(element: ElementRef<'_>) -> Option<Anchor> {
    let href = element.value().attr("href")?;
    Some(Anchor {
        href: href.to_string(),
        text: element.text().collect(),
    })
}
