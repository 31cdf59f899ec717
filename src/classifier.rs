//! Domain-based link classification.
//!
//! Every href pulled out of a chat export is classified by its host. Only
//! [`LinkCategory::TargetService`] links ever become download jobs; the
//! other categories feed the analysis breakdown.

use std::fmt;

use tracing::trace;
use url::Url;

/// File-hosting domains recognised as the target service by default.
pub const DEFAULT_TARGET_DOMAINS: [&str; 10] = [
    "terabox.com",
    "terabox.app",
    "teraboxlink.com",
    "freeterabox.com",
    "1024terabox.com",
    "terafileshare.com",
    "terasharelink.com",
    "teraboxshare.com",
    "4funbox.co",
    "mirrobox.com",
];

/// Category label used for target-service links in reports.
pub const TARGET_SERVICE_LABEL: &str = "TeraBox";

/// Category a link falls into, derived from its host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkCategory {
    /// Host matches the configured file-hosting domain list.
    TargetService,
    /// Telegram (any host containing `t.me` or `telegram`).
    Telegram,
    /// Instagram.
    Instagram,
    /// Any other host, carried as the bare domain (leading `www.` removed).
    Other(String),
    /// The URL could not be parsed or has no host (`mailto:` included).
    Invalid,
}

impl LinkCategory {
    /// Returns the label shown in analysis breakdowns.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::TargetService => TARGET_SERVICE_LABEL,
            Self::Telegram => "Telegram",
            Self::Instagram => "Instagram",
            Self::Other(domain) => domain,
            Self::Invalid => "Invalid URL",
        }
    }

    /// Returns true for links that generate download jobs.
    #[must_use]
    pub fn is_target(&self) -> bool {
        matches!(self, Self::TargetService)
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies URLs against a configured target-service domain list.
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    target_domains: Vec<String>,
}

impl Default for LinkClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_DOMAINS)
    }
}

impl LinkClassifier {
    /// Creates a classifier for the given target-service domains.
    ///
    /// Domains are matched case-insensitively; a leading `www.` on a
    /// configured domain is ignored.
    #[must_use]
    pub fn new<I, S>(target_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let target_domains = target_domains
            .into_iter()
            .map(|domain| strip_www(&domain.as_ref().trim().to_ascii_lowercase()).to_string())
            .filter(|domain| !domain.is_empty())
            .collect();
        Self { target_domains }
    }

    /// Returns the configured target-service domains.
    #[must_use]
    pub fn target_domains(&self) -> &[String] {
        &self.target_domains
    }

    /// Classifies a URL by its host.
    ///
    /// Target-service domains take priority over every other rule. A host
    /// matches a target domain when the domain occurs in it, so mirror and
    /// regional subdomains (`1024terabox.com`, `dm.terabox.app`) are caught.
    /// Never fails: unparseable input is [`LinkCategory::Invalid`].
    #[must_use]
    pub fn classify(&self, url: &str) -> LinkCategory {
        let Ok(parsed) = Url::parse(url.trim()) else {
            trace!(url, "unparseable link");
            return LinkCategory::Invalid;
        };
        let Some(host) = parsed.host_str() else {
            return LinkCategory::Invalid;
        };
        let host = host.to_ascii_lowercase();
        let domain = strip_www(&host);
        if domain.is_empty() {
            return LinkCategory::Invalid;
        }

        if self
            .target_domains
            .iter()
            .any(|target| domain.contains(target.as_str()))
        {
            return LinkCategory::TargetService;
        }
        if domain.contains("t.me") || domain.contains("telegram") {
            return LinkCategory::Telegram;
        }
        if domain.contains("instagram.com") {
            return LinkCategory::Instagram;
        }
        LinkCategory::Other(domain.to_string())
    }

    /// Shorthand for `classify(url).is_target()`.
    #[must_use]
    pub fn is_target(&self, url: &str) -> bool {
        self.classify(url).is_target()
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_target_domain() {
        let classifier = LinkClassifier::default();
        assert_eq!(
            classifier.classify("https://terabox.com/s/1abcDEF"),
            LinkCategory::TargetService
        );
        assert_eq!(
            classifier.classify("https://www.1024terabox.com/s/1xyz"),
            LinkCategory::TargetService
        );
        assert_eq!(
            classifier.classify("https://dm.terabox.app/sharing/link?surl=abc"),
            LinkCategory::TargetService
        );
    }

    #[test]
    fn test_classify_target_is_case_insensitive() {
        let classifier = LinkClassifier::default();
        assert!(classifier.is_target("https://WWW.TeraBox.com/s/1abc"));
    }

    #[test]
    fn test_classify_secondary_services() {
        let classifier = LinkClassifier::default();
        assert_eq!(
            classifier.classify("https://t.me/somechannel/42"),
            LinkCategory::Telegram
        );
        assert_eq!(
            classifier.classify("https://web.telegram.org/k/"),
            LinkCategory::Telegram
        );
        assert_eq!(
            classifier.classify("https://dl.t.me.cdn.example/f/1"),
            LinkCategory::Telegram
        );
        assert_eq!(
            classifier.classify("https://www.instagram.com/p/xyz/"),
            LinkCategory::Instagram
        );
    }

    #[test]
    fn test_classify_other_strips_www() {
        let classifier = LinkClassifier::default();
        assert_eq!(
            classifier.classify("https://www.example.org/page"),
            LinkCategory::Other("example.org".to_string())
        );
    }

    #[test]
    fn test_classify_invalid() {
        let classifier = LinkClassifier::default();
        assert_eq!(classifier.classify("not a url"), LinkCategory::Invalid);
        assert_eq!(classifier.classify(""), LinkCategory::Invalid);
        assert_eq!(classifier.classify("mailto:someone@example.com"), LinkCategory::Invalid);
    }

    #[test]
    fn test_custom_domains_replace_defaults() {
        let classifier = LinkClassifier::new(["www.files.example"]);
        assert!(classifier.is_target("https://files.example/s/1"));
        assert!(!classifier.is_target("https://terabox.com/s/1"));
        assert_eq!(classifier.target_domains(), ["files.example"]);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(LinkCategory::TargetService.to_string(), "TeraBox");
        assert_eq!(LinkCategory::Invalid.to_string(), "Invalid URL");
        assert_eq!(
            LinkCategory::Other("example.org".to_string()).to_string(),
            "example.org"
        );
    }
}
