//! Download location extraction from file details.
//!
//! The provider reports download locations in one of three shapes. They
//! are tried in a fixed priority order; the first usable URL wins.

use crate::types::FileInfo;

/// A candidate download location as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSource {
    /// The canonical web-content link.
    Direct(String),
    /// Named alternative links in document order.
    Named(Vec<(String, String)>),
    /// Media variants, in provider order.
    MediaList(Vec<String>),
}

impl LinkSource {
    /// First non-empty URL carried by this source.
    pub fn first_url(&self) -> Option<&str> {
        match self {
            Self::Direct(url) => non_empty(url),
            Self::Named(links) => links.iter().find_map(|(_, url)| non_empty(url)),
            Self::MediaList(urls) => urls.iter().find_map(|url| non_empty(url)),
        }
    }
}

fn non_empty(url: &str) -> Option<&str> {
    if url.is_empty() { None } else { Some(url) }
}

type Strategy = fn(&FileInfo) -> Option<LinkSource>;

/// Extraction strategies, highest priority first.
const STRATEGIES: [Strategy; 3] = [direct_link, named_links, media_links];

fn direct_link(info: &FileInfo) -> Option<LinkSource> {
    info.web_content_link.clone().map(LinkSource::Direct)
}

fn named_links(info: &FileInfo) -> Option<LinkSource> {
    let links = info.links.as_ref()?;
    let named = links
        .iter()
        .map(|(name, value)| {
            let url = value
                .get("url")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            (name.clone(), url.to_string())
        })
        .collect();
    Some(LinkSource::Named(named))
}

fn media_links(info: &FileInfo) -> Option<LinkSource> {
    let medias = info.medias.as_ref()?;
    let urls = medias
        .iter()
        .filter_map(|m| m.link.as_ref().map(|l| l.url.clone()))
        .collect();
    Some(LinkSource::MediaList(urls))
}

impl FileInfo {
    /// Candidate sources present in this response, in priority order.
    pub fn link_sources(&self) -> Vec<LinkSource> {
        STRATEGIES.iter().filter_map(|s| s(self)).collect()
    }
}

/// Returns the best download URL, or an empty string if none is usable.
///
/// An empty result means "no link available" and is not an error.
pub fn resolve_link(info: &FileInfo) -> String {
    info.link_sources()
        .iter()
        .find_map(LinkSource::first_url)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(json: &str) -> FileInfo {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn direct_link_wins() {
        let fi = info(
            r#"{"web_content_link":"https://dl/direct",
                "links":{"a":{"url":"https://dl/named"}},
                "medias":[{"link":{"url":"https://dl/media"}}]}"#,
        );
        assert_eq!(resolve_link(&fi), "https://dl/direct");
    }

    #[test]
    fn empty_direct_falls_back_to_named_in_document_order() {
        let fi = info(
            r#"{"web_content_link":"",
                "links":{"zz":{"url":""},"yy":{"url":"https://dl/yy"},
                         "aa":{"url":"https://dl/aa"}}}"#,
        );
        assert_eq!(resolve_link(&fi), "https://dl/yy");
    }

    #[test]
    fn media_list_is_last_resort() {
        let fi = info(
            r#"{"links":{},
                "medias":[{"link":null},{"link":{"url":""}},{"link":{"url":"https://dl/m2"}}]}"#,
        );
        assert_eq!(resolve_link(&fi), "https://dl/m2");
    }

    #[test]
    fn nothing_usable_yields_empty() {
        assert_eq!(resolve_link(&FileInfo::default()), "");
        let fi = info(r#"{"web_content_link":"","links":{"a":{}},"medias":[]}"#);
        assert_eq!(resolve_link(&fi), "");
    }

    #[test]
    fn sources_listed_in_priority_order() {
        let fi = info(
            r#"{"web_content_link":"https://d",
                "medias":[{"link":{"url":"https://m"}}]}"#,
        );
        let sources = fi.link_sources();
        assert_eq!(sources.len(), 2);
        assert!(matches!(sources[0], LinkSource::Direct(_)));
        assert!(matches!(sources[1], LinkSource::MediaList(_)));
    }

    #[test]
    fn named_link_without_url_is_skipped() {
        let src = LinkSource::Named(vec![
            ("a".into(), String::new()),
            ("b".into(), "https://b".into()),
        ]);
        assert_eq!(src.first_url(), Some("https://b"));
    }
}
