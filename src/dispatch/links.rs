//! URL building for website, search and YouTube actions

/// Known web search engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEngine {
    Google,
    DuckDuckGo,
    Bing,
}

impl SearchEngine {
    /// Parse an engine name; unknown names yield `None`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace(' ', "").as_str() {
            "google" => Some(Self::Google),
            "duckduckgo" | "ddg" => Some(Self::DuckDuckGo),
            "bing" => Some(Self::Bing),
            _ => None,
        }
    }

    /// Name as spoken back to the user
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::DuckDuckGo => "DuckDuckGo",
            Self::Bing => "Bing",
        }
    }

    /// Search URL for `query`
    #[must_use]
    pub fn search_url(self, query: &str) -> String {
        let q = quote_plus(query);
        match self {
            Self::Google => format!("https://www.google.com/search?q={q}"),
            Self::DuckDuckGo => format!("https://duckduckgo.com/?q={q}"),
            Self::Bing => format!("https://www.bing.com/search?q={q}"),
        }
    }
}

/// Resolve the requested engine, falling back to the configured default
/// and finally to Google
#[must_use]
pub fn resolve_engine(requested: Option<&str>, default: &str) -> SearchEngine {
    requested
        .and_then(SearchEngine::parse)
        .or_else(|| SearchEngine::parse(default))
        .unwrap_or(SearchEngine::Google)
}

/// YouTube results page for `query`
#[must_use]
pub fn youtube_search_url(query: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}",
        quote_plus(query)
    )
}

/// Make a spoken address absolute
///
/// `https` is assumed when no scheme is given, and a leading `www.` is
/// dropped in that case only. Addresses with a scheme pass through.
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    let url = raw.trim().trim_end_matches(['.', ',']);
    let lower = url.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return url.to_string();
    }
    let host = if lower.starts_with("www.") { &url[4..] } else { url };
    format!("https://{host}")
}

/// Form-style encoding: spaces become `+`
fn quote_plus(query: &str) -> String {
    urlencoding::encode(query.trim()).replace("%20", "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_prepended_once() {
        assert_eq!(normalize_url("youtube.com"), "https://youtube.com");
        assert_eq!(normalize_url("www.github.com."), "https://github.com");
        assert_eq!(normalize_url("web.dev"), "https://web.dev");
        assert_eq!(normalize_url("http://example.org"), "http://example.org");
        assert_eq!(normalize_url("https://www.rust-lang.org"), "https://www.rust-lang.org");
        assert_eq!(normalize_url("HTTPS://Example.org"), "HTTPS://Example.org");
    }

    #[test]
    fn youtube_query_is_encoded() {
        assert_eq!(
            youtube_search_url("bohemian rhapsody queen"),
            "https://www.youtube.com/results?search_query=bohemian+rhapsody+queen"
        );
        assert_eq!(
            youtube_search_url("AC/DC & co"),
            "https://www.youtube.com/results?search_query=AC%2FDC+%26+co"
        );
    }

    #[test]
    fn unknown_engine_falls_back_to_default() {
        assert_eq!(resolve_engine(Some("altavista"), "bing"), SearchEngine::Bing);
        assert_eq!(resolve_engine(None, "duckduckgo"), SearchEngine::DuckDuckGo);
        assert_eq!(resolve_engine(Some("Bing"), "google"), SearchEngine::Bing);
        assert_eq!(resolve_engine(None, "nonsense"), SearchEngine::Google);
    }

    #[test]
    fn engine_urls() {
        assert_eq!(
            SearchEngine::DuckDuckGo.search_url("rust lang"),
            "https://duckduckgo.com/?q=rust+lang"
        );
    }
}
