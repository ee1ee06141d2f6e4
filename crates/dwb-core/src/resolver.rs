//! Link resolution: fetch a hosting page and extract the direct video URL.
//!
//! Single blocking fetch + parse per request, no retry, no caching. Every
//! failure mode (network error, timeout, non-2xx, parse miss) collapses to
//! "not found"; detail stays at debug level.

use std::time::Duration;

use scraper::{Html, Selector};

use crate::{errors::Error, Result};

// Browser-like identity to avoid trivial bot-blocking.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Clone)]
pub struct LinkResolver {
    http: reqwest::Client,
}

impl LinkResolver {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| Error::External(format!("http client build: {e}")))?;

        Ok(Self { http })
    }

    /// Fetch the hosting page and return the embedded direct media URL,
    /// or `None` for any failure.
    pub async fn resolve_direct_link(&self, source_url: &str) -> Option<String> {
        let resp = match self.http.get(source_url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!("fetch {source_url} failed: {e}");
                return None;
            }
        };

        if !resp.status().is_success() {
            tracing::debug!("fetch {source_url} returned {}", resp.status());
            return None;
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("read body of {source_url} failed: {e}");
                return None;
            }
        };

        extract_video_source(&body)
    }
}

/// First `<video>` element, first `<source>` descendant, non-empty `src`.
pub fn extract_video_source(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let video_sel = Selector::parse("video").ok()?;
    let source_sel = Selector::parse("source").ok()?;

    let video = doc.select(&video_sel).next()?;
    let source = video.select(&source_sel).next()?;

    let src = source.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }
    Some(src.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_embedded_source_url() {
        let html = r#"<video><source src="https://cdn.example/video.mp4"></source></video>"#;
        assert_eq!(
            extract_video_source(html).as_deref(),
            Some("https://cdn.example/video.mp4")
        );
    }

    #[test]
    fn extracts_from_a_full_page() {
        let html = r#"
            <html><head><title>watch</title></head>
            <body>
              <div class="player">
                <video controls poster="p.jpg">
                  <source src="https://cdn.example/a.mp4" type="video/mp4">
                </video>
              </div>
            </body></html>"#;
        assert_eq!(
            extract_video_source(html).as_deref(),
            Some("https://cdn.example/a.mp4")
        );
    }

    #[test]
    fn first_video_and_first_source_win() {
        let html = r#"
            <video><source src="https://cdn.example/first.mp4"><source src="https://cdn.example/second.mp4"></video>
            <video><source src="https://cdn.example/other.mp4"></video>"#;
        assert_eq!(
            extract_video_source(html).as_deref(),
            Some("https://cdn.example/first.mp4")
        );
    }

    #[test]
    fn page_without_video_is_not_found() {
        assert_eq!(extract_video_source("<html><body>nope</body></html>"), None);
    }

    #[test]
    fn video_without_source_is_not_found() {
        assert_eq!(
            extract_video_source(r#"<video src="https://cdn.example/inline.mp4"></video>"#),
            None
        );
    }

    #[test]
    fn empty_or_missing_src_is_not_found() {
        assert_eq!(extract_video_source("<video><source src=\"\"></video>"), None);
        assert_eq!(
            extract_video_source("<video><source type=\"video/mp4\"></video>"),
            None
        );
        assert_eq!(extract_video_source("<video><source src=\"   \"></video>"), None);
    }

    #[tokio::test]
    async fn unreachable_host_collapses_to_not_found() {
        let resolver = LinkResolver::new(Duration::from_millis(200)).unwrap();
        // Reserved TEST-NET address: connection cannot succeed.
        let got = resolver
            .resolve_direct_link("http://192.0.2.1/watch/abc")
            .await;
        assert_eq!(got, None);
    }
}
