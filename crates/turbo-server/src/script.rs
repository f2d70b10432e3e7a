//! `<script>` markup that loads turbo.js and connects the push socket.

const CDN: &str = "https://cdn.jsdelivr.net/npm";
const PACKAGE: &str = "@hotwired/turbo";
const ENTRY: &str = "dist/turbo.es2017-esm.js";
/// turbo.js release pinned by default.
pub const DEFAULT_VERSION: &str = "7.3.0";

/// Where the page loads turbo.js from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptSource {
    /// A pinned release from the CDN.
    Version(String),
    /// The latest release from the CDN.
    Latest,
    /// A self-hosted or otherwise custom URL.
    Url(String),
}

impl Default for ScriptSource {
    fn default() -> Self {
        Self::Version(DEFAULT_VERSION.into())
    }
}

impl ScriptSource {
    pub fn url(&self) -> String {
        match self {
            Self::Version(v) => format!("{CDN}/{PACKAGE}@{v}/{ENTRY}"),
            Self::Latest => format!("{CDN}/{PACKAGE}/{ENTRY}"),
            Self::Url(url) => url.clone(),
        }
    }
}

/// Render the script tag for the page `<head>`.
///
/// With a WebSocket route, the module also registers the socket as a stream
/// source, choosing `wss:` when the page itself is served over https.
pub fn render(source: &ScriptSource, websocket_route: Option<&str>) -> String {
    let url = source.url();
    match websocket_route {
        Some(route) => format!(
            r#"<script type="module">
import * as Turbo from "{url}";
const scheme = location.protocol === "https:" ? "wss:" : "ws:";
Turbo.connectStreamSource(new WebSocket(`${{scheme}}//${{location.host}}{route}`));
</script>"#
        ),
        None => format!(r#"<script type="module" src="{url}"></script>"#),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_source_is_pinned() {
        let url = ScriptSource::default().url();
        assert!(url.contains("@hotwired/turbo@7.3.0/dist"), "got: {url}");
    }

    #[test]
    fn custom_version() {
        let url = ScriptSource::Version("1.2.3".into()).url();
        assert!(url.contains("@hotwired/turbo@1.2.3/dist"), "got: {url}");
    }

    #[test]
    fn latest_version_has_no_pin() {
        let url = ScriptSource::Latest.url();
        assert!(url.contains("@hotwired/turbo/dist"), "got: {url}");
    }

    #[test]
    fn custom_url_is_verbatim() {
        assert_eq!(ScriptSource::Url("/js/turbo.js".into()).url(), "/js/turbo.js");
    }

    #[test]
    fn script_with_websocket_connects_stream_source() {
        let html = render(&ScriptSource::default(), Some("/turbo-stream"));
        assert!(html.contains("@hotwired/turbo@"));
        assert!(html.contains("Turbo.connectStreamSource"));
        assert!(html.contains("${location.host}/turbo-stream`"));
        assert!(html.contains("${scheme}//"));
    }

    #[test]
    fn script_uses_custom_route() {
        let html = render(&ScriptSource::Url("/js/turbo.js".into()), Some("/ws"));
        assert!(html.contains(r#"import * as Turbo from "/js/turbo.js";"#));
        assert!(html.contains("${location.host}/ws`"));
    }

    #[test]
    fn script_without_websocket_only_loads_turbo() {
        let html = render(&ScriptSource::default(), None);
        assert!(html.contains("@hotwired/turbo@"));
        assert!(!html.contains("Turbo.connectStreamSource"));
        assert!(html.starts_with(r#"<script type="module" src=""#));
    }
}
