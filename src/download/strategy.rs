//! Strategy catalog: named invocation profiles tried in priority order.
//!
//! Earlier strategies are the least intrusive. Later ones add sleep
//! intervals, retries, geo-bypass, a proxy or the embed player fallback.

use url::Url;

use crate::core::config;

const CHROME_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const LINUX_CHROME_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MAC_CHROME_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const GOOGLEBOT_UA: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
const YOUTUBE_REFERER: &str = "https://www.youtube.com/";

/// Rewrite applied to the request URL before it is handed to the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlRewrite {
    /// `watch?v=ID&x=y` becomes `embed/ID?x=y`
    WatchToEmbed,
}

impl UrlRewrite {
    /// URLs the rewrite does not apply to are returned unchanged.
    pub fn apply(&self, url: &str) -> String {
        match self {
            UrlRewrite::WatchToEmbed => watch_to_embed(url).unwrap_or_else(|| url.to_string()),
        }
    }
}

/// Moves the `v` parameter of a `/watch` URL into an `/embed/{id}` path,
/// keeping the remaining query parameters in order.
fn watch_to_embed(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    if parsed.path() != "/watch" {
        return None;
    }

    let id = parsed
        .query_pairs()
        .find(|(key, value)| key == "v" && !value.is_empty())
        .map(|(_, value)| value.into_owned())?;
    let rest: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "v")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    parsed.set_path(&format!("/embed/{}", id));
    if rest.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(rest);
    }
    Some(parsed.into())
}

/// One invocation profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub name: String,
    pub args: Vec<String>,
    pub rewrite: Option<UrlRewrite>,
}

impl Strategy {
    pub fn new<I, S>(name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            rewrite: None,
        }
    }

    pub fn with_rewrite(mut self, rewrite: UrlRewrite) -> Self {
        self.rewrite = Some(rewrite);
        self
    }

    /// URL passed to the tool for this strategy.
    pub fn target_url(&self, url: &str) -> String {
        match self.rewrite {
            Some(rewrite) => rewrite.apply(url),
            None => url.to_string(),
        }
    }
}

/// Where the `cookies` strategy reads cookies from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    File(String),
    Browser(String),
}

/// Ordered, non-empty, read-only list of strategies.
#[derive(Debug, Clone)]
pub struct StrategyCatalog {
    strategies: Vec<Strategy>,
}

impl StrategyCatalog {
    /// Builds a catalog from an explicit list. Returns `None` for an empty list.
    pub fn new(strategies: Vec<Strategy>) -> Option<Self> {
        if strategies.is_empty() {
            None
        } else {
            Some(Self { strategies })
        }
    }

    /// The full fallback chain. `cookies` and `proxy` only appear when configured.
    pub fn default_catalog(proxy: Option<&str>, cookies: Option<&CookieSource>) -> Self {
        let mut strategies = vec![Strategy::new(
            "default",
            ["--user-agent", CHROME_UA, "--referer", YOUTUBE_REFERER],
        )];

        if let Some(source) = cookies {
            let (flag, value) = match source {
                CookieSource::File(path) => ("--cookies", path.as_str()),
                CookieSource::Browser(browser) => ("--cookies-from-browser", browser.as_str()),
            };
            strategies.push(Strategy::new("cookies", [flag, value, "--user-agent", CHROME_UA]));
        }

        strategies.push(client_strategy(
            "ios",
            "com.google.ios.youtube/19.09.3 (iPhone16,2; U; CPU iOS 17_2_1 like Mac OS X;)",
            "5",
            "19.09.3",
        ));
        strategies.push(client_strategy(
            "android",
            "com.google.android.youtube/19.09.36 (Linux; U; Android 13) gzip",
            "3",
            "19.09.36",
        ));
        strategies.push(client_strategy(
            "tv",
            "Mozilla/5.0 (ChromiumStylePlatform) Cobalt/Version",
            "85",
            "1.0",
        ));
        strategies.push(client_strategy("web", CHROME_UA, "1", "2.20240104.01.00"));

        if let Some(proxy) = proxy {
            strategies.push(Strategy::new(
                "proxy",
                [
                    "--proxy",
                    proxy,
                    "--sleep-interval",
                    "2",
                    "--max-sleep-interval",
                    "5",
                    "--retries",
                    "3",
                    "--user-agent",
                    CHROME_UA,
                ],
            ));
        }

        strategies.push(Strategy::new(
            "vpn",
            [
                "--geo-bypass",
                "--geo-bypass-country",
                "US",
                "--extractor-args",
                "youtube:player_client=web",
                "--sleep-interval",
                "3",
                "--user-agent",
                MAC_CHROME_UA,
            ],
        ));
        strategies.push(Strategy::new(
            "fallback",
            [
                "--sleep-interval",
                "3",
                "--max-sleep-interval",
                "7",
                "--retries",
                "5",
                "--user-agent",
                GOOGLEBOT_UA,
            ],
        ));
        strategies.push(Strategy::new(
            "aggressive",
            [
                "--extractor-args",
                "youtube:player_client=android,web",
                "--sleep-interval",
                "5",
                "--max-sleep-interval",
                "10",
                "--retries",
                "10",
                "--user-agent",
                LINUX_CHROME_UA,
            ],
        ));
        strategies.push(
            Strategy::new(
                "embed",
                [
                    "--extractor-args",
                    "youtube:player_client=embed",
                    "--user-agent",
                    CHROME_UA,
                    "--referer",
                    YOUTUBE_REFERER,
                ],
            )
            .with_rewrite(UrlRewrite::WatchToEmbed),
        );

        Self { strategies }
    }

    /// Catalog for the running configuration.
    pub fn from_config() -> Self {
        let cookies = config::YTDL_COOKIES_FILE
            .clone()
            .map(CookieSource::File)
            .or_else(|| config::YTDL_COOKIES_BROWSER.clone().map(CookieSource::Browser));
        Self::default_catalog(config::PROXY_URL.as_deref(), cookies.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.iter()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Always false: a catalog holds at least one strategy.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Strategy> {
        self.strategies.get(index)
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name.as_str()).collect()
    }
}

fn client_strategy(name: &str, user_agent: &str, client_name: &str, client_version: &str) -> Strategy {
    Strategy::new(
        name,
        [
            "--user-agent".to_string(),
            user_agent.to_string(),
            "--add-header".to_string(),
            format!("X-YouTube-Client-Name:{}", client_name),
            "--add-header".to_string(),
            format!("X-YouTube-Client-Version:{}", client_version),
        ],
    )
}
