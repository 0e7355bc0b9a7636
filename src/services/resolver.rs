use crate::config::{ConfigError, ResolverConfig};
use rayon::prelude::*;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const CLEARBIT_ENDPOINT: &str = "https://logo.clearbit.com";
pub const GOOGLE_FAVICON_ENDPOINT: &str = "https://www.google.com/s2/favicons";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} returned HTTP {status} for {domain}")]
    Status {
        source_name: String,
        domain: String,
        status: StatusCode,
    },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// One way of turning a domain into a logo URL.
///
/// `Ok(None)` means the source answered and has no logo; `Err` means the
/// lookup itself failed and may succeed on a later attempt.
pub trait LogoSource: Send + Sync {
    fn name(&self) -> &str;
    fn lookup(&self, domain: &str) -> Result<Option<String>, ResolveError>;
}

/// Clearbit logo API; the lookup URL is itself the image URL.
pub struct ClearbitSource {
    client: Client,
}

impl ClearbitSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl LogoSource for ClearbitSource {
    fn name(&self) -> &str {
        "Clearbit"
    }

    fn lookup(&self, domain: &str) -> Result<Option<String>, ResolveError> {
        let url = format!("{}/{}", CLEARBIT_ENDPOINT, domain);
        let response = self.client.get(&url).send()?;
        match response.status() {
            StatusCode::OK => Ok(Some(url)),
            StatusCode::NOT_FOUND => {
                log::info!("No logo found for {} on Clearbit", domain);
                Ok(None)
            }
            status => Err(ResolveError::Status {
                source_name: self.name().to_string(),
                domain: domain.to_string(),
                status,
            }),
        }
    }
}

/// Google favicon lookup for `domain`, passed as an encoded query value.
pub fn favicon_url(domain: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(GOOGLE_FAVICON_ENDPOINT, &[("domain", domain)])
}

/// Google's favicon service.
pub struct FaviconSource {
    client: Client,
}

impl FaviconSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl LogoSource for FaviconSource {
    fn name(&self) -> &str {
        "Google favicon"
    }

    fn lookup(&self, domain: &str) -> Result<Option<String>, ResolveError> {
        let url = favicon_url(domain)?;
        let response = self.client.get(url.as_str()).send()?;
        if response.status() == StatusCode::OK {
            Ok(Some(url.into()))
        } else {
            Ok(None)
        }
    }
}

/// Scrapes the domain's home page for an icon or logo reference.
pub struct WebsiteSource {
    client: Client,
    user_agent: String,
    timeout: Duration,
}

impl WebsiteSource {
    pub fn new(client: Client, config: &ResolverConfig) -> Self {
        Self {
            client,
            user_agent: config.user_agent.clone(),
            timeout: config.scrape_timeout,
        }
    }
}

impl LogoSource for WebsiteSource {
    fn name(&self) -> &str {
        "website"
    }

    fn lookup(&self, domain: &str) -> Result<Option<String>, ResolveError> {
        let response = self
            .client
            .get(format!("http://{}", domain))
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()?
            .error_for_status()?;
        let page_url = response.url().clone();
        let html = response.text()?;
        Ok(extract_logo_href(&html, &page_url))
    }
}

/// Find the first icon or logo reference in `html`, as an absolute URL.
///
/// `img`, `link` and `meta` tags are visited in document order. A tag
/// matches when its `rel` has an `icon` token (`href`), when it carries
/// `itemprop="logo"` (`src`, then `content`) or when it has a `logo` class
/// (`src`, then `href`). Matching tags without a reference are skipped.
pub fn extract_logo_href(html: &str, page_url: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img, link, meta").ok()?;

    for element in document.select(&selector) {
        let el = element.value();
        let reference = if el
            .attr("rel")
            .is_some_and(|rel| rel.split_ascii_whitespace().any(|t| t == "icon"))
        {
            el.attr("href")
        } else if el.attr("itemprop") == Some("logo") {
            el.attr("src").or_else(|| el.attr("content"))
        } else if el.classes().any(|c| c == "logo") {
            el.attr("src").or_else(|| el.attr("href"))
        } else {
            continue;
        };

        if let Some(url) = reference.and_then(|r| absolutize(r, page_url)) {
            return Some(url);
        }
    }
    None
}

fn absolutize(reference: &str, page_url: &Url) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if reference.starts_with("http") {
        return Some(reference.to_string());
    }
    if let Some(rest) = reference.strip_prefix("//") {
        return Some(format!("http://{}", rest));
    }
    page_url.join(reference).ok().map(String::from)
}

enum Attempt {
    Found(String),
    NotFound,
    Failed,
}

/// Tries each source in order, retrying the chain when a source errored.
pub struct LogoResolver {
    sources: Vec<Box<dyn LogoSource>>,
    max_retries: u32,
    retry_delay: Duration,
}

impl LogoResolver {
    pub fn new(
        sources: Vec<Box<dyn LogoSource>>,
        config: &ResolverConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sources,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// Clearbit, then Google favicons, then the domain's own page.
    pub fn with_default_sources(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let sources: Vec<Box<dyn LogoSource>> = vec![
            Box::new(ClearbitSource::new(client.clone())),
            Box::new(FaviconSource::new(client.clone())),
            Box::new(WebsiteSource::new(client, config)),
        ];
        Ok(Self::new(sources, config)?)
    }

    pub fn resolve(&self, domain: &str) -> Option<String> {
        for attempt in 1..=self.max_retries {
            match self.attempt(domain) {
                Attempt::Found(url) => return Some(url),
                Attempt::NotFound => break,
                Attempt::Failed => {
                    log::warn!("Attempt {} failed for {}", attempt, domain);
                    if attempt < self.max_retries {
                        thread::sleep(self.retry_delay);
                    }
                }
            }
        }
        log::warn!("All attempts failed for {}", domain);
        None
    }

    /// Resolve every domain in parallel; results are in input order.
    /// `on_resolved` runs once per domain as soon as it is done.
    pub fn resolve_all<F>(&self, domains: &[String], on_resolved: F) -> Vec<Option<String>>
    where
        F: Fn(&str, Option<&str>) + Sync,
    {
        domains
            .par_iter()
            .map(|domain| {
                let url = self.resolve(domain);
                on_resolved(domain, url.as_deref());
                url
            })
            .collect()
    }

    fn attempt(&self, domain: &str) -> Attempt {
        let mut failed = false;
        for source in &self.sources {
            match source.lookup(domain) {
                Ok(Some(url)) => {
                    log::debug!("{} resolved {} -> {}", source.name(), domain, url);
                    return Attempt::Found(url);
                }
                Ok(None) => {}
                Err(err) => {
                    log::warn!(
                        "Error fetching logo for {} from {}: {}",
                        domain,
                        source.name(),
                        err
                    );
                    failed = true;
                }
            }
        }
        if failed {
            Attempt::Failed
        } else {
            Attempt::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Found(&'static str),
        Missing,
        Broken,
    }

    /// Source that plays back canned replies and then keeps answering `Missing`.
    struct ScriptedSource {
        name: &'static str,
        replies: Mutex<VecDeque<Reply>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(name: &'static str, replies: Vec<Reply>) -> Self {
            Self {
                name,
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl LogoSource for &'static ScriptedSource {
        fn name(&self) -> &str {
            self.name
        }

        fn lookup(&self, domain: &str) -> Result<Option<String>, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.lock().unwrap().pop_front() {
                Some(Reply::Found(url)) => Ok(Some(url.to_string())),
                Some(Reply::Broken) => Err(ResolveError::Status {
                    source_name: self.name.to_string(),
                    domain: domain.to_string(),
                    status: StatusCode::SERVICE_UNAVAILABLE,
                }),
                Some(Reply::Missing) | None => Ok(None),
            }
        }
    }

    fn leak(source: ScriptedSource) -> &'static ScriptedSource {
        Box::leak(Box::new(source))
    }

    fn resolver(sources: &[&'static ScriptedSource]) -> LogoResolver {
        let config = ResolverConfig {
            retry_delay: Duration::ZERO,
            ..ResolverConfig::default()
        };
        let boxed = sources
            .iter()
            .map(|s| Box::new(*s) as Box<dyn LogoSource>)
            .collect();
        LogoResolver::new(boxed, &config).unwrap()
    }

    fn page() -> Url {
        Url::parse("http://example.com").unwrap()
    }

    #[test]
    fn test_first_source_wins() {
        let primary = leak(ScriptedSource::new("primary", vec![Reply::Found("https://p/logo.png")]));
        let fallback = leak(ScriptedSource::new("fallback", vec![Reply::Found("https://f/logo.png")]));

        let url = resolver(&[primary, fallback]).resolve("acme.com");

        assert_eq!(url.as_deref(), Some("https://p/logo.png"));
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_falls_back_when_primary_has_no_logo() {
        let primary = leak(ScriptedSource::new("primary", vec![Reply::Missing]));
        let fallback = leak(ScriptedSource::new("fallback", vec![Reply::Found("https://f/icon.png")]));

        let url = resolver(&[primary, fallback]).resolve("acme.com");
        assert_eq!(url.as_deref(), Some("https://f/icon.png"));
    }

    #[test]
    fn test_retries_after_source_error() {
        let flaky = leak(ScriptedSource::new(
            "flaky",
            vec![Reply::Broken, Reply::Broken, Reply::Found("https://x/logo.png")],
        ));

        let url = resolver(&[flaky]).resolve("acme.com");

        assert_eq!(url.as_deref(), Some("https://x/logo.png"));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let broken = leak(ScriptedSource::new(
            "broken",
            vec![Reply::Broken, Reply::Broken, Reply::Broken, Reply::Found("late")],
        ));

        assert_eq!(resolver(&[broken]).resolve("acme.com"), None);
        assert_eq!(broken.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_no_retry_when_every_source_says_missing() {
        let a = leak(ScriptedSource::new("a", vec![]));
        let b = leak(ScriptedSource::new("b", vec![]));

        assert_eq!(resolver(&[a, b]).resolve("nologo.com"), None);
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    struct EchoSource;

    impl LogoSource for EchoSource {
        fn name(&self) -> &str {
            "echo"
        }

        fn lookup(&self, domain: &str) -> Result<Option<String>, ResolveError> {
            Ok(Some(format!("https://{}/logo.png", domain)))
        }
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let sources: Vec<Box<dyn LogoSource>> = vec![Box::new(EchoSource)];
        let resolver = LogoResolver::new(sources, &ResolverConfig::default()).unwrap();
        let domains: Vec<String> = (0..32).map(|i| format!("d{}.com", i)).collect();
        let done = AtomicUsize::new(0);

        let urls = resolver.resolve_all(&domains, |_, _| {
            done.fetch_add(1, Ordering::SeqCst);
        });

        let expected: Vec<Option<String>> = domains
            .iter()
            .map(|d| Some(format!("https://{}/logo.png", d)))
            .collect();
        assert_eq!(urls, expected);
        assert_eq!(done.load(Ordering::SeqCst), domains.len());
    }

    #[test]
    fn test_favicon_url_carries_domain() {
        assert_eq!(
            favicon_url("example.com").unwrap().as_str(),
            "https://www.google.com/s2/favicons?domain=example.com"
        );
    }

    #[test]
    fn test_favicon_url_encodes_reserved_characters() {
        let url = favicon_url("a b&c=d.com#x").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![("domain".to_string(), "a b&c=d.com#x".to_string())]
        );
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_extract_icon_link() {
        let html = r#"<html><head><link rel="shortcut icon" href="/favicon.ico"></head></html>"#;
        assert_eq!(
            extract_logo_href(html, &page()).as_deref(),
            Some("http://example.com/favicon.ico")
        );
    }

    #[test]
    fn test_extract_protocol_relative_logo_class() {
        let html = r#"<body><img class="site logo" src="//cdn.example.com/logo.png"></body>"#;
        assert_eq!(
            extract_logo_href(html, &page()).as_deref(),
            Some("http://cdn.example.com/logo.png")
        );
    }

    #[test]
    fn test_extract_itemprop_meta_content() {
        let html = r#"<head><meta itemprop="logo" content="https://example.com/brand.png"></head>"#;
        assert_eq!(
            extract_logo_href(html, &page()).as_deref(),
            Some("https://example.com/brand.png")
        );
    }

    #[test]
    fn test_extract_takes_first_match_in_document_order() {
        let html = r#"<html><head><link rel="stylesheet" href="/s.css"></head>
            <body><img class="logo" src="img/logo.svg"><link rel="icon" href="/favicon.ico"></body></html>"#;
        assert_eq!(
            extract_logo_href(html, &page()).as_deref(),
            Some("http://example.com/img/logo.svg")
        );
    }

    #[test]
    fn test_extract_skips_match_without_reference() {
        let html = r#"<head><link rel="icon"></head><body><img class="logo" src="/a.png"></body>"#;
        assert_eq!(
            extract_logo_href(html, &page()).as_deref(),
            Some("http://example.com/a.png")
        );
    }

    #[test]
    fn test_extract_nothing_found() {
        let html = r#"<html><body><img src="/banner.jpg" class="hero"><p>hi</p></body></html>"#;
        assert_eq!(extract_logo_href(html, &page()), None);
    }
}
