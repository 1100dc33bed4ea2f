use chrono::{Duration, Utc};
use interfaces::{ConvertError, ConvertOptions, DocumentConverter};
use rss_digest::{
    types::*, Collection, Digest, DigestConfig, ExportSettings, Fetcher, PandocConverter,
    RssFeedSource, RunConfig, HTML_FORMAT,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rss(items: &[(&str, &str, chrono::DateTime<Utc>)]) -> String {
    let items: String = items
        .iter()
        .map(|(link, title, published)| {
            format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate><description>Summary of {}</description></item>",
                title,
                link,
                published.to_rfc2822(),
                title
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test</title><link>https://example.com</link><description>Test</description>{}</channel></rss>"#,
        items
    )
}

async fn mount(server: &MockServer, at: &str, body: String, mime: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, mime))
        .mount(server)
        .await;
}

fn test_config() -> FetchConfig {
    FetchConfig {
        timeout_seconds: 2,
        max_retries: 0,
        retry_delay_seconds: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_digest_end_to_end() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let server = MockServer::start().await;
    let base = server.uri();
    let now = Utc::now();
    let shared = "https://x/1";

    // Two sources carrying the same article under different titles
    mount(&server, "/one.xml", rss(&[(shared, "From one", now - Duration::hours(1))]), "application/rss+xml").await;
    mount(&server, "/two.xml", rss(&[(shared, "From two", now - Duration::hours(2))]), "application/rss+xml").await;

    // A source whose only item is two days old
    mount(&server, "/stale.xml", rss(&[("https://x/old", "Old news", now - Duration::days(2))]), "application/rss+xml").await;

    // Full-text collection: one page fetches, one is missing
    let good = format!("{}/articles/good", base);
    let missing = format!("{}/articles/missing", base);
    mount(
        &server,
        "/full.xml",
        rss(&[
            (good.as_str(), "Good", now - Duration::hours(3)),
            (missing.as_str(), "Missing", now - Duration::hours(1)),
        ]),
        "application/rss+xml",
    )
    .await;
    mount(
        &server,
        "/articles/good",
        "<html><body><nav>menu</nav><article><header><h1>Good</h1></header><p>Full body.</p><footer>Share</footer></article></body></html>".to_string(),
        "text/html; charset=utf-8",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/articles/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = Arc::new(Fetcher::new(test_config())?);
    let feeds = RssFeedSource::new(fetcher.clone());

    let mut digest = Digest::new(RunConfig {
        progress: false,
        fetch: test_config(),
    });
    digest.add_collection(Collection::new(
        "merged".to_string(),
        "Merged".to_string(),
        vec![format!("{}/one.xml", base), format!("{}/two.xml", base)],
    ));
    digest.add_collection(
        Collection::new(
            "stale".to_string(),
            "Stale".to_string(),
            vec![format!("{}/stale.xml", base)],
        )
        .with_recency_window(Some(Duration::days(1))),
    );
    digest.add_collection(
        Collection::new(
            "full".to_string(),
            "Full text".to_string(),
            vec![format!("{}/full.xml", base), format!("{}/unreachable.xml", base)],
        )
        .with_fetch_full_text(true)
        .with_title_block(false),
    );

    digest.ingest_all(&feeds, fetcher.as_ref()).await;

    let merged = &digest.collections()[0];
    assert_eq!(merged.articles().len(), 1);
    assert_eq!(merged.articles()[0].url, shared);
    assert_eq!(merged.articles()[0].title, "From one");

    assert!(digest.collections()[1].articles().is_empty());

    let full = &digest.collections()[2];
    assert_eq!(full.report().sources_failed, 1);
    let statuses: Vec<FetchStatus> = full.articles().iter().map(|a| a.fetch_status).collect();
    assert_eq!(statuses, vec![FetchStatus::Fetched, FetchStatus::FetchFailed]);

    let dir = tempfile::tempdir()?;
    let out = dir.path().join("digest.html");
    digest
        .export(&out, HTML_FORMAT, &ExportSettings::default(), Arc::new(PandocConverter::new()))
        .await?;

    let document = std::fs::read_to_string(&out)?;
    info!("Composed document is {} bytes", document.len());

    assert!(document.contains("id=\"merged\""));
    assert!(!document.contains("id=\"stale\""));
    assert!(!document.contains("Old news"));

    // Fetched body gets the byline after its heading; the failed one keeps
    // its summary
    assert!(document.contains("<h1>Good</h1><em>"));
    assert!(document.contains("<p>Full body.</p>"));
    assert!(!document.contains("menu"));
    assert!(!document.contains("Share"));
    assert!(document.contains("Summary of Missing"));

    // Newest first inside the full-text section
    assert!(document.find("Summary of Missing").unwrap() < document.find("Full body.").unwrap());

    Ok(())
}

#[derive(Default)]
struct RecordingConverter {
    calls: Mutex<Vec<(String, String, PathBuf, ConvertOptions)>>,
}

impl DocumentConverter for RecordingConverter {
    fn convert(
        &self,
        document: &str,
        format: &str,
        destination: &Path,
        options: &ConvertOptions,
    ) -> std::result::Result<(), ConvertError> {
        self.calls.lock().unwrap().push((
            document.to_string(),
            format.to_string(),
            destination.to_path_buf(),
            options.clone(),
        ));
        Ok(())
    }
}

#[tokio::test]
async fn test_configured_run_hands_document_to_converter() -> Result<()> {
    let server = MockServer::start().await;
    let base = server.uri();
    let now = Utc::now();

    mount(
        &server,
        "/news.xml",
        rss(&[
            ("https://x/a", "Older", now - Duration::hours(5)),
            ("https://x/b", "Newer", now - Duration::hours(1)),
            ("https://x/c", "Ancient", now - Duration::days(9)),
        ]),
        "application/rss+xml",
    )
    .await;

    let toml = format!(
        r#"
[general]
last = "week"
title = "From config"
filters = ["filters.py"]
pandoc_args = ["--pdf-engine=xelatex"]

[fetch]
timeout_seconds = 2
max_retries = 0
retry_delay_seconds = 1

[[feed]]
id = "news"
name = "News"
url = "{base}/news.xml, {base}/gone.xml"
"#
    );
    let config = DigestConfig::from_toml_str(&toml)?;

    let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);
    let feeds = RssFeedSource::new(fetcher.clone());
    let mut digest = Digest::new(RunConfig {
        progress: false,
        fetch: config.fetch.clone(),
    });
    for collection in config.collections()? {
        digest.add_collection(collection);
    }

    digest.ingest_all(&feeds, fetcher.as_ref()).await;

    let report = digest.collections()[0].report();
    assert_eq!(report.sources_read, 1);
    assert_eq!(report.sources_failed, 1);
    assert_eq!(report.admitted, 2);
    assert_eq!(report.too_old, 1);

    let settings = ExportSettings::new(
        &config.general,
        Some("From command line".to_string()),
        false,
        &["--standalone".to_string()],
    );
    let converter = Arc::new(RecordingConverter::default());
    digest
        .export(Path::new("digest.epub"), "epub", &settings, converter.clone())
        .await?;

    let calls = converter.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (document, format, destination, options) = &calls[0];

    assert_eq!(format, "epub");
    assert_eq!(destination, &PathBuf::from("digest.epub"));
    assert_eq!(options.title.as_deref(), Some("From command line"));
    assert!(!options.table_of_contents);
    assert_eq!(options.transforms, vec![PathBuf::from("filters.py")]);
    assert_eq!(options.extra_flags, vec!["--pdf-engine=xelatex", "--standalone"]);
    assert!(!options.date.is_empty());

    assert!(document.contains("<section class=\"collection\" id=\"news\">"));
    assert!(!document.contains("Ancient"));
    assert!(document.find("<h1>Newer</h1>").unwrap() < document.find("<h1>Older</h1>").unwrap());

    Ok(())
}
