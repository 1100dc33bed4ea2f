use crate::progress::Progress;
use crate::traits::{ArticleSource, PullFeed};
use crate::types::{Article, FetchResult, FetchStatus, IngestReport};
use chrono::{DateTime, Duration, Timelike, Utc};
use futures::stream::{self, StreamExt};
use interfaces::RawEntry;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A named group of feed sources rendered together as one section.
#[derive(Debug, Clone)]
pub struct Collection {
    pub id: String,
    pub display_name: String,
    pub source_urls: Vec<String>,
    pub recency_window: Option<Duration>,
    pub fetch_full_text: bool,
    pub include_title_block: bool,
    pub use_readability: bool,
    articles: Vec<Article>,
    seen_urls: HashSet<String>,
    report: IngestReport,
}

impl Collection {
    pub fn new(id: String, display_name: String, source_urls: Vec<String>) -> Self {
        Self {
            id,
            display_name,
            source_urls,
            recency_window: None,
            fetch_full_text: false,
            include_title_block: true,
            use_readability: true,
            articles: Vec::new(),
            seen_urls: HashSet::new(),
            report: IngestReport::default(),
        }
    }

    pub fn with_recency_window(mut self, window: Option<Duration>) -> Self {
        self.recency_window = window;
        self
    }

    pub fn with_fetch_full_text(mut self, fetch: bool) -> Self {
        self.fetch_full_text = fetch;
        self
    }

    pub fn with_title_block(mut self, include: bool) -> Self {
        self.include_title_block = include;
        self
    }

    pub fn with_readability(mut self, readability: bool) -> Self {
        self.use_readability = readability;
        self
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    /// Ingest every source, then fetch full text if enabled. The whole entry
    /// batch is filtered before the first fetch starts.
    pub async fn refresh(
        &mut self,
        feeds: &dyn PullFeed,
        pages: &dyn ArticleSource,
        concurrency: usize,
        progress: &Progress,
    ) {
        self.ingest(feeds).await;
        self.fetch_articles(pages, concurrency, progress).await;
    }

    pub async fn ingest(&mut self, feeds: &dyn PullFeed) {
        self.ingest_at(feeds, Utc::now()).await;
    }

    /// Ingest with an explicit "now"; every entry of the batch is judged
    /// against the same instant.
    pub async fn ingest_at(&mut self, feeds: &dyn PullFeed, now: DateTime<Utc>) {
        for url in self.source_urls.clone() {
            match feeds.pull(&url).await {
                Ok(entries) => {
                    self.report.sources_read += 1;
                    self.admit(entries, now);
                }
                Err(e) => {
                    self.report.sources_failed += 1;
                    warn!(collection = %self.id, "skipping source: {}", e);
                }
            }
        }

        if !self.source_urls.is_empty() && self.report.sources_read == 0 {
            warn!(collection = %self.id, "no feed source could be read");
        }

        info!(
            collection = %self.id,
            "Admitted {} of {} entries ({} duplicates, {} too old, {} incomplete)",
            self.report.admitted,
            self.report.entries_seen,
            self.report.duplicates,
            self.report.too_old,
            self.report.incomplete
        );
    }

    /// Turn entries into articles, dropping incomplete ones, URLs already
    /// present in this collection, and anything outside the recency window.
    pub fn admit(&mut self, entries: Vec<RawEntry>, now: DateTime<Utc>) {
        for entry in entries {
            self.report.entries_seen += 1;

            let Some(article) = Article::from_entry(entry, now) else {
                self.report.incomplete += 1;
                continue;
            };

            if self.seen_urls.contains(&article.url) {
                debug!("Skipping duplicate entry with URL: {}", article.url);
                self.report.duplicates += 1;
                continue;
            }

            if let Some(window) = self.recency_window {
                if now.signed_duration_since(article.published_at) > window {
                    debug!("Skipping entry older than window: {}", article.url);
                    self.report.too_old += 1;
                    continue;
                }
            }

            self.seen_urls.insert(article.url.clone());
            self.articles.push(article);
            self.report.admitted += 1;
        }
    }

    /// Replace summaries with full text, at most `concurrency` requests in
    /// flight. Failed fetches leave the summary in place.
    pub async fn fetch_articles(
        &mut self,
        pages: &dyn ArticleSource,
        concurrency: usize,
        progress: &Progress,
    ) {
        if !self.fetch_full_text {
            for article in &mut self.articles {
                article.fetch_status = FetchStatus::UsedSummary;
            }
            return;
        }

        if self.articles.is_empty() {
            self.report.fetch_skipped_empty = true;
            info!(collection = %self.id, "no articles left to fetch");
            return;
        }

        let extract = self.use_readability;
        let urls: Vec<String> = self.articles.iter().map(|a| a.url.clone()).collect();
        let bar = progress.bar(urls.len() as u64, &self.display_name);
        let bar_ref = &bar;

        let results: Vec<FetchResult> = stream::iter(urls)
            .map(|url| async move {
                let result = pages.fetch(&url, extract).await;
                bar_ref.inc(1);
                result
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;
        bar.finish_and_clear();

        for (article, result) in self.articles.iter_mut().zip(results) {
            match result.status {
                FetchStatus::Fetched => self.report.fetched += 1,
                _ => self.report.fetch_failed += 1,
            }
            article.apply_fetch(result);
        }

        info!(
            collection = %self.id,
            "Fetched {} articles, {} kept their summary",
            self.report.fetched,
            self.report.fetch_failed
        );
    }

    /// Newest first. Stable, so equal timestamps keep ingestion order.
    pub fn sort_articles(&mut self) {
        self.articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    }

    /// Render the articles as HTML fragments, newest first. An empty
    /// collection renders as an empty string.
    pub fn render(&mut self) -> String {
        self.sort_articles();
        self.articles
            .iter()
            .map(|article| render_article(article, self.include_title_block))
            .collect()
    }
}

fn render_article(article: &Article, include_title_block: bool) -> String {
    let byline = format!("<em>{}</em>", byline(article));

    if include_title_block {
        format!(
            "<div class=\"article\">\n<h1>{}</h1>\n{}\n{}\n</div>\n",
            escape_html(&article.title),
            byline,
            article.body
        )
    } else {
        format!(
            "<div class=\"article\">\n{}\n</div>\n",
            splice_after_heading(&article.body, &byline)
        )
    }
}

fn byline(article: &Article) -> String {
    let date = format_date(article.published_at);
    if article.has_known_author() {
        format!("{}, {}", escape_html(&article.author), date)
    } else {
        date
    }
}

/// Date only when the timestamp sits exactly on midnight, which is what
/// feeds that carry no time of day produce.
fn format_date(at: DateTime<Utc>) -> String {
    if at.num_seconds_from_midnight() == 0 && at.nanosecond() == 0 {
        at.format("%a, %d %b %Y").to_string()
    } else {
        at.format("%a, %d %b %Y %H:%M").to_string()
    }
}

/// Insert `line` right after the first `</h1>`. Bodies without one get
/// nothing inserted.
fn splice_after_heading(body: &str, line: &str) -> String {
    body.replacen("</h1>", &format!("</h1>{}", line), 1)
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
