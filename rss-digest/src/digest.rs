use crate::collection::{escape_html, Collection};
use crate::config::{ExportSettings, RunConfig};
use crate::progress::Progress;
use crate::traits::{ArticleSource, PullFeed};
use crate::types::{DigestError, Result};
use chrono::Local;
use futures::future::join_all;
use interfaces::{ConvertError, ConvertOptions, DocumentConverter};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Output format written as-is, without going through the converter.
pub const HTML_FORMAT: &str = "html";

/// All collections of one run, in configuration order.
pub struct Digest {
    collections: Vec<Collection>,
    run: RunConfig,
    progress: Progress,
}

impl Digest {
    pub fn new(run: RunConfig) -> Self {
        let progress = Progress::new(run.progress);
        Self {
            collections: Vec::new(),
            run,
            progress,
        }
    }

    pub fn add_collection(&mut self, collection: Collection) {
        self.collections.push(collection);
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Ingest and fetch every collection. Collections share nothing, so they
    /// run concurrently; failures inside one are logged there and never
    /// reach the others.
    pub async fn ingest_all(&mut self, feeds: &dyn PullFeed, pages: &dyn ArticleSource) {
        let concurrency = self.run.fetch.max_concurrent_fetches;
        let progress = &self.progress;

        info!("Ingesting {} collections", self.collections.len());
        join_all(
            self.collections
                .iter_mut()
                .map(|collection| collection.refresh(feeds, pages, concurrency, progress)),
        )
        .await;
    }

    /// Build the full HTML document. Collections with nothing to show are
    /// left out entirely, heading included.
    pub fn compose(&mut self) -> String {
        let mut document = String::from("<html><body>\n");

        for collection in &mut self.collections {
            let articles = collection.render();
            if articles.is_empty() {
                debug!(collection = %collection.id, "omitting empty collection");
                continue;
            }

            document.push_str(&format!(
                "<section class=\"collection\" id=\"{}\">\n<h1>{}</h1>\n{}</section>\n",
                escape_html(&collection.id),
                escape_html(&collection.display_name),
                articles
            ));
        }

        document.push_str("</body></html>\n");
        document
    }

    /// Write the composed document to `destination`. The `html` format is
    /// written verbatim; anything else goes through `converter`.
    pub async fn export(
        &mut self,
        destination: &Path,
        format: &str,
        settings: &ExportSettings,
        converter: Arc<dyn DocumentConverter>,
    ) -> Result<()> {
        let document = self.compose();

        if format == HTML_FORMAT {
            tokio::fs::write(destination, document).await?;
            info!("Wrote {}", destination.display());
            return Ok(());
        }

        let options = ConvertOptions {
            title: settings.title.clone(),
            metadata_file: settings.metadata_file.clone(),
            defaults_file: settings.defaults_file.clone(),
            transforms: settings.transforms.clone(),
            extra_flags: settings.extra_flags.clone(),
            table_of_contents: settings.table_of_contents,
            date: Local::now().format("%Y-%m-%d").to_string(),
        };

        info!("Exporting to {} ({})", destination.display(), format);
        let watch = self.progress.watch(format!("Exporting to {}...", format));

        let format = format.to_string();
        let destination = destination.to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || {
            converter.convert(&document, &format, &destination, &options)
        })
        .await;

        watch.finish().await;

        match outcome {
            Ok(result) => result.map_err(DigestError::from),
            Err(e) => Err(DigestError::Converter(ConvertError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                e.to_string(),
            )))),
        }
    }
}
