use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// Progress display for one run. Purely cosmetic: it never changes the
/// outcome of the work it reports on. Collections fetch concurrently, so
/// bars share one `MultiProgress`.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    multi: Option<MultiProgress>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi: enabled.then(MultiProgress::new),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.multi.is_some()
    }

    /// A counting bar, hidden when progress is disabled.
    pub fn bar(&self, len: u64, label: &str) -> ProgressBar {
        let Some(multi) = &self.multi else {
            return ProgressBar::hidden();
        };

        let bar = multi.add(ProgressBar::new(len));
        if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}") {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(label.to_string());
        bar
    }

    /// Start a spinner that keeps ticking until the returned watch is
    /// finished or dropped.
    pub fn watch(&self, message: impl Into<String>) -> ProgressWatch {
        let Some(multi) = &self.multi else {
            return ProgressWatch {
                stop: None,
                handle: None,
            };
        };

        let (stop, mut stopped) = oneshot::channel::<()>();
        let message = message.into();
        let spinner = multi.add(ProgressBar::new_spinner());

        let handle = tokio::spawn(async move {
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}  {elapsed}") {
                spinner.set_style(style);
            }
            spinner.set_message(message);

            let mut ticker = tokio::time::interval(Duration::from_millis(500));
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => spinner.tick(),
                }
            }
            spinner.finish_and_clear();
        });

        ProgressWatch {
            stop: Some(stop),
            handle: Some(handle),
        }
    }
}

pub struct ProgressWatch {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressWatch {
    pub async fn finish(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                debug!("progress task ended abnormally: {}", e);
            }
        }
    }
}
