//! Image pull with progress output

use crate::error::{ContainerError, Result};
use crate::runtime::ContainerRuntime;
use futures_util::stream::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct PullProgressBar {
    progress_bar: ProgressBar,
}

impl PullProgressBar {
    pub fn new(image: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(format!("Pulling image {}", image));
        pb.enable_steady_tick(Duration::from_millis(120));

        Self { progress_bar: pb }
    }

    pub fn update(&self, status: &str, progress: Option<&str>) {
        match progress {
            Some(progress) => self
                .progress_bar
                .set_message(format!("{}    {}", status, progress)),
            None => self.progress_bar.set_message(status.to_string()),
        }
    }

    pub fn finish(&self, message: &str) {
        self.progress_bar.finish_with_message(message.to_string());
    }
}

/// Pull `image`, streaming progress; the optional timeout bounds the whole pull.
pub async fn pull_image<R>(runtime: &R, image: &str, timeout: Option<Duration>) -> Result<()>
where
    R: ContainerRuntime + ?Sized,
{
    tracing::info!("Pulling image {}", image);
    let bar = PullProgressBar::new(image);

    let pull = async {
        let mut stream = runtime.pull(image);
        while let Some(item) = stream.next().await {
            let item = item?;
            tracing::debug!("{}: {} {}", image, item.status, item.progress.as_deref().unwrap_or(""));
            bar.update(&item.status, item.progress.as_deref());
        }
        Ok::<(), ContainerError>(())
    };

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, pull).await {
            Ok(result) => result,
            Err(_) => Err(ContainerError::PullTimeout {
                image: image.to_string(),
                seconds: limit.as_secs(),
            }),
        },
        None => pull.await,
    };

    match &outcome {
        Ok(()) => bar.finish(&format!("Pulled {}", image)),
        Err(e) => bar.finish(&format!("Pull failed: {}", e)),
    }
    outcome
}
