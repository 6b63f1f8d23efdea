//! # Audio Loader
//!
//! Turns a source reference into a loaded [`SoundHandle`], retrying transient
//! failures with exponential backoff.

use bridge_traits::{SoundFactory, SoundHandle, SoundOptions, SoundStatusObserver};
use core_runtime::logging::strip_url;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{PlayerConfig, RetryPolicy};
use crate::error::{PlaybackError, Result};
use crate::source::resolve_source;

/// Creates sound handles through the platform [`SoundFactory`].
#[derive(Clone)]
pub struct AudioLoader {
    factory: Arc<dyn SoundFactory>,
    retry: RetryPolicy,
    options: SoundOptions,
}

impl AudioLoader {
    pub fn new(factory: Arc<dyn SoundFactory>, config: &PlayerConfig) -> Self {
        Self {
            factory,
            retry: config.retry,
            options: SoundOptions {
                progress_update_interval: config.progress_update_interval,
                ..SoundOptions::default()
            },
        }
    }

    pub fn with_retry_policy(factory: Arc<dyn SoundFactory>, retry: RetryPolicy) -> Self {
        Self {
            factory,
            retry,
            options: SoundOptions::default(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Options applied to every handle this loader creates.
    pub fn sound_options(&self) -> SoundOptions {
        self.options
    }

    /// Loads `source_ref` with the loader's default options.
    pub async fn load_default(
        &self,
        source_ref: &str,
        observer: Arc<dyn SoundStatusObserver>,
    ) -> Result<Arc<dyn SoundHandle>> {
        self.load(source_ref, self.options, observer).await
    }

    /// Loads `source_ref`, returning a handle that reports itself loaded.
    ///
    /// Invalid references fail immediately with
    /// [`PlaybackError::InvalidSource`]. Otherwise up to
    /// `max_attempts` creations are tried; a created handle that is not
    /// loaded is unloaded before the next attempt.
    pub async fn load(
        &self,
        source_ref: &str,
        options: SoundOptions,
        observer: Arc<dyn SoundStatusObserver>,
    ) -> Result<Arc<dyn SoundHandle>> {
        let source_display = strip_url(source_ref);
        let source = resolve_source(source_ref).map_err(|e| {
            warn!(source = %source_display, "Rejected invalid audio source");
            e
        })?;

        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            debug!(source = %source_display, attempt, max_attempts, "Creating sound");

            match self.factory.create(&source, options, observer.clone()).await {
                Ok(handle) => {
                    let status = handle.status();
                    if status.is_loaded {
                        info!(source = %source_display, attempt, "Sound loaded");
                        return Ok(Arc::from(handle));
                    }

                    last_error = status
                        .error
                        .unwrap_or_else(|| "sound created but not loaded".to_string());
                    if let Err(e) = handle.unload() {
                        debug!(source = %source_display, error = %e, "Failed to unload unverified sound");
                    }
                }
                Err(e) => last_error = e.to_string(),
            }

            warn!(
                source = %source_display,
                attempt,
                max_attempts,
                error = %last_error,
                "Load attempt failed"
            );

            if attempt < max_attempts {
                let delay = self.retry.delay_after(attempt);
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(PlaybackError::LoadFailed {
            source_ref: source_ref.to_string(),
            attempts: max_attempts,
            last_error,
        })
    }
}

impl std::fmt::Debug for AudioLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioLoader")
            .field("retry", &self.retry)
            .field("options", &self.options)
            .finish()
    }
}
