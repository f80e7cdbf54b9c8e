//! Cancellable compression on tokio's blocking thread pool.

use crate::cancellation::CancellationToken;
use crate::error::AstcError;
use crate::raw_image::{CompressionOutcome, RawImage};
use crate::settings::CompressionSettings;
use core::time::Duration;
use log::{debug, warn};

/// One compression request, run off the caller's task.
///
/// The codec call runs on tokio's blocking pool while the caller awaits. Each
/// progress checkpoint (one per row of blocks) reports to the progress closure and
/// then polls the session's [`CancellationToken`]; a cancelled token stops the codec
/// and the session resolves to [`CompressionOutcome::Cancelled`].
///
/// # Examples
///
/// ```ignore
/// use astc_encoder_api::{CompressionSession, CompressionSettings, RawImage};
///
/// let image = RawImage::create(&[0u8; 64], 4, 4, 4, 1, false, false)?;
/// let session = CompressionSession::new(image, CompressionSettings::default());
/// let token = session.cancellation_token();
/// let outcome = session.run(|progress| println!("{:.0}%", progress * 100.0)).await?;
/// ```
#[derive(Debug)]
pub struct CompressionSession {
    image: RawImage,
    settings: CompressionSettings,
    token: CancellationToken,
}

impl CompressionSession {
    /// Creates a session for compressing `image` with `settings`.
    pub fn new(image: RawImage, settings: CompressionSettings) -> Self {
        Self {
            image,
            settings,
            token: CancellationToken::new(),
        }
    }

    /// A token that cancels this session. May be used before or during [`run`](Self::run).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs the compression to completion or cancellation.
    ///
    /// `on_progress` receives non-decreasing values in `[0, 1]` from the worker thread.
    /// If the token is already cancelled, no work is dispatched. Dropping the
    /// returned future before it resolves cancels the token, so the codec stops
    /// at its next checkpoint.
    ///
    /// # Errors
    ///
    /// The codec failure, or [`AstcError::WorkerFailed`] if the runtime shut down
    /// before the worker finished.
    ///
    /// # Panics
    ///
    /// Resumes panics raised by `on_progress` or the worker.
    pub async fn run<F>(self, mut on_progress: F) -> Result<CompressionOutcome, AstcError>
    where
        F: FnMut(f32) + Send + 'static,
    {
        if self.token.is_cancelled() {
            warn!("Compression session cancelled before it started");
            return Ok(CompressionOutcome::Cancelled);
        }

        debug!(
            "Starting compression session: {}x{} image, {}x{} blocks, quality {}",
            self.image.width(),
            self.image.height(),
            self.settings.block_width,
            self.settings.block_height,
            self.settings.quality
        );

        let Self {
            image,
            settings,
            token,
        } = self;
        let guard = CancelOnDrop(Some(token.clone()));
        let worker = tokio::task::spawn_blocking(move || {
            if token.is_cancelled() {
                return Ok(CompressionOutcome::Cancelled);
            }
            image.compress_blocking(&settings, &mut |progress| {
                on_progress(progress);
                token.is_cancelled()
            })
        });

        let joined = worker.await;
        guard.disarm();
        let outcome = match joined {
            Ok(result) => result?,
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(error) => return Err(AstcError::WorkerFailed(error.to_string())),
        };

        match &outcome {
            CompressionOutcome::Completed(image) => debug!(
                "Compression session finished: {} bytes of block data",
                image.data().len()
            ),
            CompressionOutcome::Cancelled => warn!("Compression session cancelled"),
        }
        Ok(outcome)
    }

    /// Runs the compression, cancelling it if it has not finished after `timeout`.
    ///
    /// The deadline only sets the cancellation flag; the codec stops at its next
    /// checkpoint, so the call can return later than `timeout`.
    pub async fn run_with_deadline<F>(
        self,
        timeout: Duration,
        on_progress: F,
    ) -> Result<CompressionOutcome, AstcError>
    where
        F: FnMut(f32) + Send + 'static,
    {
        let token = self.token.clone();
        let run = self.run(on_progress);
        tokio::pin!(run);

        tokio::select! {
            result = &mut run => result,
            _ = tokio::time::sleep(timeout) => {
                debug!("Compression deadline of {timeout:?} expired");
                token.cancel();
                run.await
            }
        }
    }
}

/// Cancels the session if `run` is dropped before the worker finishes.
struct CancelOnDrop(Option<CancellationToken>);

impl CancelOnDrop {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.0.take() {
            debug!("Compression session dropped before finishing, cancelling");
            token.cancel();
        }
    }
}
