//! Background image decoding: the one asynchronous boundary before compositing.

use std::sync::mpsc;

use image::RgbaImage;
use thiserror::Error;

use crate::geometry::ImageSize;

pub type LoadResult<T> = std::result::Result<T, LoadError>;

#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("failed to decode background image: {0}")]
    Decode(String),
    #[error("image decode worker exited without a result")]
    WorkerGone,
}

/// A template's background bitmap, possibly still being decoded.
#[derive(Debug)]
pub enum BackgroundImage {
    Loading(mpsc::Receiver<LoadResult<RgbaImage>>),
    Ready(RgbaImage),
    Failed(LoadError),
}

impl BackgroundImage {
    /// Starts decoding on a worker thread. Call [`BackgroundImage::poll`] to pick up the result.
    pub fn spawn_decode(bytes: Vec<u8>) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(decode_rgba(&bytes));
        });
        Self::Loading(rx)
    }

    pub fn decode_now(bytes: &[u8]) -> Self {
        match decode_rgba(bytes) {
            Ok(image) => Self::Ready(image),
            Err(err) => Self::Failed(err),
        }
    }

    /// Non-blocking. Returns `true` exactly when this call moved the image to `Ready`.
    pub fn poll(&mut self) -> bool {
        let Self::Loading(rx) = self else {
            return false;
        };
        let next = match rx.try_recv() {
            Ok(Ok(image)) => Self::Ready(image),
            Ok(Err(err)) => Self::Failed(err),
            Err(mpsc::TryRecvError::Empty) => return false,
            Err(mpsc::TryRecvError::Disconnected) => Self::Failed(LoadError::WorkerGone),
        };
        match &next {
            Self::Ready(image) => {
                tracing::info!(width = image.width(), height = image.height(), "background ready");
            }
            Self::Failed(err) => tracing::warn!(%err, "background load failed"),
            Self::Loading(_) => {}
        }
        *self = next;
        matches!(self, Self::Ready(_))
    }

    pub fn ready(&self) -> Option<&RgbaImage> {
        match self {
            Self::Ready(image) => Some(image),
            _ => None,
        }
    }

    pub fn native_size(&self) -> Option<ImageSize> {
        self.ready()
            .map(|image| ImageSize::new(image.width(), image.height()))
    }
}

fn decode_rgba(bytes: &[u8]) -> LoadResult<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgba8())
        .map_err(|err| LoadError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::tests::png_bytes;
    use std::time::{Duration, Instant};

    fn wait_until_settled(background: &mut BackgroundImage) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if background.poll() {
                return true;
            }
            if !matches!(background, BackgroundImage::Loading(_)) {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn worker_decode_becomes_ready_with_native_size() {
        let mut background = BackgroundImage::spawn_decode(png_bytes(8, 6, [9, 8, 7, 255]));
        assert!(wait_until_settled(&mut background));
        assert_eq!(background.native_size(), Some(ImageSize::new(8, 6)));
        assert!(!background.poll(), "ready image reports no further transition");
    }

    #[test]
    fn undecodable_bytes_fail_and_never_become_ready() {
        let mut background = BackgroundImage::spawn_decode(b"not an image".to_vec());
        assert!(!wait_until_settled(&mut background));
        assert!(matches!(
            background,
            BackgroundImage::Failed(LoadError::Decode(_))
        ));
        assert!(background.ready().is_none());
    }

    #[test]
    fn decode_now_is_synchronous() {
        let background = BackgroundImage::decode_now(&png_bytes(3, 2, [0, 0, 0, 255]));
        assert_eq!(background.native_size(), Some(ImageSize::new(3, 2)));
    }
}
