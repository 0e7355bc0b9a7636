use crate::config::FetchConfig;
use image::{DynamicImage, ImageReader};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}")]
    Status { status: StatusCode },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid file URL: {url}")]
    InvalidFileUrl { url: String },
}

/// Downloads logo images and decodes them to RGB.
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client })
    }

    /// Fetch and decode the image at `location`, or `None` when that fails.
    ///
    /// `location` may be an `http(s)://` URL, a `file://` URL or a local path.
    pub fn fetch(&self, location: &str) -> Option<DynamicImage> {
        match self.try_fetch(location) {
            Ok(image) => Some(image),
            Err(err) => {
                log::warn!("Error downloading logo from {}: {}", location, err);
                None
            }
        }
    }

    pub fn try_fetch(&self, location: &str) -> Result<DynamicImage, FetchError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self.client.get(location).send()?;
            if response.status() != StatusCode::OK {
                return Err(FetchError::Status {
                    status: response.status(),
                });
            }
            let bytes = response.bytes()?;
            decode_bytes(&bytes)
        } else {
            decode_file(&local_path(location)?)
        }
    }
}

fn local_path(location: &str) -> Result<PathBuf, FetchError> {
    if location.starts_with("file://") {
        Url::parse(location)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .ok_or_else(|| FetchError::InvalidFileUrl {
                url: location.to_string(),
            })
    } else {
        Ok(PathBuf::from(location))
    }
}

/// Decode raw image bytes, dropping any alpha channel.
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, FetchError> {
    let image = image::load_from_memory(bytes)?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

fn decode_file(path: &Path) -> Result<DynamicImage, FetchError> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_fn(16, 16, |x, _| {
            if x < 8 {
                Rgba([0u8, 0, 0, 255])
            } else {
                Rgba([255u8, 255, 255, 128])
            }
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_bytes_converts_to_rgb() {
        let image = decode_bytes(&png_bytes()).unwrap();
        assert!(matches!(image, DynamicImage::ImageRgb8(_)));
        assert_eq!((image.width(), image.height()), (16, 16));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode_bytes(b"<html>not an image</html>"),
            Err(FetchError::Image(_))
        ));
    }

    #[test]
    fn test_fetch_local_path_and_file_url() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logo.png");
        fs::write(&path, png_bytes()).unwrap();

        let fetcher = ImageFetcher::new(&FetchConfig::default()).unwrap();
        assert!(fetcher.fetch(path.to_str().unwrap()).is_some());

        let file_url = Url::from_file_path(&path).unwrap();
        assert!(fetcher.fetch(file_url.as_str()).is_some());
    }

    #[test]
    fn test_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = ImageFetcher::new(&FetchConfig::default()).unwrap();
        let missing = temp_dir.path().join("missing.png");
        assert!(fetcher.fetch(missing.to_str().unwrap()).is_none());
    }
}
