use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use thiserror::Error;

const FILE_PREFIX: &str = "certificate_";

pub type ExportResult<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("background image is not loaded yet")]
    NotReady,
    #[error("failed to encode png")]
    Encode(#[from] image::ImageError),
    #[error("failed to write certificate {path}")]
    Write { path: PathBuf, source: io::Error },
}

pub fn encode_png(image: &RgbaImage) -> ExportResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// `certificate_<name>.png`, with whitespace runs turned into `_` and anything that is not an
/// ASCII letter, digit, `_` or `-` removed.
pub fn certificate_file_name(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                stem.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            stem.push(ch);
        }
    }
    format!("{FILE_PREFIX}{stem}.png")
}

/// Writes `bytes` into `dir/file_name`, creating the directory and replacing any existing file.
pub fn save_png(dir: &Path, file_name: &str, bytes: &[u8]) -> ExportResult<PathBuf> {
    let path = dir.join(file_name);
    let write_error = |source| ExportError::Write {
        path: path.clone(),
        source,
    };
    fs::create_dir_all(dir).map_err(write_error)?;
    fs::write(&path, bytes).map_err(write_error)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "certificate saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn file_name_replaces_whitespace_and_strips_symbols() {
        assert_eq!(certificate_file_name("John Doe"), "certificate_John_Doe.png");
        assert_eq!(
            certificate_file_name("  Mary-Ann   O'Neil! "),
            "certificate__Mary-Ann_ONeil_.png"
        );
    }

    #[test]
    fn file_name_drops_non_ascii_letters() {
        assert_eq!(certificate_file_name("احمد علی"), "certificate__.png");
    }

    #[test]
    fn encoded_png_decodes_to_same_pixels() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let bytes = encode_png(&image).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn save_png_creates_directory_and_overwrites() {
        let mut dir = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        dir.push(format!("certstamp-export-{}-{nanos}", std::process::id()));
        dir.push("nested");

        let path = save_png(&dir, "certificate_a.png", b"first").unwrap();
        save_png(&dir, "certificate_a.png", b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        let _ = fs::remove_dir_all(dir.parent().unwrap());
    }
}
