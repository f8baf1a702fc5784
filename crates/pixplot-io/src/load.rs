//! Source image loading.

use std::path::Path;

use image::DynamicImage;

use crate::error::{ConvertError, ImageLoadError};

/// Read and decode the image at `path`.
///
/// The format is sniffed from the file contents, not the extension.
///
/// # Errors
///
/// Returns [`ConvertError::ImageLoad`] if the file cannot be read or is
/// not a decodable image.
pub fn load_image(path: &Path) -> Result<DynamicImage, ConvertError> {
    let load_error = |source: ImageLoadError| ConvertError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    let bytes = std::fs::read(path).map_err(|e| load_error(e.into()))?;
    let image = pixplot_pipeline::grayscale::decode(&bytes).map_err(|e| load_error(e.into()))?;

    tracing::debug!(
        path = %path.display(),
        bytes = bytes.len(),
        width = image.width(),
        height = image.height(),
        "loaded image"
    );
    Ok(image)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        let err = load_image(&path).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::ImageLoad {
                source: ImageLoadError::Read(_),
                ..
            }
        ));
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(matches!(
            load_image(&path),
            Err(ConvertError::ImageLoad {
                source: ImageLoadError::Decode(_),
                ..
            })
        ));
    }

    #[test]
    fn empty_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            load_image(&path),
            Err(ConvertError::ImageLoad {
                source: ImageLoadError::Decode(pixplot_pipeline::PipelineError::EmptyInput),
                ..
            })
        ));
    }
}
