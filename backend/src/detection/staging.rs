use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Side length of the square input the detection model expects.
pub const DETECTION_INPUT_SIZE: u32 = 640;

/// An upload written to a uniquely named temporary file.
///
/// The file is removed when the guard drops, on every exit path of the
/// request that owns it. Removal failures are logged and swallowed.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    guard: Option<TempPath>,
}

impl StagedUpload {
    /// Creates an empty file in `dir`. `extension` is used without the dot.
    pub fn create(dir: &Path, extension: Option<&str>) -> std::io::Result<Self> {
        let suffix = extension
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        let guard = file.into_temp_path();
        let path = guard.to_path_buf();
        log::debug!("Staging upload at {}", path.display());
        Ok(Self {
            path,
            guard: Some(guard),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::write(&self.path, bytes).await
    }

    /// Runs [`normalize_image`] over the staged file and hands the guard
    /// back afterwards, so removal can never race the re-encode. Blocking.
    pub fn normalize(self) -> (Self, Result<(u32, u32), NormalizeError>) {
        let result = normalize_image(&self.path);
        (self, result)
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        match guard.close() {
            Ok(()) => log::debug!("Temporary image deleted: {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("Temporary image already gone: {}", self.path.display())
            }
            Err(e) => log::error!(
                "Error deleting temporary file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("could not read the uploaded image: {0}")]
    Unreadable(String),
    #[error("could not write the resized image: {0}")]
    Write(#[from] image::ImageError),
}

/// Decodes the image at `path`, resizes it to the model's square input and
/// writes it back over the same file.
///
/// The format is sniffed from the content, so a mislabelled extension still
/// decodes. The output format follows the file extension when it names a
/// known format, otherwise the sniffed one.
pub fn normalize_image(path: &Path) -> Result<(u32, u32), NormalizeError> {
    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| NormalizeError::Unreadable(e.to_string()))?;
    let sniffed = reader
        .format()
        .ok_or_else(|| NormalizeError::Unreadable("unrecognised image format".into()))?;
    let decoded = reader
        .decode()
        .map_err(|e| NormalizeError::Unreadable(e.to_string()))?;

    let original = (decoded.width(), decoded.height());
    let resized = DynamicImage::ImageRgb8(decoded.to_rgb8()).resize_exact(
        DETECTION_INPUT_SIZE,
        DETECTION_INPUT_SIZE,
        FilterType::Triangle,
    );

    let format = ImageFormat::from_path(path).unwrap_or(sniffed);
    resized.save_with_format(path, format)?;
    Ok(original)
}
