use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};

use crate::{
    error::{FoodgramError, FoodgramResult},
    IMAGE_MIME_TYPES, RECIPE_IMAGE_DIR,
};

const DEFAULT_MEDIA_SEGMENT: &str = "media";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Decodes either a `data:image/<type>;base64,<data>` URI or bare base64 data.
pub fn decode_base64_image(payload: &str) -> FoodgramResult<DecodedImage> {
    let payload = payload.trim();

    let data = match payload.strip_prefix("data:") {
        Some(uri) => {
            let (header, data) = uri
                .split_once(',')
                .ok_or_else(|| FoodgramError::Image(String::from("Malformed data URI")))?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or_else(|| FoodgramError::Image(String::from("Image must be base64 encoded")))?;
            if !IMAGE_MIME_TYPES.contains(&mime) {
                return Err(FoodgramError::Image(format!("Unsupported image format {mime}")));
            }
            data
        }
        None => payload,
    };

    let data: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if data.is_empty() {
        return Err(FoodgramError::Image(String::from("Empty image")));
    }

    let bytes = general_purpose::STANDARD
        .decode(data.as_bytes())
        .map_err(|_| FoodgramError::Image(String::from("Invalid base64 image")))?;

    let extension = sniff_extension(&bytes).ok_or_else(|| {
        FoodgramError::Image(String::from("Uploaded file is not a valid image"))
    })?;

    Ok(DecodedImage { bytes, extension })
}

fn sniff_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Stores uploaded images under the media root and renders their public URLs.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    root: PathBuf,
    url: String,
}

impl ImageStorage {
    pub fn new(root: impl Into<PathBuf>, url: &str) -> Self {
        Self {
            root: root.into(),
            url: url.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the image and returns its path relative to the media root.
    pub async fn save(&self, image: &DecodedImage) -> FoodgramResult<String> {
        let dir = self.root.join(RECIPE_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| FoodgramError::Storage(format!("Failed to create {dir:?}: {e}")))?;

        let name = format!("{}.{}", uuid::Uuid::new_v4(), image.extension);
        tokio::fs::write(dir.join(&name), &image.bytes)
            .await
            .map_err(|e| FoodgramError::Storage(format!("Failed to store image: {e}")))?;

        Ok(format!("{RECIPE_IMAGE_DIR}/{name}"))
    }

    pub async fn remove(&self, path: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(path)).await {
            log::warn!("Failed to remove image {path}: {e}");
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    /// First path segment of the media URL, which is where stored files are served locally.
    /// For absolute URLs the scheme and host are skipped.
    pub fn mount_segment(&self) -> String {
        let path = match self.url.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
            None => self.url.as_str(),
        };

        path.split('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(DEFAULT_MEDIA_SEGMENT)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent png
    const PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn decodes_data_uri() {
        let image = decode_base64_image(&format!("data:image/png;base64,{PNG}")).unwrap();

        assert_eq!(image.extension, "png");
        assert!(image.bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn decodes_bare_base64() {
        let image = decode_base64_image(PNG).unwrap();
        assert_eq!(image.extension, "png");
    }

    #[test]
    fn rejects_unsupported_mime() {
        let result = decode_base64_image(&format!("data:text/plain;base64,{PNG}"));
        assert!(matches!(result, Err(FoodgramError::Image(_))));
    }

    #[test]
    fn rejects_non_image_payload() {
        let text = general_purpose::STANDARD.encode("definitely not an image");
        let result = decode_base64_image(&text);
        assert_eq!(
            result,
            Err(FoodgramError::Image(String::from(
                "Uploaded file is not a valid image"
            )))
        );
    }

    #[test]
    fn rejects_broken_base64() {
        assert!(decode_base64_image("data:image/png;base64,@@@").is_err());
        assert!(decode_base64_image("").is_err());
    }

    #[tokio::test]
    async fn saved_image_is_served_under_media_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ImageStorage::new(dir.path(), "/media/");
        let image = decode_base64_image(PNG).unwrap();

        let path = storage.save(&image).await.unwrap();

        assert!(path.starts_with("recipes/images/"));
        assert!(path.ends_with(".png"));
        assert_eq!(std::fs::read(dir.path().join(&path)).unwrap(), image.bytes);
        assert_eq!(storage.url(&path), format!("/media/{path}"));

        storage.remove(&path).await;
        assert!(!dir.path().join(&path).exists());
    }

    #[test]
    fn mount_segment_uses_the_url_path() {
        let mount = |url: &str| ImageStorage::new("media", url).mount_segment();

        assert_eq!(mount("/media/"), "media");
        assert_eq!(mount("/uploads/recipes/"), "uploads");
        assert_eq!(mount("https://cdn.example.com/static/"), "static");
        assert_eq!(mount("https://cdn.example.com/"), "media");
        assert_eq!(mount("/"), "media");
    }
}
