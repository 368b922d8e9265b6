//! # Image Intake
//!
//! Uploaded images arrive either as a multipart file or as a base64 string.
//! Exactly one source is accepted per request. Decoded bytes are spilled to
//! a named temporary file so the coordinator can stage them.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use locus_core::LocusError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extensions picked up from the test image directory, in preference order.
pub const TEST_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// An image held in memory, ready to be spilled to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

impl ImageUpload {
    /// Accept a multipart file part.
    pub fn from_file(
        content_type: Option<&str>,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> Result<Self, LocusError> {
        let extension = extension_for_content_type(content_type)?;
        check_size(bytes.len(), max_bytes)?;
        Ok(Self { bytes, extension })
    }

    /// Accept a base64 field, with or without a `data:<mime>;base64,` prefix.
    pub fn from_base64(data: &str, max_bytes: usize) -> Result<Self, LocusError> {
        let bytes = decode_base64(data)?;
        check_size(bytes.len(), max_bytes)?;
        let extension = sniff_extension(&bytes);
        Ok(Self { bytes, extension })
    }

    /// Write the image to a temporary file that is removed on drop.
    pub fn persist(&self) -> Result<tempfile::NamedTempFile, LocusError> {
        let suffix = format!(".{}", self.extension);
        let mut file = tempfile::Builder::new()
            .prefix("locus-upload-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| LocusError::IoError(format!("creating upload file: {}", e)))?;
        file.write_all(&self.bytes)
            .and_then(|()| file.flush())
            .map_err(|e| LocusError::IoError(format!("writing upload file: {}", e)))?;
        Ok(file)
    }
}

/// Pick the single image source out of the two optional fields.
pub fn choose_source(
    file: Option<ImageUpload>,
    base64: Option<ImageUpload>,
) -> Result<ImageUpload, LocusError> {
    match (file, base64) {
        (Some(image), None) | (None, Some(image)) => Ok(image),
        (Some(_), Some(_)) => Err(LocusError::InvalidImage(
            "provide either an image file or image_base64, not both".to_string(),
        )),
        (None, None) => Err(LocusError::InvalidImage(
            "an image file or image_base64 is required".to_string(),
        )),
    }
}

fn extension_for_content_type(content_type: Option<&str>) -> Result<&'static str, LocusError> {
    let mime = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .unwrap_or_default();
    match mime.as_str() {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/bmp" => Ok("bmp"),
        "" => Err(LocusError::InvalidImage(
            "image file has no content type".to_string(),
        )),
        other => Err(LocusError::InvalidImage(format!(
            "unsupported image type {}",
            other
        ))),
    }
}

fn decode_base64(data: &str) -> Result<Vec<u8>, LocusError> {
    let data = data.trim();
    let payload = match data.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .ok_or_else(|| LocusError::InvalidImage("malformed data URI".to_string()))?,
        None => data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(LocusError::InvalidImage("image_base64 is empty".to_string()));
    }
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| LocusError::InvalidImage(format!("invalid base64: {}", e)))
}

fn check_size(len: usize, max_bytes: usize) -> Result<(), LocusError> {
    if len == 0 {
        return Err(LocusError::InvalidImage("image is empty".to_string()));
    }
    if len > max_bytes {
        return Err(LocusError::InvalidImage(format!(
            "image is {} bytes, limit is {}",
            len, max_bytes
        )));
    }
    Ok(())
}

/// File extension from magic bytes; JPEG when unrecognised.
fn sniff_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if bytes.starts_with(b"BM") {
        "bmp"
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        "tiff"
    } else {
        "jpg"
    }
}

/// First image in `dir` by file name.
pub fn first_test_image(dir: &Path) -> Result<PathBuf, LocusError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        LocusError::NotFound(format!("test image directory {}: {}", dir.display(), e))
    })?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    images.sort();

    images.into_iter().next().ok_or_else(|| {
        LocusError::NotFound(format!("no test images in {}", dir.display()))
    })
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            TEST_IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 1024;
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn base64_with_and_without_data_uri() {
        let encoded = STANDARD.encode(PNG);
        let plain = ImageUpload::from_base64(&encoded, LIMIT).expect("plain");
        let uri = ImageUpload::from_base64(&format!("data:image/png;base64,{}", encoded), LIMIT)
            .expect("data uri");
        assert_eq!(plain, uri);
        assert_eq!(plain.extension, "png");
        assert_eq!(plain.bytes, PNG);
    }

    #[test]
    fn base64_rejects_garbage_and_oversize() {
        assert!(ImageUpload::from_base64("not base64!!", LIMIT).is_err());
        assert!(ImageUpload::from_base64("data:image/png,abc", LIMIT).is_err());
        assert!(ImageUpload::from_base64("   ", LIMIT).is_err());
        let big = STANDARD.encode(vec![0xFFu8; LIMIT + 1]);
        let err = ImageUpload::from_base64(&big, LIMIT).expect_err("too big");
        assert!(matches!(err, LocusError::InvalidImage(_)));
    }

    #[test]
    fn file_content_types() {
        assert_eq!(
            ImageUpload::from_file(Some("image/jpeg"), vec![1], LIMIT)
                .expect("jpeg")
                .extension,
            "jpg"
        );
        assert!(ImageUpload::from_file(Some("image/png; charset=binary"), vec![1], LIMIT).is_ok());
        assert!(ImageUpload::from_file(Some("text/plain"), vec![1], LIMIT).is_err());
        assert!(ImageUpload::from_file(None, vec![1], LIMIT).is_err());
    }

    #[test]
    fn exactly_one_source() {
        let image = || ImageUpload {
            bytes: vec![1],
            extension: "jpg",
        };
        assert!(choose_source(Some(image()), None).is_ok());
        assert!(choose_source(None, Some(image())).is_ok());
        assert!(choose_source(Some(image()), Some(image())).is_err());
        assert!(choose_source(None, None).is_err());
    }

    #[test]
    fn persisted_upload_keeps_extension() {
        let upload = ImageUpload {
            bytes: PNG.to_vec(),
            extension: "png",
        };
        let file = upload.persist().expect("persist");
        assert_eq!(
            file.path().extension().and_then(|e| e.to_str()),
            Some("png")
        );
        assert_eq!(std::fs::read(file.path()).expect("read"), PNG);
    }

    #[test]
    fn test_image_lookup_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.txt"), b"x").expect("write");
        std::fs::write(dir.path().join("b.PNG"), b"x").expect("write");
        std::fs::write(dir.path().join("a.jpg"), b"x").expect("write");
        let first = first_test_image(dir.path()).expect("image");
        assert_eq!(first.file_name().and_then(|n| n.to_str()), Some("a.jpg"));
    }

    #[test]
    fn empty_test_directory_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = first_test_image(dir.path()).expect_err("empty");
        assert!(matches!(err, LocusError::NotFound(_)));
        let err = first_test_image(&dir.path().join("missing")).expect_err("missing");
        assert!(matches!(err, LocusError::NotFound(_)));
    }
}
