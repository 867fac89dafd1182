//! # Signature Resolution
//!
//! A submission carries its signature in one of two competing form parts: an
//! uploaded image file (`signatureUpload`) or a canvas drawing posted as a
//! `data:image/png;base64,...` string (`signatureData`). This module turns the
//! raw pair into exactly one `SignatureSource`, decodes it and persists the
//! image bytes through a `SignatureStore`.
//!
//! Whether the stored file survives the request is decided by the configured
//! `SignatureRetention`, applied by the pipeline once the request is over.

mod store;

pub use store::{FsSignatureStore, SignatureHandle, SignatureStore};

use crate::error::ContractError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::ImageFormat;
use std::str::FromStr;

const DRAWN_PREFIX: &str = "data:image/png;base64,";

/// A file part received from the form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The signature parts exactly as the form delivered them.
///
/// Browsers submit an empty part for an untouched file input and an empty
/// string for an unused hidden field; both count as absent.
#[derive(Debug, Clone, Default)]
pub struct SignatureInput {
    pub upload: Option<UploadedFile>,
    pub drawn: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignatureSource {
    Uploaded { bytes: Vec<u8>, filename: String },
    Drawn { data_uri: String },
}

impl SignatureSource {
    /// The single place where the "exactly one of" rule is enforced.
    pub fn from_input(input: SignatureInput) -> Result<Self, ContractError> {
        let upload = input
            .upload
            .filter(|f| !(f.filename.is_empty() && f.bytes.is_empty()));
        let drawn = input.drawn.filter(|d| !d.trim().is_empty());

        match (upload, drawn) {
            (Some(_), Some(_)) => Err(ContractError::AmbiguousSignature),
            (Some(file), None) => Ok(Self::Uploaded {
                bytes: file.bytes,
                filename: file.filename,
            }),
            (None, Some(data_uri)) => Ok(Self::Drawn { data_uri }),
            (None, None) => Err(ContractError::MissingSignature(
                "Please upload or draw your signature.".to_string(),
            )),
        }
    }
}

/// What happens to a stored signature once its request has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureRetention {
    Delete,
    Keep,
}

impl FromStr for SignatureRetention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delete" => Ok(Self::Delete),
            "keep" => Ok(Self::Keep),
            other => Err(format!("unknown signature retention policy {other:?}")),
        }
    }
}

impl std::fmt::Display for SignatureRetention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => f.write_str("delete"),
            Self::Keep => f.write_str("keep"),
        }
    }
}

/// A signature image that has been decoded and written to the signature store.
#[derive(Debug, Clone)]
pub struct StoredSignature {
    pub handle: SignatureHandle,
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl StoredSignature {
    /// Inline URI suitable for an `<img src>` attribute.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

/// Decodes the signature source and persists its bytes.
pub fn resolve(
    source: SignatureSource,
    store: &dyn SignatureStore,
) -> Result<StoredSignature, ContractError> {
    let bytes = match source {
        SignatureSource::Uploaded { bytes, filename } => {
            if bytes.is_empty() {
                return Err(ContractError::MissingSignature(format!(
                    "The uploaded signature file {filename:?} is empty."
                )));
            }
            bytes
        }
        SignatureSource::Drawn { data_uri } => decode_drawn(&data_uri)?,
    };

    let (mime, ext) = image_kind(&bytes);
    let handle = store.put(&bytes, ext)?;
    Ok(StoredSignature {
        handle,
        bytes,
        mime,
    })
}

fn decode_drawn(data_uri: &str) -> Result<Vec<u8>, ContractError> {
    let payload = data_uri
        .trim()
        .strip_prefix(DRAWN_PREFIX)
        .ok_or_else(|| {
            ContractError::SignatureDecodeError("expected a data:image/png;base64 payload".to_string())
        })?
        .trim();

    if payload.is_empty() {
        return Err(ContractError::MissingSignature(
            "The drawn signature is empty.".to_string(),
        ));
    }

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| ContractError::SignatureDecodeError(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ContractError::MissingSignature(
            "The drawn signature is empty.".to_string(),
        ));
    }
    Ok(bytes)
}

/// MIME type and file extension for the image, PNG unless the bytes say otherwise.
fn image_kind(bytes: &[u8]) -> (&'static str, &'static str) {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => ("image/jpeg", "jpg"),
        Ok(ImageFormat::Gif) => ("image/gif", "gif"),
        _ => ("image/png", "png"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl SignatureStore for MemoryStore {
        fn put(&self, bytes: &[u8], ext: &str) -> Result<SignatureHandle, StoreError> {
            let mut files = self.files.lock().unwrap();
            let name = format!("sig-{}.{}", files.len(), ext);
            files.push((name.clone(), bytes.to_vec()));
            Ok(SignatureHandle(name))
        }

        fn delete(&self, _handle: &SignatureHandle) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn upload(bytes: &[u8]) -> Option<UploadedFile> {
        Some(UploadedFile {
            filename: "signature.png".to_string(),
            bytes: bytes.to_vec(),
        })
    }

    #[test]
    fn both_sources_are_rejected() {
        let input = SignatureInput {
            upload: upload(b"\x89PNG\r\n\x1a\n"),
            drawn: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
        };
        assert!(matches!(
            SignatureSource::from_input(input),
            Err(ContractError::AmbiguousSignature)
        ));
    }

    #[test]
    fn no_source_is_missing() {
        let input = SignatureInput {
            upload: Some(UploadedFile {
                filename: String::new(),
                bytes: Vec::new(),
            }),
            drawn: Some("   ".to_string()),
        };
        assert!(matches!(
            SignatureSource::from_input(input),
            Err(ContractError::MissingSignature(_))
        ));
    }

    #[test]
    fn drawn_signature_is_decoded_and_stored() {
        let store = MemoryStore::default();
        let source = SignatureSource::Drawn {
            data_uri: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        };
        let stored = resolve(source, &store).unwrap();
        assert_eq!(stored.bytes, b"\x89PNG\r\n\x1a\n");
        assert_eq!(stored.mime, "image/png");
        assert_eq!(stored.data_uri(), "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(store.files.lock().unwrap().len(), 1);
    }

    #[test]
    fn drawn_signature_with_wrong_prefix_fails_to_decode() {
        let store = MemoryStore::default();
        let source = SignatureSource::Drawn {
            data_uri: "data:text/plain;base64,aGVsbG8=".to_string(),
        };
        assert!(matches!(
            resolve(source, &store),
            Err(ContractError::SignatureDecodeError(_))
        ));
        assert!(store.files.lock().unwrap().is_empty());
    }

    #[test]
    fn drawn_signature_with_invalid_base64_fails_to_decode() {
        let store = MemoryStore::default();
        let source = SignatureSource::Drawn {
            data_uri: "data:image/png;base64,not base64!".to_string(),
        };
        assert!(matches!(
            resolve(source, &store),
            Err(ContractError::SignatureDecodeError(_))
        ));
    }

    #[test]
    fn empty_drawn_payload_is_missing() {
        let store = MemoryStore::default();
        let source = SignatureSource::Drawn {
            data_uri: "data:image/png;base64,".to_string(),
        };
        assert!(matches!(
            resolve(source, &store),
            Err(ContractError::MissingSignature(_))
        ));
    }

    #[test]
    fn empty_upload_is_missing() {
        let store = MemoryStore::default();
        let source = SignatureSource::Uploaded {
            bytes: Vec::new(),
            filename: "blank.png".to_string(),
        };
        assert!(matches!(
            resolve(source, &store),
            Err(ContractError::MissingSignature(_))
        ));
    }

    #[test]
    fn jpeg_uploads_keep_their_mime_type() {
        let store = MemoryStore::default();
        let source = SignatureSource::Uploaded {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'],
            filename: "signature.jpg".to_string(),
        };
        let stored = resolve(source, &store).unwrap();
        assert_eq!(stored.mime, "image/jpeg");
        assert!(stored.handle.as_str().ends_with(".jpg"));
    }

    #[test]
    fn retention_policy_parses_case_insensitively() {
        assert_eq!("KEEP".parse::<SignatureRetention>().unwrap(), SignatureRetention::Keep);
        assert_eq!("delete".parse::<SignatureRetention>().unwrap(), SignatureRetention::Delete);
        assert!("never".parse::<SignatureRetention>().is_err());
    }
}
