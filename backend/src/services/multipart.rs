//! Buffers a multipart form into memory, part by part.
//!
//! Both the contract form and the template upload are small, so every part the
//! handler asked for is collected whole. Parts with other names are drained
//! without being kept. Every byte read counts towards the total limit and
//! every part towards the part limit; crossing either aborts the read.

use actix_multipart::Multipart;
use futures_util::StreamExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("malformed form data: {0}")]
    Malformed(String),
    #[error("{subject} exceeds the {limit} byte limit")]
    TooLarge { subject: String, limit: usize },
    #[error("the form has more than {0} parts")]
    TooManyParts(usize),
    #[error("the field \"{0}\" is not valid UTF-8 text")]
    Encoding(String),
}

/// Bounds applied while reading one form.
#[derive(Debug, Clone, Copy)]
pub struct FormLimits {
    pub max_part_bytes: usize,
    pub max_total_bytes: usize,
    pub max_parts: usize,
}

impl FormLimits {
    /// Room for every expected field at the part limit. Drained parts share the
    /// same total, and the part count allows one stray part per field.
    pub fn for_fields(fields: &[&str], max_part_bytes: usize) -> Self {
        Self {
            max_part_bytes,
            max_total_bytes: max_part_bytes.saturating_mul(fields.len().max(1)),
            max_parts: fields.len() * 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    /// Set for file inputs, even when the browser sent no file.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl FormPart {
    pub fn text(&self) -> Result<String, FormError> {
        String::from_utf8(self.bytes.clone()).map_err(|_| FormError::Encoding(self.name.clone()))
    }
}

#[derive(Debug, Default)]
pub struct FormParts {
    parts: Vec<FormPart>,
}

impl FormParts {
    /// The first part named `name`.
    pub fn get(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// The text of the part `name`; `Ok(None)` when the form has no such part.
    pub fn text(&self, name: &str) -> Result<Option<String>, FormError> {
        self.get(name).map(FormPart::text).transpose()
    }

    pub fn take(&mut self, name: &str) -> Option<FormPart> {
        let index = self.parts.iter().position(|p| p.name == name)?;
        Some(self.parts.remove(index))
    }
}

/// Reads the parts named in `fields`.
pub async fn read_form(
    mut payload: Multipart,
    fields: &[&str],
    limits: FormLimits,
) -> Result<FormParts, FormError> {
    let mut parts = Vec::new();
    let mut seen = 0usize;
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| FormError::Malformed(e.to_string()))?;
        seen += 1;
        if seen > limits.max_parts {
            return Err(FormError::TooManyParts(limits.max_parts));
        }

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(|n| n.to_string()),
                cd.get_filename().map(|f| f.to_string()),
            ),
            None => (None, None),
        };
        let wanted = name.filter(|n| fields.contains(&n.as_str()));

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| FormError::Malformed(e.to_string()))?;
            total += chunk.len();
            if total > limits.max_total_bytes {
                return Err(FormError::TooLarge {
                    subject: "the form".to_string(),
                    limit: limits.max_total_bytes,
                });
            }
            let Some(name) = wanted.as_deref() else {
                continue;
            };
            if bytes.len() + chunk.len() > limits.max_part_bytes {
                return Err(FormError::TooLarge {
                    subject: format!("the field \"{name}\""),
                    limit: limits.max_part_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        if let Some(name) = wanted {
            parts.push(FormPart {
                name,
                filename,
                bytes,
            });
        }
    }

    Ok(FormParts { parts })
}

/// Multipart bodies for handler tests.
#[cfg(test)]
pub(crate) mod testing {
    pub const BOUNDARY: &str = "----contract-test-boundary";

    pub enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut out = Vec::new();
        for part in parts {
            out.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, filename, bytes) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(bytes);
                    out.extend_from_slice(b"\r\n");
                }
            }
        }
        out.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{body, content_type, Part};
    use super::*;
    use actix_web::{test, FromRequest};

    async fn read(parts: &[Part<'_>], fields: &[&str], limits: FormLimits) -> Result<FormParts, FormError> {
        let (req, mut payload) = test::TestRequest::post()
            .insert_header(("content-type", content_type()))
            .set_payload(body(parts))
            .to_http_parts();
        let multipart = Multipart::from_request(&req, &mut payload).await.unwrap();
        read_form(multipart, fields, limits).await
    }

    fn limits(part: usize, total: usize, count: usize) -> FormLimits {
        FormLimits {
            max_part_bytes: part,
            max_total_bytes: total,
            max_parts: count,
        }
    }

    #[actix_web::test]
    async fn unknown_parts_are_not_kept() {
        let parts = read(
            &[Part::Text("junk", "xxxx"), Part::Text("fullname", "Ada")],
            &["fullname"],
            limits(1024, 4096, 8),
        )
        .await
        .unwrap();
        assert!(parts.get("junk").is_none());
        assert_eq!(parts.text("fullname").unwrap().as_deref(), Some("Ada"));
    }

    #[actix_web::test]
    async fn many_small_parts_hit_the_total_limit() {
        let junk = "x".repeat(1000);
        let names: Vec<String> = (0..50).map(|i| format!("junk{i}")).collect();
        let many: Vec<Part<'_>> = names.iter().map(|n| Part::Text(n, &junk)).collect();

        let err = read(&many, &["fullname"], limits(1024, 4096, 100)).await.unwrap_err();
        assert!(matches!(err, FormError::TooLarge { limit: 4096, .. }));
    }

    #[actix_web::test]
    async fn part_count_is_bounded() {
        let many: Vec<Part<'_>> = (0..10).map(|_| Part::Text("fullname", "a")).collect();
        let err = read(&many, &["fullname"], limits(1024, 4096, 4)).await.unwrap_err();
        assert!(matches!(err, FormError::TooManyParts(4)));
    }

    #[actix_web::test]
    async fn oversized_part_names_the_field() {
        let err = read(
            &[Part::Text("fullname", &"a".repeat(64))],
            &["fullname"],
            limits(16, 4096, 8),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("\"fullname\""));
    }

    #[actix_web::test]
    async fn invalid_utf8_is_an_encoding_error() {
        let parts = read(
            &[Part::File("fullname", "name.txt", b"\xff\xfeAda")],
            &["fullname"],
            limits(1024, 4096, 8),
        )
        .await
        .unwrap();
        assert!(matches!(parts.text("fullname"), Err(FormError::Encoding(name)) if name == "fullname"));
        assert_eq!(parts.text("email").unwrap(), None);
    }

    #[::core::prelude::v1::test]
    fn limits_scale_with_the_expected_fields() {
        let limits = FormLimits::for_fields(&["a", "b", "c"], 100);
        assert_eq!(limits.max_total_bytes, 300);
        assert_eq!(limits.max_parts, 6);
    }
}
