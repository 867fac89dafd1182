//! HTML to PDF conversion.
//!
//! The pipeline only depends on the `PdfRenderer` trait. `GenpdfRenderer` is
//! the production implementation; it lays out the block structure produced by
//! `html::parse` with `genpdf`.

mod genpdf_renderer;
pub mod html;

pub use genpdf_renderer::GenpdfRenderer;

use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    A4,
    Letter,
}

impl PageSize {
    /// Portrait width and height in millimetres.
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            other => Err(format!("unknown page size {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(format!("unknown page orientation {other:?}")),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("font loading failed: {0}")]
    Font(String),
    #[error("PDF layout failed: {0}")]
    Pdf(#[from] genpdf::error::Error),
    #[error("image processing failed: {0}")]
    Image(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts a complete HTML document to PDF bytes.
///
/// Implementations must accept inline `data:` image URIs.
pub trait PdfRenderer: Send + Sync {
    fn render(
        &self,
        html: &str,
        page_size: PageSize,
        orientation: Orientation,
    ) -> Result<Vec<u8>, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_settings_parse() {
        assert_eq!("A4".parse::<PageSize>().unwrap(), PageSize::A4);
        assert_eq!("letter".parse::<PageSize>().unwrap(), PageSize::Letter);
        assert!("A5".parse::<PageSize>().is_err());
        assert_eq!("Landscape".parse::<Orientation>().unwrap(), Orientation::Landscape);
    }
}
