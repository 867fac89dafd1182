use super::html::{self, Block, TextSegment, TextStyle};
use super::{Orientation, PageSize, PdfRenderer, RenderError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use genpdf::elements::{Break, Image as PdfImage, LinearLayout, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Style, StyledString};
use genpdf::Document;
use image::imageops::FilterType;
use image::{load_from_memory, DynamicImage, GenericImageView};
use log::warn;
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const MARGIN_MM: f64 = 10.0;
const IMAGE_DPI: f64 = 150.0;
const BODY_FONT_SIZE: u8 = 10;
/// Same limit the signature `<img>` carries in the form's CSS.
const CSS_MAX_IMAGE_PX: f64 = 200.0;

/// `PdfRenderer` built on `genpdf`. Fonts are loaded once, at construction.
pub struct GenpdfRenderer {
    fonts: FontFamily<FontData>,
}

impl GenpdfRenderer {
    /// Loads the Arial family from `fonts_dir` if present, otherwise `family`.
    pub fn new(fonts_dir: &Path, family: &str) -> Result<Self, RenderError> {
        let fonts = match genpdf::fonts::from_files(fonts_dir, "Arial", None) {
            Ok(fonts) => fonts,
            Err(_) => genpdf::fonts::from_files(fonts_dir, family, None).map_err(|e| {
                RenderError::Font(format!("{} in {}: {}", family, fonts_dir.display(), e))
            })?,
        };
        Ok(Self { fonts })
    }

    fn configure_document(&self, page_size: PageSize, orientation: Orientation) -> Document {
        let mut doc = Document::new(self.fonts.clone());
        doc.set_title("Contract");
        doc.set_font_size(BODY_FONT_SIZE);
        doc.set_line_spacing(1.25);

        let (width, height) = page_dimensions(page_size, orientation);
        doc.set_paper_size(genpdf::Size::new(width, height));

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(MARGIN_MM as i32);
        doc.set_page_decorator(decorator);
        doc
    }
}

impl PdfRenderer for GenpdfRenderer {
    fn render(
        &self,
        html: &str,
        page_size: PageSize,
        orientation: Orientation,
    ) -> Result<Vec<u8>, RenderError> {
        let mut doc = self.configure_document(page_size, orientation);
        let (page_width_mm, _) = page_dimensions(page_size, orientation);
        let content_width_in = (page_width_mm - 2.0 * MARGIN_MM) / 25.4;

        // Keep temporary image files alive until rendering finishes
        let mut temp_files: Vec<NamedTempFile> = Vec::new();

        for block in html::parse(html) {
            match block {
                Block::Heading { level, segments } => {
                    let mut p = Paragraph::new("");
                    let style = Style::new().bold().with_font_size(heading_size(level));
                    push_segments_into_paragraph(&mut p, &segments, style);
                    doc.push(p);
                    doc.push(Break::new(0.5));
                }
                Block::Paragraph(segments) => {
                    let mut p = Paragraph::new("");
                    push_segments_into_paragraph(&mut p, &segments, Style::new());
                    doc.push(p);
                }
                Block::ListItem(segments) => {
                    let mut p = Paragraph::new("");
                    p.push(StyledString::new("• ", Style::new()));
                    push_segments_into_paragraph(&mut p, &segments, Style::new());
                    let mut layout = LinearLayout::vertical();
                    layout.push(p);
                    doc.push(layout);
                }
                Block::Image { src } => match prepare_image(&src, content_width_in) {
                    Ok((tmp, path)) => {
                        let mut img_elem = PdfImage::from_path(path)?;
                        img_elem.set_dpi(IMAGE_DPI);
                        temp_files.push(tmp);
                        doc.push(img_elem);
                    }
                    Err(e) => {
                        warn!("Embedding image failed, using a marker instead: {}", e);
                        doc.push(Paragraph::new("[image unavailable]"));
                    }
                },
                Block::Break => doc.push(Break::new(1)),
            }
        }

        let mut out = Vec::new();
        doc.render(&mut out)?;
        Ok(out)
    }
}

fn page_dimensions(page_size: PageSize, orientation: Orientation) -> (f64, f64) {
    let (width, height) = page_size.dimensions_mm();
    match orientation {
        Orientation::Portrait => (width, height),
        Orientation::Landscape => (height, width),
    }
}

fn heading_size(level: u8) -> u8 {
    match level {
        1 => 18,
        2 => 14,
        3 => 12,
        _ => 11,
    }
}

/// Push segments into a Paragraph converting each `TextSegment` into a `StyledString`
/// layered on top of `base`.
fn push_segments_into_paragraph(p: &mut Paragraph, segments: &[TextSegment], base: Style) {
    for seg in segments {
        let style = match seg.style {
            TextStyle::Regular => base,
            TextStyle::Bold => base.bold(),
            TextStyle::Italic => base.italic(),
            TextStyle::BoldItalic => base.bold().italic(),
        };
        p.push(StyledString::new(seg.text.clone(), style));
    }
}

/// Decodes the bytes of a `data:<mime>;base64,<payload>` URI.
/// Remote URLs are not fetched.
fn decode_data_uri(src: &str) -> Result<Vec<u8>, RenderError> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Image(format!("unsupported image source {:.40}", src)))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Image("malformed data URI".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(RenderError::Image("data URI is not base64 encoded".to_string()));
    }
    BASE64
        .decode(payload.trim())
        .map_err(|e| RenderError::Image(e.to_string()))
}

/// Rescales the image to fit the printable width and the CSS size limit,
/// preserving aspect ratio, flattens alpha over white and writes it to a
/// temporary PNG that genpdf can load.
fn prepare_image(src: &str, content_width_in: f64) -> Result<(NamedTempFile, PathBuf), RenderError> {
    let bytes = decode_data_uri(src)?;
    let img = load_from_memory(&bytes).map_err(|e| RenderError::Image(e.to_string()))?;

    let content_target_px = content_width_in * IMAGE_DPI;
    // CSS px -> image pixels at IMAGE_DPI assuming 96 CSS px per inch
    let css_max_target_px = CSS_MAX_IMAGE_PX * IMAGE_DPI / 96.0;

    let (orig_w, orig_h) = img.dimensions();
    let orig_w_f = orig_w as f64;
    let orig_h_f = orig_h as f64;

    let scale = (content_target_px / orig_w_f)
        .min(css_max_target_px / orig_w_f)
        .min(css_max_target_px / orig_h_f)
        .min(1.0);

    let resized: DynamicImage = if scale >= 1.0 {
        img
    } else {
        let new_w = (orig_w_f * scale).max(1.0).round() as u32;
        let new_h = (orig_h_f * scale).max(1.0).round() as u32;
        img.resize(new_w, new_h, FilterType::Lanczos3)
    };

    let rgba = resized.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut background = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut background, &rgba, 0, 0);
    let raw = DynamicImage::ImageRgba8(background).to_rgb8().into_raw();

    // genpdf picks the decoder from the extension
    let mut tmp = tempfile::Builder::new().suffix(".png").tempfile()?;
    {
        let file = tmp.as_file_mut();
        let mut encoder = PngEncoder::new(file, w, h);
        encoder.set_color(PngColorType::Rgb);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Image(e.to_string()))?;
        writer
            .write_image_data(&raw)
            .map_err(|e| RenderError::Image(e.to_string()))?;
    }

    let path = tmp.path().to_path_buf();
    Ok((tmp, path))
}
