//! Certificate document rendering.
//!
//! [`PdfRenderer`] lays out a single A4 page using the PDF base-14 Helvetica
//! family, so the output embeds no font files. Text is encoded as
//! `WinAnsiEncoding`; characters outside it print as `?`.

use chrono::DateTime;
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str, TextStr};
use thiserror::Error;

use super::format_hours;

/// Everything printed on a certificate.
#[derive(Debug, Clone)]
pub struct CertificateDocument<'a> {
    pub identifier: &'a str,
    pub student_name: &'a str,
    pub subject: &'a str,
    pub total_hours: f64,
    pub issued_at: i64,
    pub verify_url: &'a str,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("issue timestamp {0} is out of range")]
    Timestamp(i64),
}

/// Produces the stored artifact for a certificate.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, doc: &CertificateDocument<'_>) -> Result<Vec<u8>, RenderError>;
}

const CM: f32 = 28.346_457;
const PAGE_WIDTH: f32 = 595.276;
const PAGE_HEIGHT: f32 = 841.89;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");
const OBLIQUE: Name<'static> = Name(b"F3");

/// Renders certificates as one-page PDFs.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    brand_name: String,
}

impl PdfRenderer {
    pub fn new(brand_name: impl Into<String>) -> Self {
        Self {
            brand_name: brand_name.into(),
        }
    }

    fn page_content(&self, doc: &CertificateDocument<'_>, issued_on: &str) -> Content {
        let mut content = Content::new();

        content.set_stroke_rgb(0.1, 0.1, 0.4);
        content.set_line_width(5.0);
        content.rect(CM, CM, PAGE_WIDTH - 2.0 * CM, PAGE_HEIGHT - 2.0 * CM);
        content.stroke();

        content.set_fill_rgb(0.2, 0.2, 0.6);
        centered(&mut content, BOLD, 40.0, PAGE_HEIGHT - 3.0 * CM, &self.brand_name);

        content.set_fill_rgb(0.0, 0.0, 0.0);
        centered(&mut content, BOLD, 30.0, PAGE_HEIGHT - 5.0 * CM, "CERTIFICATE OF STUDY");
        centered(
            &mut content,
            REGULAR,
            18.0,
            PAGE_HEIGHT - 9.0 * CM,
            "This certifies that the student",
        );
        centered(
            &mut content,
            BOLD,
            24.0,
            PAGE_HEIGHT - 10.5 * CM,
            &doc.student_name.to_uppercase(),
        );
        centered(
            &mut content,
            REGULAR,
            16.0,
            PAGE_HEIGHT - 12.0 * CM,
            &format!(
                "has successfully completed {} hours of study",
                format_hours(doc.total_hours)
            ),
        );
        centered(
            &mut content,
            REGULAR,
            16.0,
            PAGE_HEIGHT - 13.0 * CM,
            &format!("with focus on: {}", doc.subject),
        );
        centered(
            &mut content,
            REGULAR,
            14.0,
            PAGE_HEIGHT - 14.5 * CM,
            &format!("Issued on {issued_on}"),
        );

        centered(
            &mut content,
            OBLIQUE,
            10.0,
            4.0 * CM,
            &format!("Verification code: {}", doc.identifier),
        );
        centered(
            &mut content,
            OBLIQUE,
            10.0,
            3.5 * CM,
            &format!("Verify at: {}", doc.verify_url),
        );

        content
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, doc: &CertificateDocument<'_>) -> Result<Vec<u8>, RenderError> {
        let issued_on = DateTime::from_timestamp(doc.issued_at, 0)
            .ok_or(RenderError::Timestamp(doc.issued_at))?
            .format("%Y-%m-%d")
            .to_string();

        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let page_id = Ref::new(3);
        let content_id = Ref::new(4);
        let font_ids = [
            (REGULAR, Ref::new(5), "Helvetica"),
            (BOLD, Ref::new(6), "Helvetica-Bold"),
            (OBLIQUE, Ref::new(7), "Helvetica-Oblique"),
        ];
        let info_id = Ref::new(8);

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id).kids([page_id]).count(1);

        {
            let mut page = pdf.page(page_id);
            page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
            page.parent(page_tree_id);
            page.contents(content_id);
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            for (name, id, _) in font_ids {
                fonts.pair(name, id);
            }
        }

        for (_, id, base_font) in font_ids {
            pdf.type1_font(id)
                .base_font(Name(base_font.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        let title = format!("Certificate {}", doc.identifier);
        pdf.document_info(info_id)
            .title(TextStr(&title))
            .author(TextStr(&self.brand_name));

        let content = self.page_content(doc, &issued_on);
        pdf.stream(content_id, &content.finish());

        Ok(pdf.finish())
    }
}

/// Draw one line of text centred horizontally at baseline `y`.
fn centered(content: &mut Content, font: Name<'_>, size: f32, y: f32, text: &str) {
    let encoded = win_ansi(text);
    let x = ((PAGE_WIDTH - approx_width(font, size, encoded.len())) / 2.0).max(CM + 6.0);
    content.begin_text();
    content.set_font(font, size);
    content.next_line(x, y);
    content.show(Str(&encoded));
    content.end_text();
}

/// Average advance widths of the Helvetica faces, in text space units per
/// point of font size. Close enough to centre lines without font metrics.
#[allow(clippy::cast_precision_loss)]
fn approx_width(font: Name<'_>, size: f32, chars: usize) -> f32 {
    let per_char = if font == BOLD { 0.58 } else { 0.52 };
    per_char * size * chars as f32
}

/// Encode text for a `WinAnsiEncoding` font.
///
/// ASCII and Latin-1 supplement code points map to the same byte; everything
/// else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(b @ (0x20..=0x7E | 0xA0..=0xFF)) => b,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> CertificateDocument<'static> {
        CertificateDocument {
            identifier: "0b6b7c86-3f6e-4c3b-9d0e-2f1a5c7d9e11",
            student_name: "Ana Souza",
            subject: "Civil Law",
            total_hours: 10.0,
            issued_at: 1_700_000_000,
            verify_url: "https://target.saas/verify/0b6b7c86-3f6e-4c3b-9d0e-2f1a5c7d9e11",
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn renders_a_pdf_with_all_fields() {
        let bytes = PdfRenderer::new("TARGET SaaS").render(&sample()).unwrap();

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"ANA SOUZA"));
        assert!(contains(&bytes, b"completed 10 hours of study"));
        assert!(contains(&bytes, b"with focus on: Civil Law"));
        assert!(contains(&bytes, b"Issued on 2023-11-14"));
        assert!(contains(&bytes, b"0b6b7c86-3f6e-4c3b-9d0e-2f1a5c7d9e11"));
        assert!(contains(&bytes, b"TARGET SaaS"));
        assert!(contains(&bytes, b"/Helvetica-Bold"));
    }

    #[test]
    fn out_of_range_timestamp_is_rejected() {
        let mut doc = sample();
        doc.issued_at = i64::MAX;
        assert!(matches!(
            PdfRenderer::new("x").render(&doc),
            Err(RenderError::Timestamp(_))
        ));
    }

    #[test]
    fn latin1_survives_and_other_scripts_degrade() {
        assert_eq!(win_ansi("Joao"), b"Joao");
        assert_eq!(win_ansi("Jo\u{e3}o"), vec![b'J', b'o', 0xE3, b'o']);
        assert_eq!(win_ansi("\u{4e2d}x"), b"?x");
        assert_eq!(win_ansi("tab\there"), b"tab?here");
    }
}
