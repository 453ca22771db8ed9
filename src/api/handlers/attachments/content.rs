//! Placeholder materialization of attachment bytes.
//!
//! Nothing is read from disk or object storage: the bytes are derived from the
//! attachment record alone, so the same record always yields the same body.
//! The durable contract is the content-type and filename policy in
//! [`ContentKind`]; a real blob store must keep those rules when it replaces
//! the generators below.

use std::fmt::Write as _;

use crate::store::models::Attachment;

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Rendering family chosen from the declared mime type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
    Pdf,
    Image,
    Text,
}

impl ContentKind {
    /// Tested in order: `pdf` wins over `image`, everything else is text.
    #[must_use]
    pub fn classify(mime_type: &str) -> Self {
        let mime_type = mime_type.to_ascii_lowercase();
        if mime_type.contains("pdf") {
            Self::Pdf
        } else if mime_type.contains("image") {
            Self::Image
        } else {
            Self::Text
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterializedContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Produce the body, transport content type and download filename for an
/// attachment.
#[must_use]
pub fn materialize(attachment: &Attachment) -> MaterializedContent {
    match ContentKind::classify(&attachment.mime_type) {
        ContentKind::Pdf => MaterializedContent {
            bytes: placeholder_pdf(&attachment.original_name),
            content_type: attachment.mime_type.clone(),
            filename: attachment.original_name.clone(),
        },
        ContentKind::Image => MaterializedContent {
            bytes: placeholder_svg(&attachment.original_name, attachment.file_size).into_bytes(),
            content_type: SVG_CONTENT_TYPE.to_string(),
            filename: replace_extension(&attachment.original_name, "svg"),
        },
        ContentKind::Text => MaterializedContent {
            bytes: text_descriptor(attachment).into_bytes(),
            content_type: TEXT_CONTENT_TYPE.to_string(),
            filename: attachment.original_name.clone(),
        },
    }
}

/// `file_size` rounded to whole kilobytes, e.g. `2048` -> `"2 KB"`.
#[must_use]
pub fn human_kilobytes(file_size: i64) -> String {
    let kb = file_size.max(0).saturating_add(512) / 1024;
    format!("{kb} KB")
}

/// Swap the last extension for `extension`, appending one if there is none.
#[must_use]
pub fn replace_extension(filename: &str, extension: &str) -> String {
    let stem = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains(['/', '\\']) => stem,
        _ => filename,
    };
    format!("{stem}.{extension}")
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn placeholder_svg(original_name: &str, file_size: i64) -> String {
    let name = xml_escape(original_name);
    let size = human_kilobytes(file_size);
    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300" viewBox="0 0 400 300">
  <rect x="1" y="1" width="398" height="298" fill="#f3f4f6" stroke="#9ca3af" stroke-width="2"/>
  <text x="200" y="135" font-family="sans-serif" font-size="16" text-anchor="middle" fill="#374151">{name}</text>
  <text x="200" y="165" font-family="sans-serif" font-size="14" text-anchor="middle" fill="#6b7280">{size}</text>
</svg>
"##
    )
}

fn text_descriptor(attachment: &Attachment) -> String {
    format!(
        "Anexo: {}\nTipo declarado: {}\nTamanho: {} bytes\nEnviado em: {}\n",
        attachment.original_name,
        attachment.mime_type,
        attachment.file_size,
        attachment.uploaded_at
    )
}

/// PDF literal string body in `WinAnsiEncoding`; characters outside Latin-1
/// become `?`.
fn pdf_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", u32::from(c));
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Single-page PDF 1.4 showing the attachment name.
fn placeholder_pdf(original_name: &str) -> Vec<u8> {
    let stream = format!(
        "BT\n/F1 18 Tf\n72 720 Td\n(Documento anexo) Tj\n/F1 12 Tf\n0 -28 Td\n({}) Tj\nET",
        pdf_literal(original_name)
    );
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_string(),
        format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        let _ = write!(pdf, "{} 0 obj\n{body}\nendobj\n", index + 1);
    }

    let xref_offset = pdf.len();
    let _ = write!(pdf, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(pdf, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        pdf,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    );

    pdf.into_bytes()
}
