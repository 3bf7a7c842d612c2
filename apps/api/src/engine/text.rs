//! Text Extractor: visible text of PDF pages or DOCX paragraphs, in document order.
//!
//! Text-layer only: scanned PDFs without a text layer come back empty or partial.

use std::path::Path;

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild,
};

use super::EngineError;

/// The two document kinds the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves a format from a file extension (with or without the dot, any case).
    pub fn from_extension(ext: &str) -> Result<Self, EngineError> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            other => Err(EngineError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, EngineError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::from_extension(ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }

    /// Checks the leading magic bytes: `%PDF-` for PDF, a zip local header for DOCX.
    pub fn matches_magic(self, bytes: &[u8]) -> bool {
        match self {
            Self::Pdf => bytes.starts_with(b"%PDF-"),
            Self::Docx => bytes.starts_with(b"PK\x03\x04"),
        }
    }
}

/// Reads a file and extracts its text. The format is taken from the extension.
pub fn extract_text(path: &Path) -> Result<String, EngineError> {
    let format = DocumentFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    extract_text_from_bytes(&bytes, format)
}

pub fn extract_text_from_bytes(bytes: &[u8], format: DocumentFormat) -> Result<String, EngineError> {
    match format {
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| EngineError::Extraction(format!("PDF: {e}"))),
        DocumentFormat::Docx => extract_docx(bytes),
    }
}

fn extract_docx(bytes: &[u8]) -> Result<String, EngineError> {
    let docx =
        docx_rs::read_docx(bytes).map_err(|e| EngineError::Extraction(format!("DOCX: {e}")))?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => paragraphs.push(paragraph_text(p)),
            DocumentChild::Table(table) => {
                // cell paragraphs, row by row
                for row in &table.rows {
                    let TableChild::TableRow(row) = row;
                    for cell in &row.cells {
                        let TableRowChild::TableCell(cell) = cell;
                        for content in &cell.children {
                            if let TableCellContent::Paragraph(p) = content {
                                paragraphs.push(paragraph_text(p));
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Ok(paragraphs.join("\n"))
}

/// Run text of one paragraph, honouring tabs and breaks.
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}
