// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout with `printpdf` 0.8: flows paragraphs of text onto Letter pages.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use folio_core::error::Result;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, info, instrument};

use crate::traits::PageLayout;

/// Text layout onto fixed-size pages using the built-in Helvetica font.
#[derive(Debug, Clone)]
pub struct PrintpdfLayout {
    page_width: Mm,
    page_height: Mm,
    font_size_pt: f32,
    line_height_pt: f32,
    margin_mm: f32,
}

impl Default for PrintpdfLayout {
    /// US Letter, 11 pt text, 20 mm margins.
    fn default() -> Self {
        Self {
            page_width: Mm(215.9),
            page_height: Mm(279.4),
            font_size_pt: 11.0,
            line_height_pt: 14.0,
            margin_mm: 20.0,
        }
    }
}

impl PrintpdfLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Characters that fit on one line, estimated from the average Helvetica
    /// glyph width (about half the font size; 1 pt = 0.3528 mm).
    fn chars_per_line(&self) -> usize {
        let usable_width_mm = self.page_width.0 - 2.0 * self.margin_mm;
        let avg_char_width_mm = 0.50 * self.font_size_pt * 0.3528;
        ((usable_width_mm / avg_char_width_mm) as usize).max(1)
    }

    fn lines_per_page(&self) -> usize {
        let margin_pt = Mm(self.margin_mm).into_pt().0;
        let usable_height_pt = self.page_height.into_pt().0 - 2.0 * margin_pt;
        ((usable_height_pt / self.line_height_pt) as usize).max(1)
    }
}

impl PageLayout for PrintpdfLayout {
    #[instrument(skip(self, paragraphs), fields(paragraphs = paragraphs.len()))]
    fn text_document(&self, title: &str, paragraphs: &[String]) -> Result<Vec<u8>> {
        let lines: Vec<String> = paragraphs
            .iter()
            .flat_map(|paragraph| wrap_text(paragraph, self.chars_per_line()))
            .collect();
        let lines_per_page = self.lines_per_page();
        let margin_pt = Mm(self.margin_mm).into_pt().0;
        let page_h_pt = self.page_height.into_pt().0;

        info!(lines = lines.len(), "Laying out text document");

        let mut pages: Vec<PdfPage> = lines
            .chunks(lines_per_page)
            .map(|chunk| {
                let mut ops = Vec::with_capacity(chunk.len() * 5);
                for (line_idx, line) in chunk.iter().enumerate() {
                    let y_pt = page_h_pt - margin_pt - (line_idx as f32 * self.line_height_pt);
                    ops.push(Op::StartTextSection);
                    ops.push(Op::SetTextCursor {
                        pos: Point {
                            x: Pt(margin_pt),
                            y: Pt(y_pt),
                        },
                    });
                    ops.push(Op::SetFontSizeBuiltinFont {
                        size: Pt(self.font_size_pt),
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::WriteTextBuiltinFont {
                        items: vec![TextItem::Text(line.clone())],
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::EndTextSection);
                }
                PdfPage::new(self.page_width, self.page_height, ops)
            })
            .collect();

        // An empty document still gets one blank page.
        if pages.is_empty() {
            pages.push(PdfPage::new(self.page_width, self.page_height, Vec::new()));
        }

        let mut doc = PdfDocument::new(title);
        doc.with_pages(pages);
        debug!(pages = doc.pages.len(), "Text layout complete");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }
}

// -- Text wrapping helper -----------------------------------------------------

/// Word-wrap one paragraph (which may itself contain newlines) so that no line
/// exceeds `max_width` characters. Words longer than a line are broken on
/// character boundaries. Blank paragraphs keep an empty line.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0;
        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut pieces = chars.chunks(max_width).peekable();
                while let Some(piece) = pieces.next() {
                    if pieces.peek().is_some() {
                        result.push(piece.iter().collect());
                    } else {
                        current = piece.iter().collect();
                        current_len = piece.len();
                    }
                }
            } else if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::replace(&mut current, word.to_string()));
                current_len = word_len;
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }

    result
}
