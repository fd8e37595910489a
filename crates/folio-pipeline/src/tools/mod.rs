// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The built-in tool catalog.

pub mod convert;
pub mod options;
pub mod pages;
pub mod placeholder;
pub mod recognize;
pub mod secure;
pub mod stamp;

use folio_core::error::{FolioError, Result};
use folio_core::{OutputArtifact, StagedFile, media};

use crate::tool::{ProcessOutcome, ToolDescriptor};

const PDF: &str = media::PDF;
const WORD: &str = ".docx,application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const POWERPOINT: &str = ".pptx,application/vnd.openxmlformats-officedocument.presentationml.presentation";
const EXCEL: &str = ".xlsx,application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The first staged file; tools that take one document use only this.
pub(crate) fn first(files: &[StagedFile]) -> Result<&StagedFile> {
    files.first().ok_or(FolioError::NoFilesStaged)
}

pub(crate) fn single_pdf(bytes: Vec<u8>, filename: &str) -> ProcessOutcome {
    ProcessOutcome::Artifacts(vec![OutputArtifact::pdf(bytes, filename)])
}

/// Every built-in tool, in catalog order.
pub fn catalog() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            id: "merge-pdf",
            title: "Merge PDF",
            description: "Combine multiple PDFs into one single document.",
            accept: PDF,
            multiple_files: true,
            is_new: false,
            options: None,
            on_select: None,
            process: pages::merge,
        },
        ToolDescriptor {
            id: "split-pdf",
            title: "Split PDF",
            description: "Extract pages from a PDF or save each page as a separate PDF.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: Some(&options::PAGE_RANGE),
            on_select: None,
            process: pages::split,
        },
        ToolDescriptor {
            id: "compress-pdf",
            title: "Compress PDF",
            description: "Reduce the file size of your PDF while optimizing for quality.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: pages::compress,
        },
        ToolDescriptor {
            id: "pdf-to-word",
            title: "PDF to Word",
            description: "Convert your PDF to an editable DOCX file.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: convert::pdf_to_text,
        },
        ToolDescriptor {
            id: "pdf-to-powerpoint",
            title: "PDF to PowerPoint",
            description: "Convert each page of your PDF to a PPTX slide.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: convert::pdf_to_slides,
        },
        ToolDescriptor {
            id: "pdf-to-excel",
            title: "PDF to Excel",
            description: "Convert PDF tables to editable Excel spreadsheets.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: placeholder::not_implemented,
        },
        ToolDescriptor {
            id: "pdf-to-jpg",
            title: "PDF to JPG",
            description: "Convert each PDF page into a high-quality JPG image.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: convert::pdf_to_jpg,
        },
        ToolDescriptor {
            id: "word-to-pdf",
            title: "Word to PDF",
            description: "Convert DOCX files to professional-looking PDFs.",
            accept: WORD,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: convert::word_to_pdf,
        },
        ToolDescriptor {
            id: "powerpoint-to-pdf",
            title: "PowerPoint to PDF",
            description: "Convert PPTX presentation slides to PDF pages.",
            accept: POWERPOINT,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: placeholder::not_implemented,
        },
        ToolDescriptor {
            id: "excel-to-pdf",
            title: "Excel to PDF",
            description: "Convert Excel spreadsheets into PDF documents.",
            accept: EXCEL,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: convert::excel_to_pdf,
        },
        ToolDescriptor {
            id: "jpg-to-pdf",
            title: "JPG to PDF",
            description: "Convert JPG images to a single PDF file.",
            accept: "image/jpeg,image/png",
            multiple_files: true,
            is_new: false,
            options: None,
            on_select: None,
            process: convert::images_to_pdf,
        },
        ToolDescriptor {
            id: "edit-pdf",
            title: "Edit PDF",
            description: "Add text, shapes, or drawings to your PDF document.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: pages::edit,
        },
        ToolDescriptor {
            id: "sign-pdf",
            title: "Sign PDF",
            description: "Create your signature and sign your PDF documents.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: Some(&options::SIGNATURE),
            on_select: None,
            process: stamp::sign,
        },
        ToolDescriptor {
            id: "watermark-pdf",
            title: "Watermark PDF",
            description: "Add a text or image watermark to your PDF.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: Some(&options::WATERMARK),
            on_select: None,
            process: stamp::watermark,
        },
        ToolDescriptor {
            id: "rotate-pdf",
            title: "Rotate PDF",
            description: "Rotate all or specific pages of your PDF file.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: Some(&options::ROTATION),
            on_select: None,
            process: pages::rotate,
        },
        ToolDescriptor {
            id: "html-to-pdf",
            title: "HTML to PDF",
            description: "Convert webpages to PDF. (Not implemented)",
            accept: ".html",
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: placeholder::not_implemented,
        },
        ToolDescriptor {
            id: "unlock-pdf",
            title: "Unlock PDF",
            description: "Remove passwords and restrictions from PDFs.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: Some(&options::PASSWORD),
            on_select: None,
            process: secure::unlock,
        },
        ToolDescriptor {
            id: "protect-pdf",
            title: "Protect PDF",
            description: "Add a password and encrypt your PDF file.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: Some(&options::PASSWORD),
            on_select: None,
            process: secure::protect,
        },
        ToolDescriptor {
            id: "organize-pdf",
            title: "Organize PDF",
            description: "Reorder, delete, or add pages to your PDF.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: pages::organize,
        },
        ToolDescriptor {
            id: "pdf-to-pdfa",
            title: "PDF to PDF/A",
            description: "Convert your PDF to PDF/A for long-term archiving.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: placeholder::not_implemented,
        },
        ToolDescriptor {
            id: "ocr-pdf",
            title: "OCR PDF",
            description: "Recognize text in your PDF to make it searchable.",
            accept: PDF,
            multiple_files: false,
            is_new: true,
            options: Some(&options::RECOGNITION),
            on_select: None,
            process: recognize::searchable_pdf,
        },
        ToolDescriptor {
            id: "add-page-numbers",
            title: "Add Page Numbers",
            description: "Insert page numbers into your PDF document.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: Some(&options::PAGE_NUMBERS),
            on_select: None,
            process: pages::number,
        },
        ToolDescriptor {
            id: "repair-pdf",
            title: "Repair PDF",
            description: "Attempt to recover data from a corrupt PDF.",
            accept: PDF,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: pages::repair,
        },
        ToolDescriptor {
            id: "png-to-pdf",
            title: "PNG to PDF",
            description: "Convert PNG images to PDF files.",
            accept: media::PNG,
            multiple_files: true,
            is_new: false,
            options: None,
            on_select: None,
            process: convert::images_to_pdf,
        },
        ToolDescriptor {
            id: "tiff-to-pdf",
            title: "TIFF to PDF",
            description: "Convert TIFF images to PDF.",
            accept: media::TIFF,
            multiple_files: true,
            is_new: false,
            options: None,
            on_select: None,
            process: convert::tiff_to_pdf,
        },
        ToolDescriptor {
            id: "powerpoint-to-pdf-2",
            title: "PPT to PDF",
            description: "Convert PPT files to PDF. (Not implemented)",
            accept: ".ppt",
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: placeholder::not_implemented,
        },
        ToolDescriptor {
            id: "excel-to-pdf-2",
            title: "XLS to PDF",
            description: "Convert XLS files to PDF. (Not implemented)",
            accept: ".xls",
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: placeholder::not_implemented,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_and_flags() {
        let tools = catalog();
        assert_eq!(tools.len(), 27);
        let ids: Vec<&str> = tools.iter().map(|tool| tool.id).collect();
        assert_eq!(&ids[..4], &["merge-pdf", "split-pdf", "compress-pdf", "pdf-to-word"]);

        let multi: Vec<&str> = tools.iter().filter(|t| t.multiple_files).map(|t| t.id).collect();
        assert_eq!(multi, vec!["merge-pdf", "jpg-to-pdf", "png-to-pdf", "tiff-to-pdf"]);

        let new: Vec<&str> = tools.iter().filter(|t| t.is_new).map(|t| t.id).collect();
        assert_eq!(new, vec!["ocr-pdf"]);
    }
}
