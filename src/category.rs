//! File-type classification: map a file extension to a conversion category.
//!
//! The extension sets are disjoint, so every file maps to at most one
//! [`Category`]. Lookup is case-insensitive and only the text after the last
//! `.` counts: `report.final.DOCX` is a Word document, `README` is nothing.

use crate::error::Doc2PdfError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A family of input formats that share one conversion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Word,
    Powerpoint,
    Excel,
    Text,
    Image,
    Markdown,
    Pdf,
}

impl Category {
    /// Every category, in the order the upload form lists them.
    pub const ALL: [Category; 7] = [
        Category::Word,
        Category::Powerpoint,
        Category::Excel,
        Category::Text,
        Category::Image,
        Category::Markdown,
        Category::Pdf,
    ];

    /// Lowercase extensions (without the dot) belonging to this category.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Category::Word => &["doc", "docx"],
            Category::Powerpoint => &["ppt", "pptx"],
            Category::Excel => &["xls", "xlsx"],
            Category::Text => &["txt"],
            Category::Image => &["jpg", "jpeg", "png"],
            Category::Markdown => &["md"],
            Category::Pdf => &["pdf"],
        }
    }

    /// Extension of the file a conversion of this category produces.
    ///
    /// Everything becomes a PDF except PDFs, which become editable DOCX.
    pub fn output_extension(self) -> &'static str {
        match self {
            Category::Pdf => "docx",
            _ => "pdf",
        }
    }

    /// The form/JSON label of this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Word => "word",
            Category::Powerpoint => "powerpoint",
            Category::Excel => "excel",
            Category::Text => "text",
            Category::Image => "image",
            Category::Markdown => "markdown",
            Category::Pdf => "pdf",
        }
    }

    /// Human-readable label for the upload form.
    pub fn label(self) -> &'static str {
        match self {
            Category::Word => "Word → PDF",
            Category::Powerpoint => "PowerPoint → PDF",
            Category::Excel => "Excel → PDF",
            Category::Text => "Text → PDF",
            Category::Image => "Image → PDF",
            Category::Markdown => "Markdown → PDF",
            Category::Pdf => "PDF → Word",
        }
    }

    /// Case-insensitive lookup of a bare extension (no leading dot).
    pub fn from_extension(ext: &str) -> Option<Category> {
        let ext = ext.to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.extensions().contains(&ext.as_str()))
    }

    /// Whether `ext` belongs to this category.
    pub fn accepts(self, ext: &str) -> bool {
        Category::from_extension(ext) == Some(self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Doc2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| Doc2PdfError::UnknownCategory {
                value: s.to_string(),
            })
    }
}

/// The extension of `filename`, i.e. the text after its last dot.
pub fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

/// Classify a file name by extension.
pub fn classify(filename: &str) -> Option<Category> {
    extension_of(filename).and_then(Category::from_extension)
}

/// Whether `filename` may be converted.
///
/// With a selected `category` the extension must belong to that category;
/// without one it must belong to any category.
pub fn is_allowed(filename: &str, category: Option<Category>) -> bool {
    let Some(ext) = extension_of(filename) else {
        return false;
    };
    match category {
        Some(c) => c.accepts(ext),
        None => Category::from_extension(ext).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_every_extension() {
        let table = [
            ("a.doc", Category::Word),
            ("a.docx", Category::Word),
            ("a.ppt", Category::Powerpoint),
            ("a.pptx", Category::Powerpoint),
            ("a.xls", Category::Excel),
            ("a.xlsx", Category::Excel),
            ("a.txt", Category::Text),
            ("a.jpg", Category::Image),
            ("a.jpeg", Category::Image),
            ("a.png", Category::Image),
            ("a.md", Category::Markdown),
            ("a.pdf", Category::Pdf),
        ];
        for (name, expected) in table {
            assert_eq!(classify(name), Some(expected), "{name}");
        }
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify("SLIDES.PPTX"), Some(Category::Powerpoint));
        assert_eq!(classify("Photo.JpEg"), Some(Category::Image));
    }

    #[test]
    fn only_last_extension_counts() {
        assert_eq!(classify("report.pdf.docx"), Some(Category::Word));
        assert_eq!(classify("archive.docx.zip"), None);
    }

    #[test]
    fn unknown_or_missing_extension_is_unclassified() {
        assert_eq!(classify("notes.odt"), None);
        assert_eq!(classify("README"), None);
        assert_eq!(classify("md"), None);
        assert_eq!(classify("trailing."), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn extension_sets_are_disjoint() {
        for a in Category::ALL {
            for b in Category::ALL {
                if a == b {
                    continue;
                }
                for ext in a.extensions() {
                    assert!(!b.extensions().contains(ext), "{ext} in {a} and {b}");
                }
            }
        }
    }

    #[test]
    fn allowed_respects_selected_category() {
        assert!(is_allowed("cv.docx", None));
        assert!(is_allowed("cv.docx", Some(Category::Word)));
        assert!(!is_allowed("cv.docx", Some(Category::Pdf)));
        assert!(!is_allowed("tool.exe", None));
        assert!(!is_allowed("noext", Some(Category::Text)));
    }

    #[test]
    fn output_extensions() {
        assert_eq!(Category::Pdf.output_extension(), "docx");
        for c in Category::ALL.into_iter().filter(|c| *c != Category::Pdf) {
            assert_eq!(c.output_extension(), "pdf");
        }
    }

    #[test]
    fn parses_labels() {
        assert_eq!("word".parse::<Category>().unwrap(), Category::Word);
        assert_eq!(" Markdown ".parse::<Category>().unwrap(), Category::Markdown);
        let err = "video".parse::<Category>().unwrap_err();
        assert!(matches!(err, Doc2PdfError::UnknownCategory { .. }));
        for c in Category::ALL {
            assert_eq!(c.to_string().parse::<Category>().unwrap(), c);
        }
    }
}
