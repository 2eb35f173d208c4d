//! Asset mime type groups accepted by `mimetype_group`

/// Coarse mime type categories the delivery API can filter assets by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeTypeRestriction {
    Attachment,
    Plaintext,
    Image,
    Audio,
    Video,
    Richtext,
    Presentation,
    Spreadsheet,
    PdfDocument,
    Archive,
    Code,
    Markup,
}

impl MimeTypeRestriction {
    pub const ALL: [MimeTypeRestriction; 12] = [
        Self::Attachment,
        Self::Plaintext,
        Self::Image,
        Self::Audio,
        Self::Video,
        Self::Richtext,
        Self::Presentation,
        Self::Spreadsheet,
        Self::PdfDocument,
        Self::Archive,
        Self::Code,
        Self::Markup,
    ];

    /// Parse from the wire name (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.iter().copied().find(|r| r.as_str() == s)
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attachment => "attachment",
            Self::Plaintext => "plaintext",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Richtext => "richtext",
            Self::Presentation => "presentation",
            Self::Spreadsheet => "spreadsheet",
            Self::PdfDocument => "pdfdocument",
            Self::Archive => "archive",
            Self::Code => "code",
            Self::Markup => "markup",
        }
    }
}
