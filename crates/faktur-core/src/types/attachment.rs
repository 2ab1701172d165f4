//! Inbound attachment types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Declared media type of an inbound attachment.
///
/// Parsed from the MIME type reported by the messaging channel. Anything
/// outside this set is rejected before any decoding is attempted.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// JPEG image.
    Jpeg,
    /// PNG image.
    Png,
    /// TIFF image.
    Tiff,
    /// BMP image.
    Bmp,
    /// WebP image.
    Webp,
    /// GIF image.
    Gif,
    /// PDF document, one raster page per embedded page.
    Pdf,
}

impl MediaType {
    /// Parses a declared MIME type into a supported media type.
    ///
    /// Returns `None` for anything the pipeline does not accept; the caller
    /// decides whether that is an unsupported-format failure.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/tiff" => Some(Self::Tiff),
            "image/bmp" => Some(Self::Bmp),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Returns the canonical MIME type string.
    pub fn as_mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Pdf => "application/pdf",
        }
    }

    /// Returns whether this is a single-page image format.
    #[inline]
    pub fn is_image(self) -> bool {
        !matches!(self, Self::Pdf)
    }

    /// Returns whether this is a PDF document.
    #[inline]
    pub fn is_pdf(self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// Error raised when constructing an [`Attachment`] from channel input.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    /// The sender identifier was empty or whitespace.
    #[error("sender identifier must not be empty")]
    EmptySender,

    /// The attachment carried no payload bytes.
    #[error("attachment payload must not be empty")]
    EmptyPayload,
}

/// One raw attachment as delivered by the messaging channel.
///
/// Ephemeral: exists only for the duration of a single pipeline run. The
/// sender identifier is validated at construction so that a row can always
/// be created for audit, independent of whether OCR later succeeds. The
/// media type is kept as declared by the channel; resolving it against the
/// supported set is the document loader's job.
#[derive(Debug, Clone)]
pub struct Attachment {
    bytes: Bytes,
    media_type: String,
    sender: String,
}

impl Attachment {
    /// Creates an attachment from raw channel input.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::EmptySender`] when the sender handle is
    /// blank and [`AttachmentError::EmptyPayload`] when no bytes were
    /// delivered.
    pub fn new(
        bytes: impl Into<Bytes>,
        media_type: impl Into<String>,
        sender: impl Into<String>,
    ) -> Result<Self, AttachmentError> {
        let sender = sender.into();
        if sender.trim().is_empty() {
            return Err(AttachmentError::EmptySender);
        }

        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AttachmentError::EmptyPayload);
        }

        Ok(Self {
            bytes,
            media_type: media_type.into(),
            sender,
        })
    }

    /// Raw payload bytes.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Media type exactly as declared by the channel.
    #[inline]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Declared media type resolved against the supported set.
    #[inline]
    pub fn resolved_media_type(&self) -> Option<MediaType> {
        MediaType::from_mime(&self.media_type)
    }

    /// WhatsApp handle of the sender. Never empty.
    #[inline]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Payload size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_mime() {
        assert_eq!(MediaType::from_mime("image/jpeg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime("image/jpg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime("IMAGE/PNG"), Some(MediaType::Png));
        assert_eq!(
            MediaType::from_mime("application/pdf"),
            Some(MediaType::Pdf)
        );
        assert_eq!(MediaType::from_mime("text/plain"), None);
        assert_eq!(MediaType::from_mime("application/zip"), None);
    }

    #[test]
    fn test_attachment_requires_sender() {
        let err = Attachment::new(vec![1u8, 2, 3], "image/png", "  ").unwrap_err();
        assert!(matches!(err, AttachmentError::EmptySender));

        let err = Attachment::new(Vec::<u8>::new(), "image/png", "whatsapp:+4917012345678")
            .unwrap_err();
        assert!(matches!(err, AttachmentError::EmptyPayload));

        let attachment =
            Attachment::new(vec![1u8, 2, 3], "image/png", "whatsapp:+4917012345678").unwrap();
        assert_eq!(attachment.sender(), "whatsapp:+4917012345678");
        assert_eq!(attachment.size(), 3);
        assert_eq!(attachment.resolved_media_type(), Some(MediaType::Png));
    }

    #[test]
    fn test_unknown_declared_type_does_not_resolve() {
        let attachment =
            Attachment::new(vec![1u8], "application/zip", "whatsapp:+10000000000").unwrap();
        assert_eq!(attachment.resolved_media_type(), None);
    }
}
