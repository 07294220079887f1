//! Magic-Byte Image Sniffing
//!
//! Determines the true type of an uploaded image from its leading bytes,
//! independent of the claimed filename extension.

/// Number of leading bytes read from a staged upload for sniffing.
///
/// 12 bytes covers every supported signature (PNG's 8-byte magic is the
/// longest) with room for container formats like RIFF/WebP that need the
/// subtype field at offset 8 to be distinguishable.
pub const SNIFF_LEN: usize = 12;

/// Image type derived from file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
}

impl ImageKind {
    /// The file extension stored files are named with.
    #[must_use]
    pub const fn ext(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
        }
    }
}

/// Sniff the image type from the first bytes of a file.
///
/// Returns `None` when the header matches no supported image signature.
/// Types outside the avatar set (webp, bmp, ...) are rejected even when
/// `infer` recognizes them.
#[must_use]
pub fn sniff_image(header: &[u8]) -> Option<ImageKind> {
    let kind = infer::get(header)?;

    match kind.mime_type() {
        "image/png" => Some(ImageKind::Png),
        "image/jpeg" => Some(ImageKind::Jpeg),
        "image/gif" => Some(ImageKind::Gif),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_png() {
        let header = [
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
        ];
        assert_eq!(sniff_image(&header), Some(ImageKind::Png));
    }

    #[test]
    fn test_sniff_jpeg() {
        let header = [
            0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
        ];
        assert_eq!(sniff_image(&header), Some(ImageKind::Jpeg));
    }

    #[test]
    fn test_sniff_gif() {
        assert_eq!(sniff_image(b"GIF89a\x01\x00\x01\x00\x00\x00"), Some(ImageKind::Gif));
        assert_eq!(sniff_image(b"GIF87a\x01\x00\x01\x00\x00\x00"), Some(ImageKind::Gif));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(sniff_image(b"this is not an image"), None);
        assert_eq!(sniff_image(&[0u8; 12]), None);
        assert_eq!(sniff_image(&[]), None);
    }

    #[test]
    fn test_recognized_but_unsupported_rejected() {
        // WebP sniffs fine but is not in the avatar set
        assert_eq!(sniff_image(b"RIFF\x24\x00\x00\x00WEBP"), None);
    }

    #[test]
    fn test_extension_names_match_sniffed_type() {
        assert_eq!(ImageKind::Png.ext(), "png");
        assert_eq!(ImageKind::Jpeg.ext(), "jpg");
        assert_eq!(ImageKind::Gif.ext(), "gif");
    }
}
