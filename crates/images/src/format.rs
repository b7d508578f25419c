use std::fmt;
use std::path::Path;

/// Content type served for a stored image, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
    Webp,
    Svg,
    Bmp,
    Avif,
    Icon,
    Tiff,
    Unknown,
}

impl MediaType {
    /// Detect the media type from a file extension (case-insensitive).
    ///
    /// Anything unrecognised, including a missing extension, is served as
    /// [`Unknown`](Self::Unknown).
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext.to_lowercase().as_str() {
                "jpg" | "jpeg" | "jpe" | "jfif" => MediaType::Jpeg,
                "png" => MediaType::Png,
                "gif" => MediaType::Gif,
                "webp" => MediaType::Webp,
                "svg" => MediaType::Svg,
                "bmp" => MediaType::Bmp,
                "avif" => MediaType::Avif,
                "ico" => MediaType::Icon,
                "tif" | "tiff" => MediaType::Tiff,
                _ => MediaType::Unknown,
            })
            .unwrap_or(MediaType::Unknown)
    }

    /// The MIME type string, suitable for a `Content-Type` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
            MediaType::Svg => "image/svg+xml",
            MediaType::Bmp => "image/bmp",
            MediaType::Avif => "image/avif",
            MediaType::Icon => "image/x-icon",
            MediaType::Tiff => "image/tiff",
            MediaType::Unknown => "application/octet-stream",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1_1718000000000.jpg", MediaType::Jpeg)]
    #[case("1_1718000000000.JPEG", MediaType::Jpeg)]
    #[case("1_1718000000000.png", MediaType::Png)]
    #[case("1_1718000000000.gif", MediaType::Gif)]
    #[case("1_1718000000000.webp", MediaType::Webp)]
    #[case("1_1718000000000.svg", MediaType::Svg)]
    #[case("1_1718000000000.bmp", MediaType::Bmp)]
    #[case("1_1718000000000.avif", MediaType::Avif)]
    #[case("1_1718000000000.ico", MediaType::Icon)]
    #[case("1_1718000000000.tif", MediaType::Tiff)]
    #[case("1_1718000000000.pdf", MediaType::Unknown)]
    #[case("1_1718000000000", MediaType::Unknown)]
    // A dotfile has no extension.
    #[case(".png", MediaType::Unknown)]
    fn test_from_path(#[case] name: &str, #[case] expected: MediaType) {
        assert_eq!(MediaType::from_path(name), expected);
    }

    #[rstest]
    #[case(MediaType::Jpeg)]
    #[case(MediaType::Svg)]
    #[case(MediaType::Icon)]
    #[case(MediaType::Unknown)]
    fn test_display_matches_as_str(#[case] media_type: MediaType) {
        assert_eq!(media_type.to_string(), media_type.as_str());
    }
}
