use crate::error::{ErrorKind, Result};
use crate::format::MediaType;
use exn::ResultExt;
use storefront_storage::{BackendHandle, ByteStream};

/// A stored image, opened for streaming.
pub struct Image {
    pub name: String,
    pub size: u64,
    pub media_type: MediaType,
    pub body: ByteStream,
}

/// Open a stored image by its stored name.
///
/// Only the image directory is consulted; whether any product still refers
/// to the file does not matter.
///
/// # Errors
/// Every failure is reported as [`NotFound`](ErrorKind::NotFound): invalid
/// names, missing files, directories and unreadable files alike.
pub async fn fetch(backend: &BackendHandle, name: &str) -> Result<Image> {
    let not_found = || ErrorKind::NotFound(name.to_string());
    let info = backend.stat(name).await.or_raise(not_found)?;
    let body = backend.stream(name).await.or_raise(not_found)?;
    tracing::debug!(name, size = info.size, "serving stored image");
    Ok(Image { media_type: MediaType::from_path(&info.name), name: info.name, size: info.size, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use rstest::rstest;
    use std::sync::Arc;
    use storefront_storage::backend::MockBackend;

    fn backend() -> BackendHandle {
        Arc::new(MockBackend::with_files([
            ("1_1718000000000.png", Vec::from(*b"\x89PNG\r\n")),
            ("2_1718000000001.JPG", Vec::from(*b"\xFF\xD8\xFF")),
            ("3_1718000000002.bin", Vec::from(*b"??")),
        ]))
    }

    #[rstest]
    #[case("1_1718000000000.png", MediaType::Png, 6)]
    #[case("2_1718000000001.JPG", MediaType::Jpeg, 3)]
    #[case("3_1718000000002.bin", MediaType::Unknown, 2)]
    #[tokio::test]
    async fn test_fetch(#[case] name: &str, #[case] media_type: MediaType, #[case] size: u64) {
        let image = fetch(&backend(), name).await.unwrap();
        assert_eq!(image.name, name);
        assert_eq!(image.media_type, media_type);
        assert_eq!(image.size, size);
        let body: Vec<_> = image.body.try_collect().await.unwrap();
        assert_eq!(body.concat().len() as u64, size);
    }

    #[rstest]
    #[case("missing.png")]
    #[case("../1_1718000000000.png")]
    #[case("..")]
    #[case("")]
    #[case("a/b.png")]
    #[tokio::test]
    async fn test_fetch_not_found(#[case] name: &str) {
        let err = fetch(&backend(), name).await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
