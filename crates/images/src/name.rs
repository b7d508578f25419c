//! Stored names for uploads: `{product_id}_{millis}{extension}`.

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use storefront_storage::validate_name;
use time::UtcDateTime;

/// Last timestamp handed out, shared by every upload in the process.
static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

/// The extension of a client filename, including its leading dot.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub struct Extension(String);

impl Extension {
    /// Everything from the last `.` of the final path segment (inclusive).
    ///
    /// Browsers may send a full client-side path, so anything before the last
    /// `/` or `\` is ignored. Fails with
    /// [`MalformedFilename`](ErrorKind::MalformedFilename) when there is no
    /// dot, or when the extension could not appear in a stored name.
    ///
    /// ```
    /// use storefront_images::Extension;
    ///
    /// assert_eq!(Extension::from_filename("cat.png").unwrap().as_str(), ".png");
    /// assert_eq!(Extension::from_filename("archive.tar.gz").unwrap().as_str(), ".gz");
    /// assert_eq!(Extension::from_filename(r"C:\Users\me\cat.JPG").unwrap().as_str(), ".JPG");
    /// assert!(Extension::from_filename("README").is_err());
    /// ```
    pub fn from_filename(original: &str) -> Result<Self> {
        let segment = original.rsplit(['/', '\\']).next().unwrap_or(original);
        let Some(dot) = segment.rfind('.') else {
            exn::bail!(ErrorKind::MalformedFilename(original.to_string()));
        };
        let extension = &segment[dot..];
        // The extension ends up as the tail of a stored name, so it has to
        // survive the same validation.
        if validate_name(&format!("0_0{extension}")).is_err() {
            exn::bail!(ErrorKind::MalformedFilename(original.to_string()));
        }
        Ok(Self(extension.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Generate the stored name for an upload.
///
/// Timestamps come from a process-wide clock that never repeats: two
/// uploads in the same millisecond get consecutive values, so names for
/// the same product cannot collide.
pub fn stored_name(product_id: i64, extension: &Extension) -> String {
    format!("{product_id}_{}{extension}", next_millis(&LAST_MILLIS, now_millis()))
}

fn now_millis() -> u64 {
    // Before 1970 or after the year 584 million; either way, not a real clock.
    u64::try_from(UtcDateTime::now().unix_timestamp_nanos() / 1_000_000).unwrap_or(0)
}

/// `max(now, last + 1)`, stored back as the new `last`.
fn next_millis(last: &AtomicU64, now: u64) -> u64 {
    let mut current = last.load(Ordering::Acquire);
    loop {
        let next = now.max(current.saturating_add(1));
        match last.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[rstest]
    #[case("photo.png", ".png")]
    #[case("photo.JPG", ".JPG")]
    #[case("my.holiday.photo.jpeg", ".jpeg")]
    #[case(".hidden", ".hidden")]
    #[case("trailing.", ".")]
    #[case("uploads/2024/photo.webp", ".webp")]
    #[case(r"C:\fakepath\photo.gif", ".gif")]
    #[case("dir.d/photo.png", ".png")]
    fn test_extension(#[case] filename: &str, #[case] expected: &str) {
        assert_eq!(Extension::from_filename(filename).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("photo")]
    #[case("")]
    #[case("dir.d/photo")]
    #[case(r"dir.d\photo")]
    #[case("photo.pn\0g")]
    fn test_extension_malformed(#[case] filename: &str) {
        let err = Extension::from_filename(filename).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedFilename(_)));
    }

    #[test]
    fn test_stored_name_shape() {
        let name = stored_name(42, &Extension::from_filename("a.png").unwrap());
        let (id, rest) = name.split_once('_').unwrap();
        assert_eq!(id, "42");
        let millis = rest.strip_suffix(".png").unwrap();
        assert!(millis.parse::<u64>().unwrap() > 1_600_000_000_000);
        assert!(validate_name(&name).is_ok());
    }

    #[test]
    fn test_clock_follows_wall_clock() {
        let last = AtomicU64::new(100);
        assert_eq!(next_millis(&last, 500), 500);
        assert_eq!(last.load(Ordering::SeqCst), 500);
    }

    #[test]
    fn test_clock_never_repeats() {
        let last = AtomicU64::new(0);
        assert_eq!(next_millis(&last, 1000), 1000);
        assert_eq!(next_millis(&last, 1000), 1001);
        // Wall clock stepping backwards does not reuse values.
        assert_eq!(next_millis(&last, 900), 1002);
        assert_eq!(next_millis(&last, 2000), 2000);
    }

    #[test]
    fn test_clock_is_unique_across_threads() {
        let last = Arc::new(AtomicU64::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let last = Arc::clone(&last);
                std::thread::spawn(move || (0..1000).map(|_| next_millis(&last, 5)).collect::<Vec<_>>())
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "duplicate timestamp {value}");
            }
        }
        assert_eq!(seen.len(), 8000);
    }

    #[test]
    fn test_same_product_names_are_unique() {
        let ext = Extension::from_filename("a.jpg").unwrap();
        let names: HashSet<_> = (0..500).map(|_| stored_name(7, &ext)).collect();
        assert_eq!(names.len(), 500);
    }
}
