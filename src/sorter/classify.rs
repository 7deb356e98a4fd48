//! Pure decision functions: which items move, and when they were taken.

use crate::graph::error::{GraphError, GraphResult};
use crate::graph::types::DriveItem;
use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Mime-type prefixes sorted by default.
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &["image", "video"];

/// Whether an item is a candidate for sorting: it must carry a file facet
/// with a mime type starting with one of the allowed prefixes.  Folders,
/// facet-less items, and unknown types stay where they are.
pub fn should_move(item: &DriveItem, allowed_types: &[&str]) -> bool {
    let Some(file) = item.file.as_ref() else {
        return false;
    };
    let Some(mime) = file.mime_type.as_deref() else {
        return false;
    };
    allowed_types.iter().any(|prefix| mime.starts_with(prefix))
}

/// The capture timestamp of an item.
///
/// Only the photo facet's `takenDateTime` counts; `createdDateTime` is
/// deliberately not a fallback, since upload or sync time says nothing
/// about when a shot was taken.  Missing timestamps are an error naming
/// the item so the skip is diagnosable in the logs.
pub fn capture_timestamp(item: &DriveItem) -> GraphResult<DateTime<FixedOffset>> {
    let taken = item
        .photo
        .as_ref()
        .and_then(|p| p.taken_date_time.as_deref())
        .ok_or_else(|| GraphError::timestamp_missing(item.name.as_deref(), &item.id))?;

    parse_timestamp(taken).ok_or_else(|| {
        GraphError::timestamp_missing(item.name.as_deref(), &item.id)
    })
}

/// Permissive ISO-8601-family parsing: RFC 3339 first, then common
/// zone-less variants.
fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::error::GraphErrorCode;
    use crate::graph::types::{FileInfo, FolderInfo, PhotoInfo};
    use chrono::Datelike;

    fn item(mime: Option<&str>, taken: Option<&str>) -> DriveItem {
        DriveItem {
            id: "item1".into(),
            name: Some("IMG_0001.jpg".into()),
            created_date_time: Some("2022-01-01T00:00:00Z".into()),
            file: mime.map(|m| FileInfo {
                mime_type: Some(m.into()),
            }),
            folder: None,
            photo: taken.map(|t| PhotoInfo {
                taken_date_time: Some(t.into()),
            }),
        }
    }

    #[test]
    fn test_should_move_allowed_prefixes() {
        assert!(should_move(
            &item(Some("image/jpeg"), None),
            DEFAULT_ALLOWED_TYPES
        ));
        assert!(should_move(
            &item(Some("video/mp4"), None),
            DEFAULT_ALLOWED_TYPES
        ));
        assert!(!should_move(
            &item(Some("application/pdf"), None),
            DEFAULT_ALLOWED_TYPES
        ));
    }

    #[test]
    fn test_should_move_without_file_facet() {
        let mut folder = item(None, None);
        folder.folder = Some(FolderInfo { child_count: Some(3) });
        assert!(!should_move(&folder, DEFAULT_ALLOWED_TYPES));
    }

    #[test]
    fn test_should_move_without_mime_type() {
        let mut no_mime = item(Some("x"), None);
        no_mime.file = Some(FileInfo { mime_type: None });
        assert!(!should_move(&no_mime, DEFAULT_ALLOWED_TYPES));
    }

    #[test]
    fn test_should_move_custom_prefixes() {
        assert!(should_move(&item(Some("audio/flac"), None), &["audio"]));
        assert!(!should_move(
            &item(Some("audio/flac"), None),
            DEFAULT_ALLOWED_TYPES
        ));
    }

    #[test]
    fn test_capture_timestamp_parses_taken_date() {
        let dt = capture_timestamp(&item(
            Some("image/jpeg"),
            Some("2021-05-03T10:00:00Z"),
        ))
        .unwrap();
        assert_eq!(dt.year(), 2021);
        assert_eq!(dt.month(), 5);
        assert_eq!(dt.day(), 3);
    }

    #[test]
    fn test_capture_timestamp_parses_zone_less_variant() {
        let dt =
            capture_timestamp(&item(Some("image/jpeg"), Some("2019-12-31T23:59:59")))
                .unwrap();
        assert_eq!(dt.year(), 2019);
        assert_eq!(dt.month(), 12);
    }

    #[test]
    fn test_missing_photo_facet_is_diagnosable() {
        let err = capture_timestamp(&item(Some("image/jpeg"), None)).unwrap_err();
        assert_eq!(err.code, GraphErrorCode::TimestampMissing);
        assert!(err.message.contains("item1"));
        assert!(err.message.contains("IMG_0001.jpg"));
    }

    #[test]
    fn test_created_date_is_not_a_fallback() {
        // Item has createdDateTime but no photo facet: still an error.
        let err = capture_timestamp(&item(Some("image/jpeg"), None)).unwrap_err();
        assert_eq!(err.code, GraphErrorCode::TimestampMissing);
    }

    #[test]
    fn test_garbage_timestamp_is_an_error() {
        let err =
            capture_timestamp(&item(Some("image/jpeg"), Some("yesterday-ish"))).unwrap_err();
        assert_eq!(err.code, GraphErrorCode::TimestampMissing);
    }
}
