use crate::models::{CameraConfig, MediaRecord, Segment};

/// Caller-supplied id scheme for timeline items.
///
/// Ids must be stable: the same record under the same camera always yields
/// the same id, otherwise repeated fetches pile up duplicates.
pub trait ItemIdentity {
    /// `None` marks the record as unusable.
    fn event_item_id(&self, camera: &CameraConfig, record: &MediaRecord) -> Option<String>;

    fn recording_item_id(&self, camera: &CameraConfig, segment: &Segment) -> String;
}

/// `<camera>/event/<record id>` and `<camera>/recording/<segment id>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraScopedIdentity;

impl ItemIdentity for CameraScopedIdentity {
    fn event_item_id(&self, camera: &CameraConfig, record: &MediaRecord) -> Option<String> {
        record
            .id
            .as_ref()
            .map(|id| format!("{}/event/{}", camera.id, id))
    }

    fn recording_item_id(&self, camera: &CameraConfig, segment: &Segment) -> String {
        format!("{}/recording/{}", camera.id, segment.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_scoped_by_camera() {
        let front = CameraConfig::new("front");
        let back = CameraConfig::new("back");
        let record = MediaRecord::new("front").with_id("42");

        assert_eq!(
            CameraScopedIdentity.event_item_id(&front, &record).as_deref(),
            Some("front/event/42")
        );
        assert_ne!(
            CameraScopedIdentity.event_item_id(&front, &record),
            CameraScopedIdentity.event_item_id(&back, &record)
        );
        assert_eq!(
            CameraScopedIdentity.event_item_id(&front, &MediaRecord::new("front")),
            None
        );
        assert_eq!(
            CameraScopedIdentity.recording_item_id(&front, &Segment::new("7", 0, 1)),
            "front/recording/7"
        );
    }
}
