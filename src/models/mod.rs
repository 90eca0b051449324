pub mod camera;
pub mod item;
pub mod media;
pub mod range;

pub use camera::CameraConfig;
pub use item::{ItemKind, TimelineItem};
pub use media::{MediaRecord, Segment};
pub use range::TimeRange;
