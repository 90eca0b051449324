use serde::{Deserialize, Serialize};

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfig {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "enabled")]
    pub events_enabled: bool,
    #[serde(default = "enabled")]
    pub recordings_enabled: bool,
}

impl CameraConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            events_enabled: true,
            recordings_enabled: true,
        }
    }
}
