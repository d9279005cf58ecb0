//! Dashboard tool catalog.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Available,
    ComingSoon,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub endpoint: &'static str,
    pub status: ToolStatus,
}

pub const TOOLS: &[ToolInfo] = &[
    ToolInfo {
        key: "conversation",
        label: "Conversation",
        endpoint: "/api/conversation",
        status: ToolStatus::Available,
    },
    ToolInfo {
        key: "image",
        label: "Image Generation",
        endpoint: "/api/image",
        status: ToolStatus::Available,
    },
    ToolInfo {
        key: "video",
        label: "Video Generation",
        endpoint: "/api/video",
        status: ToolStatus::ComingSoon,
    },
    ToolInfo {
        key: "music",
        label: "Music Generation",
        endpoint: "/api/music",
        status: ToolStatus::ComingSoon,
    },
    ToolInfo {
        key: "code",
        label: "Code Generation",
        endpoint: "/api/code",
        status: ToolStatus::Available,
    },
];

#[must_use]
pub fn find(key: &str) -> Option<&'static ToolInfo> {
    TOOLS.iter().find(|tool| tool.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_and_music_are_placeholders() {
        assert_eq!(find("video").map(|t| t.status), Some(ToolStatus::ComingSoon));
        assert_eq!(find("music").map(|t| t.status), Some(ToolStatus::ComingSoon));
    }

    #[test]
    fn relay_tools_are_available() {
        for key in ["conversation", "code", "image"] {
            assert_eq!(find(key).map(|t| t.status), Some(ToolStatus::Available), "{key}");
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_value(ToolStatus::ComingSoon).unwrap();
        assert_eq!(json, "coming_soon");
    }
}
