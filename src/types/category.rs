use serde::{Deserialize, Serialize};

/// Icons a category may carry.
pub const PRESET_ICONS: &[&str] = &[
    "Bookmark",
    "Book",
    "Code",
    "Coffee",
    "Film",
    "Folder",
    "Heart",
    "Image",
    "Link",
    "Music",
    "Package",
    "ShoppingBag",
    "Star",
    "Video",
    "Zap",
    "Activity",
    "Dumbbell",
];

/// Colors offered by the category editor. Any hex color is accepted on save.
pub const PRESET_COLORS: &[&str] = &[
    "#ef4444", "#f97316", "#f59e0b", "#84cc16", "#10b981", "#06b6d4", "#3b82f6", "#6366f1",
    "#8b5cf6", "#d946ef", "#ec4899",
];

/// A user-defined label attachable to many links.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}
