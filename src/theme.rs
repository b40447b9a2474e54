use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub line_color: String,
    pub line_width: f32,
    pub active_color: String,
    pub fallback_color: String,
    pub component_fill: String,
    pub component_stroke: String,
    pub label_color: String,
    pub background: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, ui-sans-serif, system-ui, sans-serif".to_string(),
            font_size: 11.0,
            line_color: "#4B5563".to_string(),
            line_width: 2.0,
            active_color: "#DC2626".to_string(),
            fallback_color: "#F59E0B".to_string(),
            component_fill: "#F3F4F6".to_string(),
            component_stroke: "#9CA3AF".to_string(),
            label_color: "#111827".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, ui-sans-serif, system-ui, sans-serif".to_string(),
            font_size: 11.0,
            line_color: "#9CA3AF".to_string(),
            line_width: 2.0,
            active_color: "#F87171".to_string(),
            fallback_color: "#FBBF24".to_string(),
            component_fill: "#1F2937".to_string(),
            component_stroke: "#4B5563".to_string(),
            label_color: "#F9FAFB".to_string(),
            background: "#111827".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
