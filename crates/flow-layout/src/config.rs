//! Layout configuration

/// Flow layout options
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlowConfig {
    /// Append pages when text runs past the last frame
    pub auto_extend: bool,

    /// Upper bound on the number of pages a flow may grow to
    pub max_pages: usize,

    /// Counter width reserved when a counter sets no placeholder
    pub default_counter_width: f32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            auto_extend: true,
            max_pages: 512,
            default_counter_width: 0.0,
        }
    }
}
