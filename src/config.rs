//! Per-instance configuration for regions and shape tessellation.

use lyon::tessellation::FillRule;

/// Vertex attribute locations the backend feeds.
///
/// These must match the locations of the shader program bound at draw
/// time. The defaults match the locations `shaders::REGION_ATTRIBUTES` binds
/// (`glow` feature).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLocations {
    /// `vec3` position attribute.
    pub position: u32,
    /// `vec2` texture-coordinate attribute.
    pub tex_coord: u32,
}

impl Default for AttributeLocations {
    fn default() -> Self {
        Self {
            position: 0,
            tex_coord: 1,
        }
    }
}

/// Settings for one region instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionConfig {
    /// Name used in log lines to tell instances apart.
    pub label: String,
    /// Level at which mesh mutations and buffer syncs of this instance are
    /// logged. `None` keeps the instance quiet.
    pub instance_log_level: Option<log::Level>,
    /// Number of elements each GPU buffer has room for on first allocation.
    pub initial_element_count: usize,
    /// Where positions and texture coordinates are bound at draw time.
    pub attributes: AttributeLocations,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            label: String::from("region"),
            instance_log_level: None,
            initial_element_count: 256,
            attributes: AttributeLocations::default(),
        }
    }
}

impl RegionConfig {
    /// Set the log label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Log this instance's activity at `level`.
    #[must_use]
    pub fn with_instance_logging(mut self, level: log::Level) -> Self {
        self.instance_log_level = Some(level);
        self
    }
}

/// Options for flattening and filling a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationOptions {
    /// Maximum distance between a curve and its flattened approximation.
    pub tolerance: f32,
    /// Which regions of a self-intersecting path count as inside.
    pub fill_rule: FillRule,
}

impl Default for TessellationOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            fill_rule: FillRule::NonZero,
        }
    }
}
