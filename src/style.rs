//! Style resolution: merging inherited and node-local presentation state.
//!
//! Every property resolves independently. Most properties inherit-or-override
//! down the tree; opacity is the one compounding property and multiplies
//! through ancestor groups so it can be baked onto each leaf. Clip and mask
//! references are node-local and never inherit.

/// A paint value for fill or stroke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paint {
    /// Explicitly unpainted (`fill="none"`)
    None,
    /// A CSS color string, e.g. `red` or `#ff0000`
    Color(String),
    /// A reference to a gradient or pattern in the resource table
    Ref(String),
}

impl Paint {
    pub fn color(value: impl Into<String>) -> Self {
        Paint::Color(value.into())
    }

    pub fn reference(id: impl Into<String>) -> Self {
        Paint::Ref(id.into())
    }

    /// The resource id this paint points at, if any
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Paint::Ref(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Node-local style overrides; `None` means "inherit"
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleOverrides {
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: Option<f64>,
    /// Local opacity factor, compounded with ancestor opacity
    pub opacity: Option<f64>,
    pub visibility: Option<Visibility>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    /// Clip path reference, applied to this node only (not inherited)
    pub clip_path: Option<String>,
    /// Mask reference, applied to this node only (not inherited)
    pub mask: Option<String>,
}

impl StyleOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill(mut self, paint: Paint) -> Self {
        self.fill = Some(paint);
        self
    }

    pub fn with_stroke(mut self, paint: Paint) -> Self {
        self.stroke = Some(paint);
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn with_clip_path(mut self, id: impl Into<String>) -> Self {
        self.clip_path = Some(id.into());
        self
    }

    pub fn with_mask(mut self, id: impl Into<String>) -> Self {
        self.mask = Some(id.into());
        self
    }
}

/// Fully resolved, inheritance-free style for one node.
///
/// Computed once per node during traversal and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub fill: Paint,
    pub stroke: Paint,
    pub stroke_width: f64,
    /// Effective opacity: the product of every ancestor factor and the local one
    pub opacity: f64,
    pub visibility: Visibility,
    pub font_family: String,
    pub font_size: f64,
    pub clip_path: Option<String>,
    pub mask: Option<String>,
}

impl ResolvedStyle {
    /// The SVG initial values, used at the root of resolution
    pub fn initial() -> Self {
        Self {
            fill: Paint::Color("black".to_string()),
            stroke: Paint::None,
            stroke_width: 1.0,
            opacity: 1.0,
            visibility: Visibility::Visible,
            font_family: "sans-serif".to_string(),
            font_size: 16.0,
            clip_path: None,
            mask: None,
        }
    }

    /// Resolve a node's style against its parent's resolved style.
    ///
    /// Inheriting properties take the local override when present, otherwise
    /// the parent's resolved value. Opacity compounds multiplicatively.
    pub fn resolve(&self, overrides: &StyleOverrides) -> ResolvedStyle {
        ResolvedStyle {
            fill: overrides.fill.clone().unwrap_or_else(|| self.fill.clone()),
            stroke: overrides
                .stroke
                .clone()
                .unwrap_or_else(|| self.stroke.clone()),
            stroke_width: overrides.stroke_width.unwrap_or(self.stroke_width),
            opacity: self.opacity * overrides.opacity.unwrap_or(1.0),
            visibility: overrides.visibility.unwrap_or(self.visibility),
            font_family: overrides
                .font_family
                .clone()
                .unwrap_or_else(|| self.font_family.clone()),
            font_size: overrides.font_size.unwrap_or(self.font_size),
            clip_path: overrides.clip_path.clone(),
            mask: overrides.mask.clone(),
        }
    }
}
