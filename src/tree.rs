//! The resolved render tree model.
//!
//! This is the upstream contract: a parser (or test code) assembles a [`Tree`]
//! and hands it to [`crate::serialize`]. The tree is read-only for the whole
//! conversion; children are owned by their parent and insertion order is paint
//! order.

use crate::geom::{PathData, Shape, Size, Transform};
use crate::resources::ResourceTable;
use crate::style::StyleOverrides;

/// Horizontal alignment of a text run relative to its anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// One positioned run of text.
///
/// Positions are post-layout absolute coordinates in the node's local space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl TextRun {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// Text payload: one or more positioned runs sharing font properties
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub runs: Vec<TextRun>,
    pub anchor: TextAnchor,
}

impl Text {
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            anchor: TextAnchor::Start,
        }
    }

    pub fn with_anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Encoded format of an embedded raster image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
        }
    }
}

/// Embedded raster image payload with its placement rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

/// Kind-specific payload of a render node.
///
/// A closed set: the emitter matches exhaustively, so a new kind is a
/// compile-time-checked extension point.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Structural container; carries no geometry of its own
    Group,
    /// Freeform path geometry
    Path(PathData),
    /// Rect / circle / ellipse primitive
    Shape(Shape),
    /// Positioned text runs
    Text(Text),
    /// Embedded raster image
    Image(Image),
    /// Reference to a reusable symbol in the resource table, expanded inline
    Use(String),
}

/// A node in the resolved render tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: Option<String>,
    pub transform: Transform,
    pub style: StyleOverrides,
    pub kind: NodeKind,
    /// Children in paint order; later siblings paint over earlier ones.
    /// Only group nodes carry children; the emitter ignores children of
    /// leaf kinds.
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: None,
            transform: Transform::identity(),
            style: StyleOverrides::default(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn path(data: PathData) -> Self {
        Self::new(NodeKind::Path(data))
    }

    pub fn shape(shape: Shape) -> Self {
        Self::new(NodeKind::Shape(shape))
    }

    pub fn text(text: Text) -> Self {
        Self::new(NodeKind::Text(text))
    }

    pub fn image(image: Image) -> Self {
        Self::new(NodeKind::Image(image))
    }

    pub fn use_ref(id: impl Into<String>) -> Self {
        Self::new(NodeKind::Use(id.into()))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_style(mut self, style: StyleOverrides) -> Self {
        self.style = style;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children.extend(children);
        self
    }
}

/// A fully resolved render tree: viewport, root node, resource table
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub size: Size,
    pub root: Node,
    pub resources: ResourceTable,
}

impl Tree {
    pub fn new(size: Size, root: Node) -> Self {
        Self {
            size,
            root,
            resources: ResourceTable::new(),
        }
    }

    pub fn with_resources(mut self, resources: ResourceTable) -> Self {
        self.resources = resources;
        self
    }
}
