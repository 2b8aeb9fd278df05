//! flatsvg - normalize resolved vector render trees into self-contained SVG
//!
//! This library takes a fully resolved, post-layout render tree and emits it
//! as flattened, dependency-free XML: nested transforms baked into
//! coordinates, inherited styles inlined as presentation attributes on each
//! element, and every shared resource (gradients, patterns, clips, masks)
//! defined exactly once in a root-level `<defs>` block. Parsing markup into a
//! tree and painting pixels are both out of scope; the only input is the tree
//! itself.
//!
//! # Example
//!
//! ```rust
//! use flatsvg::{serialize, Node, Paint, Shape, Size, StyleOverrides, Tree};
//!
//! let rect = Node::shape(Shape::Rect { x: 10.0, y: 10.0, width: 30.0, height: 20.0 })
//!     .with_style(StyleOverrides::new().with_fill(Paint::color("red")));
//! let tree = Tree::new(Size::new(100.0, 100.0), Node::group().with_child(rect));
//!
//! let result = serialize(&tree).unwrap();
//! assert!(result.xml.starts_with("<svg"));
//! assert!(result.xml.contains("fill=\"red\""));
//! assert!(result.diagnostics.is_empty());
//! ```

pub mod error;
pub mod geom;
pub mod resources;
pub mod style;
pub mod tree;
pub mod writer;

pub use error::{ConvertError, Diagnostic};
pub use geom::{PathCommand, PathData, Point, Shape, Size, Transform};
pub use resources::{GradientStop, Resource, ResourceTable};
pub use style::{Paint, ResolvedStyle, StyleOverrides, Visibility};
pub use tree::{Image, ImageFormat, Node, NodeKind, Text, TextAnchor, TextRun, Tree};
pub use writer::{ConfigError, WriteConfig};

/// The outcome of a successful conversion: the document plus any non-fatal
/// anomalies that were degraded in place
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The complete UTF-8 XML document
    pub xml: String,
    /// Content-level anomalies recovered during the pass, in emission order
    pub diagnostics: Vec<Diagnostic>,
}

/// Serialize a render tree to SVG with default output options.
///
/// The tree is read-only for the duration of the call; calling this
/// concurrently on a shared tree is safe, and calling it twice on the same
/// tree yields byte-identical output. On fatal error no partial document is
/// returned.
pub fn serialize(tree: &Tree) -> Result<Conversion, ConvertError> {
    serialize_with_config(tree, &WriteConfig::default())
}

/// Serialize a render tree to SVG with custom output options
///
/// # Example
///
/// ```rust
/// use flatsvg::{serialize_with_config, Node, Size, Tree, WriteConfig};
///
/// let tree = Tree::new(Size::new(64.0, 64.0), Node::group().with_id("root"));
/// let config = WriteConfig::new().with_pretty_print(false).with_precision(3);
/// let result = serialize_with_config(&tree, &config).unwrap();
/// assert!(!result.xml.contains('\n'));
/// ```
pub fn serialize_with_config(
    tree: &Tree,
    config: &WriteConfig,
) -> Result<Conversion, ConvertError> {
    let (xml, diagnostics) = writer::svg::write_document(tree, config)?;
    Ok(Conversion { xml, diagnostics })
}

/// The engine's build identifier, constant for the process lifetime
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
