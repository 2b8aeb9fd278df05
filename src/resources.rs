//! Shared resource definitions and the reference-collection pass.
//!
//! Resources are stored by identifier in a [`ResourceTable`] and referenced by
//! id from node styles and use-reference nodes, so arbitrarily many nodes can
//! share one gradient or clip without ownership cycles. The table is built
//! before serialization and is read-only for the whole pass.
//!
//! Serialization is two-pass: [`collect`] walks the tree first and records
//! every resource id that will actually be referenced, in first-use order.
//! The emitter then writes those definitions into a root-level `<defs>` block
//! before the body, which guarantees forward-declared, single-definition
//! output without backpatching the buffer.

use std::collections::{HashMap, HashSet};

use crate::geom::PathData;
use crate::style::ResolvedStyle;
use crate::tree::{Node, NodeKind, Tree};

/// One color stop of a gradient
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    /// Offset along the gradient vector, 0..=1
    pub offset: f64,
    pub color: String,
    pub opacity: f64,
}

impl GradientStop {
    pub fn new(offset: f64, color: impl Into<String>) -> Self {
        Self {
            offset,
            color: color.into(),
            opacity: 1.0,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

/// A shared resource definition.
///
/// Gradient and pattern coordinates are in user space (`userSpaceOnUse`);
/// pattern and mask content is emitted in its own coordinate space, resolved
/// from initial style state.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    LinearGradient {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stops: Vec<GradientStop>,
    },
    RadialGradient {
        cx: f64,
        cy: f64,
        r: f64,
        stops: Vec<GradientStop>,
    },
    Pattern {
        width: f64,
        height: f64,
        content: Vec<Node>,
    },
    ClipPath {
        path: PathData,
    },
    Mask {
        content: Vec<Node>,
    },
    /// Reusable subtree for use-reference nodes; expanded inline at each use
    /// site rather than emitted into `<defs>`
    Symbol {
        content: Node,
    },
}

/// Identifier-keyed table of shared resources
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceTable {
    entries: HashMap<String, Resource>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, resource: Resource) {
        self.entries.insert(id.into(), resource);
    }

    pub fn with(mut self, id: impl Into<String>, resource: Resource) -> Self {
        self.insert(id, resource);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Read-only discovery pass: every resource id the emitted document will
/// reference, in first-use order.
///
/// Mirrors the emitter's traversal, including style resolution, so an id is
/// collected exactly when the second pass will emit a `url(#id)` (or expand a
/// use-reference) for it. Dangling ids are skipped here; the emitter reports
/// them. Definitions that reference further resources are recursed into, with
/// already-seen ids breaking reference cycles.
pub(crate) fn collect(tree: &Tree) -> Vec<String> {
    let mut collector = Collector {
        table: &tree.resources,
        seen: HashSet::new(),
        order: Vec::new(),
        use_stack: Vec::new(),
    };
    collector.visit(&tree.root, &ResolvedStyle::initial());
    collector.order
}

struct Collector<'a> {
    table: &'a ResourceTable,
    seen: HashSet<String>,
    order: Vec<String>,
    use_stack: Vec<String>,
}

impl Collector<'_> {
    fn visit(&mut self, node: &Node, parent_style: &ResolvedStyle) {
        // Nodes the emitter prunes reference nothing
        match &node.kind {
            NodeKind::Group if node.children.is_empty() && node.id.is_none() => return,
            NodeKind::Path(data) if data.is_empty() => return,
            NodeKind::Text(text) if text.runs.is_empty() => return,
            _ => {}
        }

        let style = parent_style.resolve(&node.style);

        // Clip and mask apply to the node itself, container or leaf
        if let Some(id) = &style.clip_path {
            self.record(id.clone());
        }
        if let Some(id) = &style.mask {
            self.record(id.clone());
        }

        match &node.kind {
            NodeKind::Group => {}
            NodeKind::Path(_) | NodeKind::Shape(_) | NodeKind::Text(_) => {
                // Paint references only matter where they are emitted
                if let Some(id) = style.fill.resource_id() {
                    self.record(id.to_string());
                }
                if let Some(id) = style.stroke.resource_id() {
                    self.record(id.to_string());
                }
            }
            NodeKind::Image(_) => {}
            NodeKind::Use(id) => {
                if self.use_stack.iter().any(|active| active == id) {
                    return;
                }
                let table = self.table;
                if let Some(Resource::Symbol { content }) = table.get(id) {
                    self.use_stack.push(id.clone());
                    self.visit(content, &style);
                    self.use_stack.pop();
                }
            }
        }

        for child in &node.children {
            self.visit(child, &style);
        }
    }

    /// Mark an id as referenced; on first sight, recurse into its definition
    fn record(&mut self, id: String) {
        if self.seen.contains(&id) || !self.table.contains(&id) {
            return;
        }
        self.seen.insert(id.clone());
        self.order.push(id.clone());

        let initial = ResolvedStyle::initial();
        let table = self.table;
        match table.get(&id) {
            Some(Resource::Pattern { content, .. }) | Some(Resource::Mask { content }) => {
                for node in content {
                    self.visit(node, &initial);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Shape, Size};
    use crate::style::{Paint, StyleOverrides};
    use crate::tree::{Node, Text};

    fn rect() -> Shape {
        Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        }
    }

    fn gradient() -> Resource {
        Resource::LinearGradient {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 0.0,
            stops: vec![GradientStop::new(0.0, "red"), GradientStop::new(1.0, "blue")],
        }
    }

    #[test]
    fn test_first_use_order() {
        let root = Node::group()
            .with_child(
                Node::shape(rect()).with_style(StyleOverrides::new().with_fill(Paint::reference("b"))),
            )
            .with_child(
                Node::shape(rect()).with_style(StyleOverrides::new().with_fill(Paint::reference("a"))),
            );
        let tree = Tree::new(Size::new(100.0, 100.0), root).with_resources(
            ResourceTable::new().with("a", gradient()).with("b", gradient()),
        );
        assert_eq!(collect(&tree), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_duplicate_references_collected_once() {
        let styled = StyleOverrides::new().with_fill(Paint::reference("g1"));
        let root = Node::group()
            .with_child(Node::shape(rect()).with_style(styled.clone()))
            .with_child(Node::shape(rect()).with_style(styled));
        let tree = Tree::new(Size::new(100.0, 100.0), root)
            .with_resources(ResourceTable::new().with("g1", gradient()));
        assert_eq!(collect(&tree), vec!["g1".to_string()]);
    }

    #[test]
    fn test_dangling_reference_not_collected() {
        let root = Node::shape(rect())
            .with_style(StyleOverrides::new().with_fill(Paint::reference("missing")));
        let tree = Tree::new(Size::new(100.0, 100.0), root);
        assert!(collect(&tree).is_empty());
    }

    #[test]
    fn test_inherited_paint_reference_collected_at_leaf() {
        // The reference lives on the group but is emitted on the leaf
        let root = Node::group()
            .with_style(StyleOverrides::new().with_fill(Paint::reference("g1")))
            .with_child(Node::shape(rect()));
        let tree = Tree::new(Size::new(100.0, 100.0), root)
            .with_resources(ResourceTable::new().with("g1", gradient()));
        assert_eq!(collect(&tree), vec!["g1".to_string()]);
    }

    #[test]
    fn test_group_fill_reference_without_leaf_not_collected() {
        let root = Node::group()
            .with_style(StyleOverrides::new().with_fill(Paint::reference("g1")))
            .with_child(Node::group());
        let tree = Tree::new(Size::new(100.0, 100.0), root)
            .with_resources(ResourceTable::new().with("g1", gradient()));
        assert!(collect(&tree).is_empty());
    }

    #[test]
    fn test_pruned_nodes_collect_nothing() {
        // Empty anonymous group, empty path, empty text: the emitter drops
        // all three, so their references must not pull in definitions
        let clip = Resource::ClipPath {
            path: crate::geom::PathData::new().move_to(0.0, 0.0).close(),
        };
        let root = Node::group()
            .with_child(
                Node::group().with_style(StyleOverrides::new().with_clip_path("c1")),
            )
            .with_child(
                Node::path(crate::geom::PathData::new())
                    .with_style(StyleOverrides::new().with_fill(Paint::reference("g1"))),
            )
            .with_child(
                Node::text(Text::new(vec![]))
                    .with_style(StyleOverrides::new().with_stroke(Paint::reference("g1"))),
            );
        let tree = Tree::new(Size::new(100.0, 100.0), root).with_resources(
            ResourceTable::new().with("c1", clip).with("g1", gradient()),
        );
        assert!(collect(&tree).is_empty());
    }

    #[test]
    fn test_pattern_content_recursed() {
        let pattern = Resource::Pattern {
            width: 4.0,
            height: 4.0,
            content: vec![Node::shape(rect())
                .with_style(StyleOverrides::new().with_fill(Paint::reference("inner")))],
        };
        let root = Node::shape(rect())
            .with_style(StyleOverrides::new().with_fill(Paint::reference("tile")));
        let tree = Tree::new(Size::new(100.0, 100.0), root).with_resources(
            ResourceTable::new()
                .with("tile", pattern)
                .with("inner", gradient()),
        );
        assert_eq!(collect(&tree), vec!["tile".to_string(), "inner".to_string()]);
    }

    #[test]
    fn test_symbol_expanded_but_not_collected() {
        let symbol = Resource::Symbol {
            content: Node::shape(rect())
                .with_style(StyleOverrides::new().with_fill(Paint::reference("g1"))),
        };
        let root = Node::use_ref("sym");
        let tree = Tree::new(Size::new(100.0, 100.0), root).with_resources(
            ResourceTable::new()
                .with("sym", symbol)
                .with("g1", gradient()),
        );
        // The gradient inside the symbol is collected; the symbol itself is
        // inlined at the use site and never lands in defs.
        assert_eq!(collect(&tree), vec!["g1".to_string()]);
    }

    #[test]
    fn test_cyclic_symbol_terminates() {
        let symbol = Resource::Symbol {
            content: Node::group().with_child(Node::use_ref("sym")),
        };
        let root = Node::use_ref("sym");
        let tree = Tree::new(Size::new(100.0, 100.0), root)
            .with_resources(ResourceTable::new().with("sym", symbol));
        assert!(collect(&tree).is_empty());
    }
}
