//! Tree walker and SVG emitter.
//!
//! One [`Emitter`] serves exactly one conversion call: pass 1 collects the
//! referenced resources, pass 2 writes the document header, a root-level
//! `<defs>` block, then the flattened visual tree in a single pre-order
//! depth-first traversal. Attribute order is fixed (id, geometry, residual
//! transform, style, resource references), so identical input yields
//! byte-identical output.

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{ConvertError, Diagnostic};
use crate::geom::{PathCommand, PathData, Shape, Transform};
use crate::resources::{self, GradientStop, Resource};
use crate::style::{Paint, ResolvedStyle, Visibility};
use crate::tree::{Image, Node, NodeKind, Text, TextAnchor, Tree};
use crate::writer::config::WriteConfig;
use crate::writer::xml::{contains_invalid_xml, format_number, strip_invalid_xml, XmlWriter};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Emission phases, strictly sequential for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Defs,
    Body,
    Done,
}

/// Serialize a tree into SVG text plus the diagnostics recovered on the way
pub(crate) fn write_document(
    tree: &Tree,
    config: &WriteConfig,
) -> Result<(String, Vec<Diagnostic>), ConvertError> {
    if !tree.size.is_valid() {
        return Err(ConvertError::InvalidViewport {
            width: tree.size.width,
            height: tree.size.height,
        });
    }

    let order = resources::collect(tree);
    let mut emitter = Emitter {
        tree,
        xml: XmlWriter::new(
            config.pretty_print,
            config.precision,
            config.max_output_bytes,
        ),
        diagnostics: Vec::new(),
        emitted: HashSet::new(),
        use_stack: Vec::new(),
        phase: Phase::Idle,
    };
    emitter.write(&order)?;
    Ok((emitter.xml.finish(), emitter.diagnostics))
}

struct Emitter<'a> {
    tree: &'a Tree,
    xml: XmlWriter,
    diagnostics: Vec<Diagnostic>,
    /// Resource ids already written into `<defs>`
    emitted: HashSet<String>,
    /// Use-reference ids currently being expanded, for cycle detection
    use_stack: Vec<String>,
    phase: Phase,
}

impl<'a> Emitter<'a> {
    fn write(&mut self, defs_order: &[String]) -> Result<(), ConvertError> {
        debug_assert_eq!(self.phase, Phase::Idle);

        self.xml.start_element("svg")?;
        self.xml.attr("xmlns", SVG_NS)?;
        self.xml.attr_f64("width", self.tree.size.width)?;
        self.xml.attr_f64("height", self.tree.size.height)?;
        let view_box = format!(
            "0 0 {} {}",
            format_number(self.tree.size.width, self.xml.precision()),
            format_number(self.tree.size.height, self.xml.precision())
        );
        self.xml.attr("viewBox", &view_box)?;

        self.phase = Phase::Defs;
        self.xml.start_element("defs")?;
        for id in defs_order {
            self.emit_resource(id)?;
        }
        self.xml.end_element()?;

        self.phase = Phase::Body;
        let root_transform = Transform::identity();
        let root_style = ResolvedStyle::initial();
        let root = &self.tree.root;
        self.walk(root, &root_transform, &root_style)?;

        self.xml.end_element()?;
        self.phase = Phase::Done;
        Ok(())
    }

    /// Pre-order traversal in insertion order, which preserves paint order
    fn walk(
        &mut self,
        node: &'a Node,
        parent_transform: &Transform,
        parent_style: &ResolvedStyle,
    ) -> Result<(), ConvertError> {
        let transform = parent_transform.pre_concat(&node.transform);
        let style = parent_style.resolve(&node.style);

        match &node.kind {
            NodeKind::Group => {
                // Empty anonymous groups have no visual effect and are pruned;
                // a group carrying an id stays addressable.
                if node.children.is_empty() && node.id.is_none() {
                    return Ok(());
                }
                self.xml.start_element("g")?;
                self.write_id(node)?;
                self.write_region_refs(&style)?;
                for child in &node.children {
                    self.walk(child, &transform, &style)?;
                }
                self.xml.end_element()
            }
            NodeKind::Path(data) => {
                if data.is_empty() {
                    return Ok(());
                }
                let baked = data.transform(&transform);
                self.emit_path_element(node.id.as_deref(), &baked, &style, transform.scale_factor())
            }
            NodeKind::Shape(shape) => self.emit_shape(node, *shape, &transform, &style),
            NodeKind::Text(text) => self.emit_text(node, text, &transform, &style),
            NodeKind::Image(image) => self.emit_image(node, image, &transform, &style),
            NodeKind::Use(id) => self.emit_use(id, &transform, &style),
        }
    }

    // --- leaf emission -----------------------------------------------------

    fn emit_path_element(
        &mut self,
        id: Option<&str>,
        baked: &PathData,
        style: &ResolvedStyle,
        scale: f64,
    ) -> Result<(), ConvertError> {
        self.xml.start_element("path")?;
        if let Some(id) = id {
            self.write_id_value(id)?;
        }
        let d = path_to_d(baked, self.xml.precision());
        self.xml.attr("d", &d)?;
        self.write_paint_attrs(style, scale)?;
        self.write_region_refs(style)?;
        self.xml.end_element()
    }

    /// Shapes stay native elements under axis-aligned transforms; rotation or
    /// skew converts them to transformed path data
    fn emit_shape(
        &mut self,
        node: &Node,
        shape: Shape,
        transform: &Transform,
        style: &ResolvedStyle,
    ) -> Result<(), ConvertError> {
        if !transform.is_axis_aligned() {
            let baked = shape.to_path().transform(transform);
            return self.emit_path_element(node.id.as_deref(), &baked, style, transform.scale_factor());
        }

        match shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => {
                let (x, y, width, height) = bake_rect(transform, x, y, width, height);
                self.xml.start_element("rect")?;
                self.write_id(node)?;
                self.xml.attr_f64("x", x)?;
                self.xml.attr_f64("y", y)?;
                self.xml.attr_f64("width", width)?;
                self.xml.attr_f64("height", height)?;
            }
            Shape::Circle { cx, cy, r } => {
                let center = transform.apply(crate::geom::Point::new(cx, cy));
                let rx = r * transform.a.abs();
                let ry = r * transform.d.abs();
                if rx == ry {
                    self.xml.start_element("circle")?;
                    self.write_id(node)?;
                    self.xml.attr_f64("cx", center.x)?;
                    self.xml.attr_f64("cy", center.y)?;
                    self.xml.attr_f64("r", rx)?;
                } else {
                    // Non-uniform scale turns a circle into an ellipse
                    self.xml.start_element("ellipse")?;
                    self.write_id(node)?;
                    self.xml.attr_f64("cx", center.x)?;
                    self.xml.attr_f64("cy", center.y)?;
                    self.xml.attr_f64("rx", rx)?;
                    self.xml.attr_f64("ry", ry)?;
                }
            }
            Shape::Ellipse { cx, cy, rx, ry } => {
                let center = transform.apply(crate::geom::Point::new(cx, cy));
                self.xml.start_element("ellipse")?;
                self.write_id(node)?;
                self.xml.attr_f64("cx", center.x)?;
                self.xml.attr_f64("cy", center.y)?;
                self.xml.attr_f64("rx", rx * transform.a.abs())?;
                self.xml.attr_f64("ry", ry * transform.d.abs())?;
            }
        }

        self.write_paint_attrs(style, transform.scale_factor())?;
        self.write_region_refs(style)?;
        self.xml.end_element()
    }

    /// Text runs carry post-layout positions; pure translations bake into the
    /// run coordinates, anything else becomes a matrix attribute since glyph
    /// baking is out of scope
    fn emit_text(
        &mut self,
        node: &Node,
        text: &Text,
        transform: &Transform,
        style: &ResolvedStyle,
    ) -> Result<(), ConvertError> {
        if text.runs.is_empty() {
            return Ok(());
        }
        let translate_only = transform.is_translate();

        self.xml.start_inline_element("text")?;
        self.write_id(node)?;

        let map_run = |x: f64, y: f64| -> (f64, f64) {
            if translate_only {
                (x + transform.e, y + transform.f)
            } else {
                (x, y)
            }
        };

        if text.runs.len() == 1 {
            let (x, y) = map_run(text.runs[0].x, text.runs[0].y);
            self.xml.attr_f64("x", x)?;
            self.xml.attr_f64("y", y)?;
        }
        if !translate_only {
            let matrix = matrix_attr(transform, self.xml.precision());
            self.xml.attr("transform", &matrix)?;
        }

        // Text lengths are never baked: a pure translation has scale 1, and
        // anything else rides on the matrix attribute
        self.write_paint_attrs(style, 1.0)?;
        let family = self.clean_attr(&style.font_family, "font-family");
        self.xml.attr("font-family", &family)?;
        self.xml.attr_f64("font-size", style.font_size)?;
        match text.anchor {
            TextAnchor::Start => {}
            TextAnchor::Middle => self.xml.attr("text-anchor", "middle")?,
            TextAnchor::End => self.xml.attr("text-anchor", "end")?,
        }
        self.write_region_refs(style)?;

        if text.runs.len() == 1 {
            let content = self.clean_text(&text.runs[0].text);
            self.xml.text(&content)?;
        } else {
            for run in &text.runs {
                let (x, y) = map_run(run.x, run.y);
                self.xml.start_element("tspan")?;
                self.xml.attr_f64("x", x)?;
                self.xml.attr_f64("y", y)?;
                let content = self.clean_text(&run.text);
                self.xml.text(&content)?;
                self.xml.end_element()?;
            }
        }
        self.xml.end_element()
    }

    fn emit_image(
        &mut self,
        node: &Node,
        image: &Image,
        transform: &Transform,
        style: &ResolvedStyle,
    ) -> Result<(), ConvertError> {
        self.xml.start_element("image")?;
        self.write_id(node)?;

        if transform.is_axis_aligned() {
            let (x, y, width, height) =
                bake_rect(transform, image.x, image.y, image.width, image.height);
            self.xml.attr_f64("x", x)?;
            self.xml.attr_f64("y", y)?;
            self.xml.attr_f64("width", width)?;
            self.xml.attr_f64("height", height)?;
        } else {
            self.xml.attr_f64("x", image.x)?;
            self.xml.attr_f64("y", image.y)?;
            self.xml.attr_f64("width", image.width)?;
            self.xml.attr_f64("height", image.height)?;
            let matrix = matrix_attr(transform, self.xml.precision());
            self.xml.attr("transform", &matrix)?;
        }

        let href = format!(
            "data:{};base64,{}",
            image.format.mime_type(),
            BASE64.encode(&image.data)
        );
        self.xml.attr("href", &href)?;

        if style.opacity != 1.0 {
            self.xml.attr_f64("opacity", style.opacity)?;
        }
        if style.visibility == Visibility::Hidden {
            self.xml.attr("visibility", "hidden")?;
        }
        self.write_region_refs(style)?;
        self.xml.end_element()
    }

    /// Expand a use-reference inline at the use site.
    ///
    /// The referenced subtree inherits the use node's effective transform and
    /// resolved style, exactly as if it had been authored in place. An id
    /// that is missing or names a non-symbol resource is reported as
    /// unresolved and the node is dropped.
    fn emit_use(
        &mut self,
        id: &str,
        transform: &Transform,
        style: &ResolvedStyle,
    ) -> Result<(), ConvertError> {
        if self.use_stack.iter().any(|active| active == id) {
            self.report(Diagnostic::CyclicReference { id: id.to_string() });
            return Ok(());
        }
        let tree = self.tree;
        match tree.resources.get(id) {
            Some(Resource::Symbol { content }) => {
                self.use_stack.push(id.to_string());
                let result = self.walk(content, transform, style);
                self.use_stack.pop();
                result
            }
            _ => {
                self.report(Diagnostic::UnresolvedReference { id: id.to_string() });
                Ok(())
            }
        }
    }

    // --- defs emission -----------------------------------------------------

    /// Write one resource definition, exactly once per document
    fn emit_resource(&mut self, id: &str) -> Result<(), ConvertError> {
        debug_assert_eq!(self.phase, Phase::Defs);
        if !self.emitted.insert(id.to_string()) {
            return Ok(());
        }
        let tree = self.tree;
        match tree.resources.get(id) {
            Some(Resource::LinearGradient {
                x1,
                y1,
                x2,
                y2,
                stops,
            }) => {
                self.xml.start_element("linearGradient")?;
                self.write_id_value(id)?;
                self.xml.attr_f64("x1", *x1)?;
                self.xml.attr_f64("y1", *y1)?;
                self.xml.attr_f64("x2", *x2)?;
                self.xml.attr_f64("y2", *y2)?;
                self.xml.attr("gradientUnits", "userSpaceOnUse")?;
                self.write_stops(stops)?;
                self.xml.end_element()
            }
            Some(Resource::RadialGradient { cx, cy, r, stops }) => {
                self.xml.start_element("radialGradient")?;
                self.write_id_value(id)?;
                self.xml.attr_f64("cx", *cx)?;
                self.xml.attr_f64("cy", *cy)?;
                self.xml.attr_f64("r", *r)?;
                self.xml.attr("gradientUnits", "userSpaceOnUse")?;
                self.write_stops(stops)?;
                self.xml.end_element()
            }
            Some(Resource::Pattern {
                width,
                height,
                content,
            }) => {
                self.xml.start_element("pattern")?;
                self.write_id_value(id)?;
                self.xml.attr_f64("width", *width)?;
                self.xml.attr_f64("height", *height)?;
                self.xml.attr("patternUnits", "userSpaceOnUse")?;
                self.write_def_content(content)?;
                self.xml.end_element()
            }
            Some(Resource::ClipPath { path }) => {
                self.xml.start_element("clipPath")?;
                self.write_id_value(id)?;
                self.xml.start_element("path")?;
                let d = path_to_d(path, self.xml.precision());
                self.xml.attr("d", &d)?;
                self.xml.end_element()?;
                self.xml.end_element()
            }
            Some(Resource::Mask { content }) => {
                self.xml.start_element("mask")?;
                self.write_id_value(id)?;
                self.write_def_content(content)?;
                self.xml.end_element()
            }
            // Symbols are expanded inline at use sites, never defined here,
            // and the collector skips ids missing from the table
            Some(Resource::Symbol { .. }) | None => Ok(()),
        }
    }

    /// Pattern and mask content lives in its own coordinate space and
    /// resolves from initial style state
    fn write_def_content(&mut self, content: &'a [Node]) -> Result<(), ConvertError> {
        let identity = Transform::identity();
        let initial = ResolvedStyle::initial();
        for node in content {
            self.walk(node, &identity, &initial)?;
        }
        Ok(())
    }

    fn write_stops(&mut self, stops: &[GradientStop]) -> Result<(), ConvertError> {
        for stop in stops {
            self.xml.start_element("stop")?;
            self.xml.attr_f64("offset", stop.offset)?;
            let color = self.clean_attr(&stop.color, "stop-color");
            self.xml.attr("stop-color", &color)?;
            if stop.opacity != 1.0 {
                self.xml.attr_f64("stop-opacity", stop.opacity)?;
            }
            self.xml.end_element()?;
        }
        Ok(())
    }

    // --- attribute helpers -------------------------------------------------

    fn write_id(&mut self, node: &Node) -> Result<(), ConvertError> {
        if let Some(id) = node.id.as_deref() {
            self.write_id_value(id)?;
        }
        Ok(())
    }

    fn write_id_value(&mut self, id: &str) -> Result<(), ConvertError> {
        let id = self.clean_attr(id, "id");
        self.xml.attr("id", &id)
    }

    /// Inline the resolved style as presentation attributes, skipping values
    /// equal to the SVG initial state.
    ///
    /// `scale` is the effective transform's length factor: baking the
    /// transform into coordinates scales the geometry, so the stroke width
    /// must scale with it or the stroke renders thinner than in the source
    /// tree. Under non-uniform scale or skew the factor is the geometric
    /// mean of the axis scales ([`Transform::scale_factor`]), the closest
    /// single width SVG can express.
    fn write_paint_attrs(&mut self, style: &ResolvedStyle, scale: f64) -> Result<(), ConvertError> {
        match &style.fill {
            Paint::Color(color) if color == "black" => {}
            Paint::Color(color) => {
                let color = self.clean_attr(color, "fill");
                self.xml.attr("fill", &color)?;
            }
            Paint::None => self.xml.attr("fill", "none")?,
            Paint::Ref(id) => self.write_url_ref("fill", id)?,
        }
        match &style.stroke {
            Paint::None => {}
            Paint::Color(color) => {
                let color = self.clean_attr(color, "stroke");
                self.xml.attr("stroke", &color)?;
            }
            Paint::Ref(id) => self.write_url_ref("stroke", id)?,
        }
        let stroke_width = style.stroke_width * scale;
        if style.stroke != Paint::None && stroke_width != 1.0 {
            self.xml.attr_f64("stroke-width", stroke_width)?;
        }
        if style.opacity != 1.0 {
            self.xml.attr_f64("opacity", style.opacity)?;
        }
        if style.visibility == Visibility::Hidden {
            self.xml.attr("visibility", "hidden")?;
        }
        Ok(())
    }

    fn write_region_refs(&mut self, style: &ResolvedStyle) -> Result<(), ConvertError> {
        if let Some(id) = &style.clip_path {
            self.write_url_ref("clip-path", id)?;
        }
        if let Some(id) = &style.mask {
            self.write_url_ref("mask", id)?;
        }
        Ok(())
    }

    /// Emit `name="url(#id)"`, or omit the attribute and record a diagnostic
    /// when the id is missing from the resource table
    fn write_url_ref(&mut self, name: &str, id: &str) -> Result<(), ConvertError> {
        if self.tree.resources.contains(id) {
            let value = format!("url(#{})", id);
            self.xml.attr(name, &value)
        } else {
            self.report(Diagnostic::UnresolvedReference { id: id.to_string() });
            Ok(())
        }
    }

    // --- degradation -------------------------------------------------------

    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Attribute values lose any characters XML cannot carry
    fn clean_attr(&mut self, value: &str, context: &str) -> String {
        if contains_invalid_xml(value) {
            self.report(Diagnostic::InvalidCharacters {
                context: context.to_string(),
            });
            strip_invalid_xml(value).into_owned()
        } else {
            value.to_string()
        }
    }

    /// Text content with unescapable characters degrades to the empty string
    fn clean_text(&mut self, content: &str) -> String {
        if contains_invalid_xml(content) {
            self.report(Diagnostic::InvalidCharacters {
                context: "text content".to_string(),
            });
            String::new()
        } else {
            content.to_string()
        }
    }
}

/// Bake an axis-aligned transform into a placement rectangle, normalizing
/// negative scales
fn bake_rect(transform: &Transform, x: f64, y: f64, width: f64, height: f64) -> (f64, f64, f64, f64) {
    let p0 = transform.apply(crate::geom::Point::new(x, y));
    let p1 = transform.apply(crate::geom::Point::new(x + width, y + height));
    (
        p0.x.min(p1.x),
        p0.y.min(p1.y),
        (p1.x - p0.x).abs(),
        (p1.y - p0.y).abs(),
    )
}

fn matrix_attr(transform: &Transform, precision: u8) -> String {
    format!(
        "matrix({} {} {} {} {} {})",
        format_number(transform.a, precision),
        format_number(transform.b, precision),
        format_number(transform.c, precision),
        format_number(transform.d, precision),
        format_number(transform.e, precision),
        format_number(transform.f, precision)
    )
}

/// Render path data as an absolute-command `d` attribute
fn path_to_d(path: &PathData, precision: u8) -> String {
    let mut d = String::new();
    for (index, command) in path.commands.iter().enumerate() {
        if index > 0 {
            d.push(' ');
        }
        match command {
            PathCommand::MoveTo(p) => {
                d.push_str("M ");
                d.push_str(&format_number(p.x, precision));
                d.push(' ');
                d.push_str(&format_number(p.y, precision));
            }
            PathCommand::LineTo(p) => {
                d.push_str("L ");
                d.push_str(&format_number(p.x, precision));
                d.push(' ');
                d.push_str(&format_number(p.y, precision));
            }
            PathCommand::CurveTo(p1, p2, p) => {
                d.push_str("C ");
                for point in [p1, p2, p] {
                    d.push_str(&format_number(point.x, precision));
                    d.push(' ');
                    d.push_str(&format_number(point.y, precision));
                    d.push(' ');
                }
                d.pop();
            }
            PathCommand::Close => d.push('Z'),
        }
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Size;
    use crate::style::StyleOverrides;

    fn small_tree(root: Node) -> Tree {
        Tree::new(Size::new(100.0, 50.0), root)
    }

    fn compact() -> WriteConfig {
        WriteConfig::new().with_pretty_print(false)
    }

    #[test]
    fn test_path_to_d_formatting() {
        let path = PathData::new()
            .move_to(1.0, 2.5)
            .line_to(3.0, 4.0)
            .curve_to(1.0, 1.0, 2.0, 2.0, 3.0, 3.0)
            .close();
        assert_eq!(path_to_d(&path, 8), "M 1 2.5 L 3 4 C 1 1 2 2 3 3 Z");
    }

    #[test]
    fn test_bake_rect_negative_scale() {
        let flip = Transform::from_scale(-1.0, 1.0);
        let (x, y, w, h) = bake_rect(&flip, 10.0, 0.0, 20.0, 5.0);
        assert_eq!((x, y, w, h), (-30.0, 0.0, 20.0, 5.0));
    }

    #[test]
    fn test_matrix_attr() {
        let t = Transform::new(1.0, 0.0, 0.0, 1.0, 10.5, -2.0);
        assert_eq!(matrix_attr(&t, 8), "matrix(1 0 0 1 10.5 -2)");
    }

    #[test]
    fn test_empty_tree_document() {
        let tree = small_tree(Node::group());
        let (xml, diagnostics) = write_document(&tree, &compact()).unwrap();
        assert_eq!(
            xml,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\" height=\"50\" viewBox=\"0 0 100 50\"><defs/></svg>"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_viewport_rejected() {
        let tree = Tree::new(Size::new(0.0, 50.0), Node::group());
        let err = write_document(&tree, &compact()).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidViewport { .. }));

        let tree = Tree::new(Size::new(f64::NAN, 50.0), Node::group());
        assert!(write_document(&tree, &compact()).is_err());
    }

    #[test]
    fn test_empty_anonymous_group_pruned_but_identified_group_kept() {
        let root = Node::group()
            .with_child(Node::group())
            .with_child(Node::group().with_id("anchor"));
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        assert!(xml.contains("<g><g id=\"anchor\"/></g>"));
    }

    #[test]
    fn test_rotated_rect_becomes_path() {
        let root = Node::shape(Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        })
        .with_transform(Transform::from_rotate(45.0));
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        assert!(!xml.contains("<rect"));
        assert!(xml.contains("<path d=\"M 0 0 L "));
    }

    #[test]
    fn test_circle_under_nonuniform_scale_becomes_ellipse() {
        let root = Node::shape(Shape::Circle {
            cx: 0.0,
            cy: 0.0,
            r: 5.0,
        })
        .with_transform(Transform::from_scale(2.0, 1.0));
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        assert!(xml.contains("<ellipse"));
        assert!(xml.contains("rx=\"10\""));
        assert!(xml.contains("ry=\"5\""));
    }

    #[test]
    fn test_hidden_leaf_carries_visibility() {
        let root = Node::shape(Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        })
        .with_style(StyleOverrides::new().with_visibility(Visibility::Hidden));
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        assert!(xml.contains("visibility=\"hidden\""));
    }

    #[test]
    fn test_text_with_rotation_gets_matrix_attribute() {
        let root = Node::text(Text::new(vec![crate::tree::TextRun::new("hi", 5.0, 10.0)]))
            .with_transform(Transform::from_rotate(90.0));
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        assert!(xml.contains("transform=\"matrix("));
        assert!(xml.contains(">hi</text>"));
    }

    #[test]
    fn test_translated_text_bakes_coordinates() {
        let root = Node::text(Text::new(vec![crate::tree::TextRun::new("hi", 5.0, 10.0)]))
            .with_transform(Transform::from_translate(10.0, 10.0));
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        assert!(xml.contains("x=\"15\""));
        assert!(xml.contains("y=\"20\""));
        assert!(!xml.contains("transform="));
    }

    #[test]
    fn test_invalid_text_content_degrades_to_empty() {
        let root = Node::text(Text::new(vec![crate::tree::TextRun::new(
            "bad\u{0}content",
            0.0,
            10.0,
        )]));
        let (xml, diagnostics) = write_document(&small_tree(root), &compact()).unwrap();
        assert!(xml.contains("></text>"));
        assert!(!xml.contains("bad"));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::InvalidCharacters {
                context: "text content".to_string()
            }]
        );
    }

    #[test]
    fn test_output_limit_aborts() {
        let root = Node::shape(Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        });
        let config = compact().with_max_output_bytes(16);
        let err = write_document(&small_tree(root), &config).unwrap_err();
        assert!(matches!(err, ConvertError::OutputLimit { limit: 16 }));
    }

    #[test]
    fn test_transform_composes_through_groups() {
        let leaf = Node::path(PathData::new().move_to(1.0, 0.0).line_to(2.0, 0.0));
        let root = Node::group()
            .with_transform(Transform::from_scale(2.0, 2.0))
            .with_child(
                Node::group()
                    .with_transform(Transform::from_translate(10.0, 0.0))
                    .with_child(leaf),
            );
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        // scale(2) applied after translate(10): (1,0) -> (22,0), (2,0) -> (24,0)
        assert!(xml.contains("d=\"M 22 0 L 24 0\""));
    }

    #[test]
    fn test_stroke_width_scales_with_baked_transform() {
        let leaf = Node::path(PathData::new().move_to(0.0, 0.0).line_to(10.0, 0.0)).with_style(
            StyleOverrides::new()
                .with_fill(Paint::None)
                .with_stroke(Paint::color("red"))
                .with_stroke_width(3.0),
        );
        let root = Node::group()
            .with_transform(Transform::from_scale(2.0, 2.0))
            .with_child(leaf);
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        // Geometry doubled, so the stroke doubles with it
        assert!(xml.contains("d=\"M 0 0 L 20 0\""));
        assert!(xml.contains("stroke-width=\"6\""), "got: {}", xml);
    }

    #[test]
    fn test_stroke_width_under_nonuniform_scale_uses_mean_factor() {
        let root = Node::shape(Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        })
        .with_transform(Transform::from_scale(2.0, 8.0))
        .with_style(
            StyleOverrides::new()
                .with_stroke(Paint::color("blue"))
                .with_stroke_width(3.0),
        );
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        // sqrt(2 * 8) = 4
        assert!(xml.contains("stroke-width=\"12\""), "got: {}", xml);
    }

    #[test]
    fn test_stroke_width_not_scaled_when_matrix_attribute_carries_it() {
        let root = Node::text(Text::new(vec![crate::tree::TextRun::new("hi", 0.0, 0.0)]))
            .with_transform(Transform::from_scale(2.0, 2.0))
            .with_style(
                StyleOverrides::new()
                    .with_stroke(Paint::color("red"))
                    .with_stroke_width(3.0),
            );
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        assert!(xml.contains("transform=\"matrix(2 0 0 2 0 0)\""));
        assert!(xml.contains("stroke-width=\"3\""), "got: {}", xml);
    }

    #[test]
    fn test_radial_gradient_definition() {
        let radial = Resource::RadialGradient {
            cx: 5.0,
            cy: 5.0,
            r: 4.0,
            stops: vec![
                GradientStop::new(0.0, "white"),
                GradientStop::new(1.0, "black").with_opacity(0.5),
            ],
        };
        let root = Node::shape(Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        })
        .with_style(StyleOverrides::new().with_fill(Paint::reference("rg")));
        let tree = small_tree(root)
            .with_resources(crate::resources::ResourceTable::new().with("rg", radial));
        let (xml, diagnostics) = write_document(&tree, &compact()).unwrap();
        assert!(xml.contains(
            "<radialGradient id=\"rg\" cx=\"5\" cy=\"5\" r=\"4\" gradientUnits=\"userSpaceOnUse\">\
             <stop offset=\"0\" stop-color=\"white\"/>\
             <stop offset=\"1\" stop-color=\"black\" stop-opacity=\"0.5\"/>\
             </radialGradient>"
        ));
        assert!(xml.contains("fill=\"url(#rg)\""));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_use_of_non_symbol_resource_reported_unresolved() {
        let gradient = Resource::LinearGradient {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 0.0,
            stops: vec![GradientStop::new(0.0, "red")],
        };
        let root = Node::use_ref("g1");
        let tree = small_tree(root)
            .with_resources(crate::resources::ResourceTable::new().with("g1", gradient));
        let (xml, diagnostics) = write_document(&tree, &compact()).unwrap();
        // The node is dropped; nothing references the gradient either
        assert!(xml.contains("<defs/>"));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnresolvedReference {
                id: "g1".to_string()
            }]
        );
    }

    #[test]
    fn test_use_expansion_applies_use_transform() {
        let symbol = Resource::Symbol {
            content: Node::shape(Shape::Rect {
                x: 0.0,
                y: 0.0,
                width: 4.0,
                height: 4.0,
            }),
        };
        let root = Node::group()
            .with_child(Node::use_ref("icon").with_transform(Transform::from_translate(10.0, 0.0)))
            .with_child(Node::use_ref("icon").with_transform(Transform::from_translate(20.0, 0.0)));
        let tree = small_tree(root)
            .with_resources(crate::resources::ResourceTable::new().with("icon", symbol));
        let (xml, diagnostics) = write_document(&tree, &compact()).unwrap();
        assert!(xml.contains("x=\"10\""));
        assert!(xml.contains("x=\"20\""));
        // Inlined at both sites; nothing lands in defs
        assert!(xml.contains("<defs/>"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_cyclic_use_reported() {
        let symbol = Resource::Symbol {
            content: Node::group().with_child(Node::use_ref("loop")),
        };
        let root = Node::use_ref("loop");
        let tree = small_tree(root)
            .with_resources(crate::resources::ResourceTable::new().with("loop", symbol));
        let (_, diagnostics) = write_document(&tree, &compact()).unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::CyclicReference {
                id: "loop".to_string()
            }]
        );
    }

    #[test]
    fn test_image_href_is_base64_data_uri() {
        let root = Node::image(Image {
            x: 0.0,
            y: 0.0,
            width: 2.0,
            height: 2.0,
            format: crate::tree::ImageFormat::Png,
            data: vec![1, 2, 3],
        });
        let (xml, _) = write_document(&small_tree(root), &compact()).unwrap();
        assert!(xml.contains("href=\"data:image/png;base64,AQID\""));
    }

    #[test]
    fn test_clip_path_on_group() {
        let clip = Resource::ClipPath {
            path: PathData::new().move_to(0.0, 0.0).line_to(5.0, 0.0).close(),
        };
        let root = Node::group()
            .with_style(StyleOverrides::new().with_clip_path("c1"))
            .with_child(Node::shape(Shape::Rect {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            }));
        let tree = small_tree(root)
            .with_resources(crate::resources::ResourceTable::new().with("c1", clip));
        let (xml, _) = write_document(&tree, &compact()).unwrap();
        assert!(xml.contains("<clipPath id=\"c1\"><path d=\"M 0 0 L 5 0 Z\"/></clipPath>"));
        assert!(xml.contains("<g clip-path=\"url(#c1)\">"));
    }
}
