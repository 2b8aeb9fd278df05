//! Geometry primitives and the transform accumulator.
//!
//! All coordinates follow the SVG convention: Y axis pointing down, angles
//! clockwise positive.

/// A 2D point in document coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Viewport dimensions of a tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A size is usable when both dimensions are finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A 2D affine transform in SVG matrix form.
///
/// The six components map a point as:
///
/// ```text
/// x' = a·x + c·y + e
/// y' = b·x + d·y + f
/// ```
///
/// Composition order matches SVG nesting: the effective transform of a node
/// is `parent.pre_concat(node_local)`, i.e. the local transform is applied
/// first, then the parent's. Degenerate transforms (zero determinant) are
/// carried through unchanged rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    /// The identity transform
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Construct from the six SVG matrix components
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// A pure translation
    pub fn from_translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A pure scale about the origin
    pub fn from_scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A clockwise rotation about the origin, in degrees
    pub fn from_rotate(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        let cos_a = radians.cos();
        let sin_a = radians.sin();
        Self::new(cos_a, sin_a, -sin_a, cos_a, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// True when the transform is a pure translation
    pub fn is_translate(&self) -> bool {
        self.a == 1.0 && self.b == 0.0 && self.c == 0.0 && self.d == 1.0
    }

    /// True when the transform has no rotation or skew component.
    ///
    /// Axis-aligned transforms keep shape primitives representable as native
    /// elements; anything else forces a path conversion.
    pub fn is_axis_aligned(&self) -> bool {
        self.b == 0.0 && self.c == 0.0
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// The factor this transform applies to lengths, as the geometric mean
    /// of the two axis scales. Exact for uniform scale and rotation; an
    /// approximation under non-uniform scale or skew, where no single factor
    /// exists.
    pub fn scale_factor(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// Compose with `other` applied before `self`
    pub fn pre_concat(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Map a point through the transform
    pub fn apply(&self, point: Point) -> Point {
        Point {
            x: self.a * point.x + self.c * point.y + self.e,
            y: self.b * point.x + self.d * point.y + self.f,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// A single absolute path command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic bézier: two control points, then the end point
    CurveTo(Point, Point, Point),
    Close,
}

/// Absolute-command path geometry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    pub commands: Vec<PathCommand>,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        self.commands.push(PathCommand::MoveTo(Point::new(x, y)));
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        self.commands.push(PathCommand::LineTo(Point::new(x, y)));
        self
    }

    pub fn curve_to(mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> Self {
        self.commands.push(PathCommand::CurveTo(
            Point::new(x1, y1),
            Point::new(x2, y2),
            Point::new(x, y),
        ));
        self
    }

    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Map every coordinate (control points included) through `transform`.
    ///
    /// Affine maps preserve bézier structure, so transforming the control
    /// polygon transforms the curve exactly.
    pub fn transform(&self, transform: &Transform) -> PathData {
        if transform.is_identity() {
            return self.clone();
        }
        let commands = self
            .commands
            .iter()
            .map(|cmd| match cmd {
                PathCommand::MoveTo(p) => PathCommand::MoveTo(transform.apply(*p)),
                PathCommand::LineTo(p) => PathCommand::LineTo(transform.apply(*p)),
                PathCommand::CurveTo(p1, p2, p) => PathCommand::CurveTo(
                    transform.apply(*p1),
                    transform.apply(*p2),
                    transform.apply(*p),
                ),
                PathCommand::Close => PathCommand::Close,
            })
            .collect();
        PathData { commands }
    }
}

/// Circle-to-bézier approximation constant
const KAPPA: f64 = 0.552_284_749_830_793_6;

/// Closed set of shape primitives carried by shape nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
}

impl Shape {
    /// Convert the primitive to path data in its own coordinate space.
    ///
    /// Rectangles become a four-segment closed polygon; circles and ellipses
    /// become four cubic bézier quadrants using the kappa approximation.
    pub fn to_path(&self) -> PathData {
        match *self {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => PathData::new()
                .move_to(x, y)
                .line_to(x + width, y)
                .line_to(x + width, y + height)
                .line_to(x, y + height)
                .close(),
            Shape::Circle { cx, cy, r } => ellipse_path(cx, cy, r, r),
            Shape::Ellipse { cx, cy, rx, ry } => ellipse_path(cx, cy, rx, ry),
        }
    }
}

fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64) -> PathData {
    let kx = rx * KAPPA;
    let ky = ry * KAPPA;
    PathData::new()
        .move_to(cx + rx, cy)
        .curve_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry)
        .curve_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy)
        .curve_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry)
        .curve_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy)
        .close()
}
