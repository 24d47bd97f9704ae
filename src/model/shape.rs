use crate::geometry::{Curve, EllipticArc, RegionTag, Segment};

slotmap::new_key_type! {
    /// Unique identifier for a shape in the geometric model.
    pub struct ShapeId;
}

/// The geometric curve carried by a curve shape.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeCurve {
    /// A straight segment.
    Segment(Segment),
    /// An elliptic arc or full ellipse.
    EllipticArc(EllipticArc),
}

impl EdgeCurve {
    /// Returns the curve behind the enum.
    #[must_use]
    pub fn as_curve(&self) -> &dyn Curve {
        match self {
            EdgeCurve::Segment(s) => s,
            EdgeCurve::EllipticArc(a) => a,
        }
    }

    /// Returns the mutable curve behind the enum.
    pub fn as_curve_mut(&mut self) -> &mut dyn Curve {
        match self {
            EdgeCurve::Segment(s) => s,
            EdgeCurve::EllipticArc(a) => a,
        }
    }

    /// Number of segments used when a loop containing this curve is turned
    /// into a polygon for classification.
    #[must_use]
    pub fn polygon_segments(&self) -> usize {
        match self {
            EdgeCurve::Segment(_) => 1,
            EdgeCurve::EllipticArc(_) => 64,
        }
    }
}

/// A planar surface bounded by an outer loop and optional hole loops.
///
/// Each loop lists curve shapes traversed head to tail.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceData {
    /// The outer boundary loop.
    pub outer: Vec<ShapeId>,
    /// Hole loops.
    pub holes: Vec<Vec<ShapeId>>,
}

impl SurfaceData {
    /// Iterates over every loop, outer first.
    pub fn loops(&self) -> impl Iterator<Item = &Vec<ShapeId>> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    /// Iterates over every curve id referenced by the surface.
    pub fn curve_ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.loops().flat_map(|l| l.iter().copied())
    }

    /// Replaces every reference to `from` by `to`.
    pub fn replace_curve(&mut self, from: ShapeId, to: ShapeId) {
        for id in self
            .outer
            .iter_mut()
            .chain(self.holes.iter_mut().flat_map(|h| h.iter_mut()))
        {
            if *id == from {
                *id = to;
            }
        }
    }
}

/// The geometry of a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Curve(EdgeCurve),
    Surface(SurfaceData),
}

/// Data associated with a shape of the geometric model.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeData {
    /// The geometry.
    pub kind: ShapeKind,
    /// Region the shape belongs to, if tagged.
    pub region: Option<RegionTag>,
    /// Local element size requested for this shape.
    pub mesh_step: Option<f64>,
}

impl ShapeData {
    /// Creates an untagged shape.
    #[must_use]
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            region: None,
            mesh_step: None,
        }
    }
}
