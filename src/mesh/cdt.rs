use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;

use spade::handles::FixedVertexHandle;
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};
use tracing::debug;

use crate::domain::Domain;
use crate::error::{MeshError, Result};
use crate::geometry::{Curve, RegionTag};
use crate::math::polygon_2d::{point_in_polygon_2d, triangle_centroid, triangle_quality};
use crate::math::Point2;
use crate::model::{EdgeCurve, GeometricModel, ShapeId, ShapeKind};

use super::kernel::{KernelOptions, KernelOutput, MeshAlgorithm, MeshingKernel};
use super::{Element, ElementKind, Mesh, MeshSizePolicy, PhysicalGroup};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Points at which the size field is probed along a curve.
const SIZE_PROBES: usize = 32;

/// Triangles below this shape quality are reported as slivers.
const SLIVER_QUALITY: f64 = 0.01;

/// Meshing kernel built on spade's constrained Delaunay triangulation.
///
/// Every curve of the domain is discretised once and inserted as a chain of
/// constraint edges, so surfaces sharing a curve get conforming meshes.
/// Triangles are assigned to surfaces by centroid containment.
#[derive(Debug, Clone, Default)]
pub struct CdtKernel {
    options: KernelOptions,
}

impl CdtKernel {
    /// Creates a kernel with the given options.
    #[must_use]
    pub fn new(options: KernelOptions) -> Self {
        Self { options }
    }
}

impl MeshingKernel for CdtKernel {
    #[allow(clippy::too_many_lines)]
    fn mesh(&self, domain: &Domain, policy: &MeshSizePolicy) -> Result<KernelOutput> {
        policy.validate()?;
        let model = domain.model();
        let field = SizeField::new(model, policy)?;
        let mut log = Vec::new();

        let mut curves: Vec<ShapeId> = Vec::new();
        for &s in domain.surfaces() {
            for c in model.surface(s)?.curve_ids() {
                if !curves.contains(&c) {
                    curves.push(c);
                }
            }
        }

        log.push("Info    : Meshing 1D...".to_owned());
        let mut cdt = Cdt::new();
        let mut chains: HashMap<ShapeId, Vec<FixedVertexHandle>> = HashMap::new();
        for (i, &id) in curves.iter().enumerate() {
            let curve = model.curve(id)?;
            let n = segment_count(curve, &field, policy);
            log.push(format!(
                "Info    : Meshing curve {} ({}) with {n} segments",
                i + 1,
                curve_kind_name(curve)
            ));
            let mut points = curve.as_curve().sample(n);
            let closed = curve.as_curve().is_closed();
            if closed {
                points.pop();
            }
            let mut chain = Vec::with_capacity(points.len() + 1);
            for p in &points {
                chain.push(insert(&mut cdt, p)?);
            }
            if closed {
                if let Some(&first) = chain.first() {
                    chain.push(first);
                }
            }
            for pair in chain.windows(2) {
                add_constraint(&mut cdt, pair[0], pair[1])?;
            }
            chains.insert(id, chain);
        }

        let regions = domain
            .surfaces()
            .iter()
            .map(|&s| SurfacePolygons::new(model, s, &chains, &cdt))
            .collect::<Result<Vec<_>>>()?;

        log.push("Info    : Meshing 2D...".to_owned());
        if self.options.algorithm == MeshAlgorithm::ConstrainedDelaunay {
            refine(&mut cdt, &regions, &field, &self.options, &mut log)?;
        }

        let mut triangles: Vec<(usize, [FixedVertexHandle; 3])> = Vec::new();
        for face in cdt.inner_faces() {
            let [a, b, c] = face.vertices();
            let g = triangle_centroid(
                &to_point(&a.position()),
                &to_point(&b.position()),
                &to_point(&c.position()),
            );
            if let Some(k) = regions.iter().position(|r| r.contains(&g)) {
                triangles.push((k, [a.fix(), b.fix(), c.fix()]));
            }
        }

        for (k, &s) in domain.surfaces().iter().enumerate() {
            let count = triangles.iter().filter(|(owner, _)| *owner == k).count();
            log.push(format!(
                "Info    : Meshing surface {} (Plane, {:?}): {count} triangles",
                k + 1,
                self.options.algorithm
            ));
            if count == 0 {
                debug!(surface = ?s, "surface received no triangles");
                log.push(format!("Error   : No elements in surface {}", k + 1));
            }
            let slivers = triangles
                .iter()
                .filter(|(owner, tri)| {
                    let [a, b, c] = tri.map(|v| to_point(&cdt.vertex(v).position()));
                    *owner == k && triangle_quality(&a, &b, &c) < SLIVER_QUALITY
                })
                .count();
            if slivers > 0 {
                log.push(format!(
                    "Warning : {slivers} triangles of surface {} have quality below {SLIVER_QUALITY}; \
                     look for boundary gaps narrower than the minimum element size",
                    k + 1
                ));
            }
        }

        let groups = physical_groups(model, domain.surfaces(), &curves)?;
        let group_id = |tag: Option<RegionTag>| {
            tag.and_then(|t| groups.get(&t).copied()).unwrap_or(0)
        };

        let mut node_of: HashMap<FixedVertexHandle, usize> = HashMap::new();
        let mut mesh = Mesh::default();
        let mut node = |handle: FixedVertexHandle, mesh: &mut Mesh| -> usize {
            *node_of.entry(handle).or_insert_with(|| {
                let p = cdt.vertex(handle).position();
                mesh.nodes.push(to_point(&p));
                mesh.nodes.len() - 1
            })
        };

        for (i, &id) in curves.iter().enumerate() {
            let tag = model.shape(id)?.region.filter(|t| t.is_boundary());
            if tag.is_none() {
                continue;
            }
            let Some(chain) = chains.get(&id) else {
                continue;
            };
            for pair in chain.windows(2) {
                let nodes = vec![node(pair[0], &mut mesh), node(pair[1], &mut mesh)];
                mesh.elements.push(Element {
                    kind: ElementKind::Line,
                    physical: group_id(tag),
                    entity: entity_id(i),
                    nodes,
                });
            }
        }
        for (k, tri) in &triangles {
            let tag = model.shape(domain.surfaces()[*k])?.region;
            let nodes = tri.iter().map(|&v| node(v, &mut mesh)).collect();
            mesh.elements.push(Element {
                kind: ElementKind::Triangle,
                physical: group_id(tag),
                entity: entity_id(*k),
                nodes,
            });
        }

        mesh.physical_groups = groups
            .iter()
            .map(|(tag, &id)| PhysicalGroup {
                dim: tag.dim(),
                id,
                name: tag.name().to_owned(),
            })
            .collect();

        log.push("Info    : Done meshing 2D".to_owned());
        log.push(format!(
            "Info    : {} nodes {} elements",
            mesh.nodes.len(),
            mesh.elements.len()
        ));
        Ok(KernelOutput { mesh, log })
    }
}

/// Inserts centroids of oversized triangles until the size field is met.
///
/// Only non-constraint edges count towards a triangle's size: constraint
/// edges are fixed by the boundary discretisation.
fn refine(
    cdt: &mut Cdt,
    regions: &[SurfacePolygons],
    field: &SizeField,
    options: &KernelOptions,
    log: &mut Vec<String>,
) -> Result<()> {
    for pass in 0..options.max_passes {
        let mut pending = Vec::new();
        for face in cdt.inner_faces() {
            let [a, b, c] = face.vertices();
            let g = triangle_centroid(
                &to_point(&a.position()),
                &to_point(&b.position()),
                &to_point(&c.position()),
            );
            if !regions.iter().any(|r| r.contains(&g)) {
                continue;
            }
            let longest = face
                .adjacent_edges()
                .iter()
                .filter(|e| !cdt.is_constraint_edge(e.as_undirected().fix()))
                .map(|e| {
                    let (p, q) = (e.from().position(), e.to().position());
                    (q.x - p.x).hypot(q.y - p.y)
                })
                .fold(0.0_f64, f64::max);
            if longest > field.size_at(&g) {
                pending.push(g);
            }
        }
        if pending.is_empty() {
            debug!(pass, vertices = cdt.num_vertices(), "refinement converged");
            return Ok(());
        }
        let room = options.max_nodes.saturating_sub(cdt.num_vertices());
        if pending.len() > room {
            pending.truncate(room);
            for g in &pending {
                insert(cdt, g)?;
            }
            log.push(format!(
                "Warning : Node limit {} reached during refinement",
                options.max_nodes
            ));
            return Ok(());
        }
        for g in &pending {
            insert(cdt, g)?;
        }
    }
    log.push(format!(
        "Warning : Refinement stopped after {} passes",
        options.max_passes
    ));
    Ok(())
}

/// Polygons of a surface's loops, taken from the discretised curves.
struct SurfacePolygons {
    outer: Vec<Point2>,
    holes: Vec<Vec<Point2>>,
}

impl SurfacePolygons {
    fn new(
        model: &GeometricModel,
        surface: ShapeId,
        chains: &HashMap<ShapeId, Vec<FixedVertexHandle>>,
        cdt: &Cdt,
    ) -> Result<Self> {
        let data = model.surface(surface)?;
        let polygon = |curve_loop: &[ShapeId]| -> Result<Vec<Point2>> {
            let mut parts = Vec::with_capacity(curve_loop.len());
            for id in curve_loop {
                let chain = chains.get(id).ok_or_else(|| {
                    MeshError::Triangulation("surface references an undiscretised curve".into())
                })?;
                parts.push(
                    chain
                        .iter()
                        .map(|&h| to_point(&cdt.vertex(h).position()))
                        .collect::<Vec<_>>(),
                );
            }
            Ok(join_chains(parts))
        };
        Ok(Self {
            outer: polygon(&data.outer)?,
            holes: data
                .holes
                .iter()
                .map(|h| polygon(h.as_slice()))
                .collect::<Result<Vec<_>>>()?,
        })
    }

    fn contains(&self, p: &Point2) -> bool {
        point_in_polygon_2d(p, &self.outer) && !self.holes.iter().any(|h| point_in_polygon_2d(p, h))
    }
}

/// Concatenates point chains into one loop, flipping chains that are
/// traversed against the loop direction.
fn join_chains(mut parts: Vec<Vec<Point2>>) -> Vec<Point2> {
    if parts.len() > 1 {
        let next_ends = [parts[1][0], parts[1][parts[1].len() - 1]];
        let first = &parts[0];
        let gap = |p: &Point2| next_ends.iter().map(|q| (q - p).norm()).fold(f64::INFINITY, f64::min);
        if gap(&first[0]) < gap(&first[first.len() - 1]) {
            parts[0].reverse();
        }
    }
    let mut polygon: Vec<Point2> = Vec::new();
    for mut part in parts {
        if let (Some(last), Some(head), Some(tail)) = (polygon.last(), part.first(), part.last()) {
            if (tail - last).norm() < (head - last).norm() {
                part.reverse();
            }
        }
        polygon.extend(part);
    }
    polygon
}

/// Element size field built from local steps requested on shapes.
struct SizeField<'a> {
    policy: &'a MeshSizePolicy,
    sources: Vec<SizeSource>,
}

struct SizeSource {
    curves: Vec<EdgeCurve>,
    /// Outer and hole polygons when the source is a surface.
    area: Option<(Vec<Point2>, Vec<Vec<Point2>>)>,
    step: f64,
}

impl SizeSource {
    fn distance(&self, p: &Point2) -> f64 {
        if let Some((outer, holes)) = &self.area {
            if point_in_polygon_2d(p, outer) && !holes.iter().any(|h| point_in_polygon_2d(p, h)) {
                return 0.0;
            }
        }
        self.curves
            .iter()
            .map(|c| c.as_curve().distance_to(p))
            .fold(f64::INFINITY, f64::min)
    }
}

impl<'a> SizeField<'a> {
    fn new(model: &GeometricModel, policy: &'a MeshSizePolicy) -> Result<Self> {
        let mut sources = Vec::new();
        if policy.from_points {
            for (_, shape) in model.iter() {
                let opening = matches!(
                    shape.region,
                    Some(RegionTag::Opening | RegionTag::OpeningBoundary)
                );
                let Some(step) = shape
                    .mesh_step
                    .or(if opening { policy.opening_step } else { None })
                else {
                    continue;
                };
                let source = match &shape.kind {
                    ShapeKind::Curve(curve) => SizeSource {
                        curves: vec![curve.clone()],
                        area: None,
                        step,
                    },
                    ShapeKind::Surface(surface) => {
                        let curves = surface
                            .curve_ids()
                            .map(|c| model.curve(c).cloned())
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        let holes = surface
                            .holes
                            .iter()
                            .map(|h| model.loop_polygon(h))
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        SizeSource {
                            curves,
                            area: Some((model.loop_polygon(&surface.outer)?, holes)),
                            step,
                        }
                    }
                };
                sources.push(source);
            }
        }
        Ok(Self { policy, sources })
    }

    /// Target element size at `p`.
    fn size_at(&self, p: &Point2) -> f64 {
        let requested = self
            .sources
            .iter()
            .map(|s| s.step + self.policy.boundary_growth * s.distance(p))
            .fold(self.policy.max_size, f64::min);
        self.policy.clamp(requested)
    }
}

/// Number of segments a curve is split into.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn segment_count(curve: &EdgeCurve, field: &SizeField, policy: &MeshSizePolicy) -> usize {
    let c = curve.as_curve();
    let h = (0..=SIZE_PROBES)
        .map(|i| field.size_at(&c.evaluate(i as f64 / SIZE_PROBES as f64)))
        .fold(f64::INFINITY, f64::min);
    let mut n = (c.length() / h).ceil() as usize;
    n = n.max(policy.min_curve_points - 1);
    if policy.from_curvature {
        if let EdgeCurve::EllipticArc(arc) = curve {
            let turn = arc.sweep().abs() / TAU;
            n = n.max((policy.min_circle_points as f64 * turn).ceil() as usize);
        }
    }
    if c.is_closed() {
        n = n.max(3);
    }
    n.max(1)
}

/// Physical group ids, numbered in region-tag order.
fn physical_groups(
    model: &GeometricModel,
    surfaces: &[ShapeId],
    curves: &[ShapeId],
) -> Result<BTreeMap<RegionTag, u32>> {
    let mut tags = BTreeMap::new();
    for &id in surfaces.iter().chain(curves) {
        if let Some(tag) = model.shape(id)?.region {
            if tag.is_boundary() == curves.contains(&id) {
                tags.insert(tag, 0);
            }
        }
    }
    for (next, id) in (1..).zip(tags.values_mut()) {
        *id = next;
    }
    Ok(tags)
}

fn curve_kind_name(curve: &EdgeCurve) -> &'static str {
    match curve {
        EdgeCurve::Segment(_) => "Line",
        EdgeCurve::EllipticArc(_) => "Ellipse",
    }
}

#[allow(clippy::cast_possible_truncation)]
fn entity_id(index: usize) -> u32 {
    index as u32 + 1
}

fn to_point(p: &SpadePoint2<f64>) -> Point2 {
    Point2::new(p.x, p.y)
}

fn insert(cdt: &mut Cdt, p: &Point2) -> Result<FixedVertexHandle> {
    cdt.insert(SpadePoint2::new(p.x, p.y))
        .map_err(|e: InsertionError| MeshError::Triangulation(format!("CDT insert: {e}")).into())
}

fn add_constraint(cdt: &mut Cdt, from: FixedVertexHandle, to: FixedVertexHandle) -> Result<()> {
    if from == to {
        return Ok(());
    }
    if !cdt.can_add_constraint(from, to) {
        return Err(MeshError::Triangulation(
            "boundary discretisation intersects itself".into(),
        )
        .into());
    }
    cdt.add_constraint(from, to);
    Ok(())
}
