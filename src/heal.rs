//! Post-generation mesh repair.
//!
//! Nodes closer than a tolerance are merged onto the lowest-index node of
//! their cluster, elements that collapse are dropped, triangles of poor
//! shape are discarded and unused nodes are removed. Healing a healed mesh
//! with the same tolerances changes nothing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigError, FlowMcError, Result};
use crate::math::Point2;
use crate::mesh::{msh, ElementKind, Mesh};

pub use crate::math::polygon_2d::triangle_quality;

/// Number of histogram bins of the quality statistics.
const QUALITY_BINS: usize = 10;

/// Tolerances of the healer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealConfig {
    /// Nodes closer than this are merged.
    pub node_tol: f64,
    /// Triangles with shape quality below this are discarded.
    pub quality_tol: f64,
}

impl Default for HealConfig {
    fn default() -> Self {
        Self {
            node_tol: 1e-4,
            quality_tol: 0.01,
        }
    }
}

impl HealConfig {
    /// Checks the tolerances.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a negative or non-finite
    /// tolerance, or a quality tolerance above one.
    pub fn validate(&self) -> Result<()> {
        if !(self.node_tol >= 0.0 && self.node_tol.is_finite()) {
            return Err(ConfigError::Invalid(format!("node_tol = {}", self.node_tol)).into());
        }
        if !(0.0..=1.0).contains(&self.quality_tol) {
            return Err(ConfigError::Invalid(format!("quality_tol = {}", self.quality_tol)).into());
        }
        Ok(())
    }
}

/// Shape-quality statistics of the triangles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityStats {
    pub bad_el_tol: f64,
    /// One-based ids (in input order) of the discarded elements.
    pub bad_elements: Vec<usize>,
    /// Bin edges over `[0, 1]`.
    pub bins: Vec<f64>,
    pub hist: Vec<usize>,
}

/// What a healing pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealStats {
    pub node_tol: f64,
    pub merged_nodes: usize,
    pub degenerate_elements: usize,
    pub removed_nodes: usize,
    pub gamma_stats: QualityStats,
}

impl HealStats {
    /// Number of elements discarded for poor quality.
    #[must_use]
    pub fn discarded(&self) -> usize {
        self.gamma_stats.bad_elements.len()
    }

    /// Returns `true` if the pass left the mesh untouched.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.merged_nodes == 0
            && self.degenerate_elements == 0
            && self.removed_nodes == 0
            && self.discarded() == 0
    }
}

/// A mesh file loaded for healing.
#[derive(Debug)]
pub struct HealMesh {
    source: PathBuf,
    mesh: Mesh,
    config: HealConfig,
    stats: Option<HealStats>,
}

impl HealMesh {
    /// Reads the raw mesh at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerances are invalid or the file cannot be
    /// read or parsed.
    pub fn read_mesh(path: &Path, config: HealConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source: path.to_path_buf(),
            mesh: msh::read_msh(path)?,
            config,
            stats: None,
        })
    }

    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Statistics of the last healing pass.
    #[must_use]
    pub fn stats(&self) -> Option<&HealStats> {
        self.stats.as_ref()
    }

    /// Heals the loaded mesh in place.
    pub fn heal_mesh(&mut self) -> &HealStats {
        let stats = heal(&mut self.mesh, &self.config);
        info!(
            merged = stats.merged_nodes,
            degenerate = stats.degenerate_elements,
            discarded = stats.discarded(),
            removed_nodes = stats.removed_nodes,
            "mesh healed"
        );
        if stats.discarded() > 0 {
            warn!(count = stats.discarded(), "discarded badly shaped elements");
        }
        self.stats.insert(stats)
    }

    /// `<stem>_healed.msh` next to the source file.
    #[must_use]
    pub fn healed_mesh_name(&self) -> PathBuf {
        sibling(&self.source, "_healed.msh")
    }

    /// `<stem>_heal_stats.yaml` next to the source file.
    #[must_use]
    pub fn stats_name(&self) -> PathBuf {
        sibling(&self.source, "_heal_stats.yaml")
    }

    /// Writes the statistics of the last pass as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn stats_to_yaml(&self, path: &Path) -> Result<()> {
        let stats = self.stats.clone().unwrap_or_default();
        let text =
            serde_yaml::to_string(&stats).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| FlowMcError::io(path, e))
    }

    /// Writes the healed mesh to [`Self::healed_mesh_name`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn write(&self) -> Result<PathBuf> {
        let path = self.healed_mesh_name();
        msh::write_msh(&self.mesh, &path)?;
        Ok(path)
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}

/// Heals `raw_mesh_file`, writing `<stem>_healed.msh` and
/// `<stem>_heal_stats.yaml` beside it.
///
/// # Errors
///
/// Returns an error if the mesh cannot be read or the outputs written.
pub fn heal_file(raw_mesh_file: &Path, config: HealConfig) -> Result<(PathBuf, HealStats)> {
    let mut hm = HealMesh::read_mesh(raw_mesh_file, config)?;
    let stats = hm.heal_mesh().clone();
    hm.stats_to_yaml(&hm.stats_name())?;
    let healed = hm.write()?;
    Ok((healed, stats))
}

/// Heals a mesh in place and reports what changed.
pub fn heal(mesh: &mut Mesh, config: &HealConfig) -> HealStats {
    let mut stats = HealStats {
        node_tol: config.node_tol,
        ..HealStats::default()
    };

    let roots = merge_nodes(&mesh.nodes, config.node_tol);
    stats.merged_nodes = roots.iter().enumerate().filter(|(i, r)| i != *r).count();

    let mut qualities = Vec::new();
    let mut bad = Vec::new();
    let mut kept = Vec::with_capacity(mesh.elements.len());
    for (i, mut element) in std::mem::take(&mut mesh.elements).into_iter().enumerate() {
        for n in &mut element.nodes {
            *n = roots[*n];
        }
        if has_repeated_node(&element.nodes) {
            stats.degenerate_elements += 1;
            continue;
        }
        if element.kind == ElementKind::Triangle {
            let gamma = triangle_quality(
                &mesh.nodes[element.nodes[0]],
                &mesh.nodes[element.nodes[1]],
                &mesh.nodes[element.nodes[2]],
            );
            qualities.push(gamma);
            if gamma < config.quality_tol {
                bad.push(i + 1);
                continue;
            }
        }
        kept.push(element);
    }
    mesh.elements = kept;

    stats.removed_nodes = remove_unused_nodes(mesh);
    let (bins, hist) = histogram(&qualities);
    stats.gamma_stats = QualityStats {
        bad_el_tol: config.quality_tol,
        bad_elements: bad,
        bins,
        hist,
    };
    stats
}

/// Clusters nodes closer than `tol`; returns each node's representative,
/// the lowest index of its cluster.
#[allow(clippy::cast_possible_truncation)]
fn merge_nodes(nodes: &[Point2], tol: f64) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..nodes.len()).collect();
    if tol <= 0.0 {
        return parent;
    }
    let cell = |p: &Point2| ((p.x / tol).floor() as i64, (p.y / tol).floor() as i64);
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, p) in nodes.iter().enumerate() {
        let (cx, cy) = cell(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &j in bucket {
                    if (nodes[j] - p).norm() < tol {
                        union(&mut parent, i, j);
                    }
                }
            }
        }
        grid.entry((cx, cy)).or_default().push(i);
    }
    (0..nodes.len()).map(|i| find(&mut parent, i)).collect()
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

fn has_repeated_node(nodes: &[usize]) -> bool {
    nodes
        .iter()
        .enumerate()
        .any(|(i, n)| nodes[i + 1..].contains(n))
}

/// Drops nodes no element references, keeping the order of the rest.
fn remove_unused_nodes(mesh: &mut Mesh) -> usize {
    let mut used = vec![false; mesh.nodes.len()];
    for e in &mesh.elements {
        for &n in &e.nodes {
            used[n] = true;
        }
    }
    let mut new_index = vec![usize::MAX; mesh.nodes.len()];
    let mut nodes = Vec::with_capacity(mesh.nodes.len());
    for (i, p) in mesh.nodes.iter().enumerate() {
        if used[i] {
            new_index[i] = nodes.len();
            nodes.push(*p);
        }
    }
    let removed = mesh.nodes.len() - nodes.len();
    mesh.nodes = nodes;
    for e in &mut mesh.elements {
        for n in &mut e.nodes {
            *n = new_index[*n];
        }
    }
    removed
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn histogram(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let bins = (0..=QUALITY_BINS)
        .map(|i| i as f64 / QUALITY_BINS as f64)
        .collect();
    let mut hist = vec![0; QUALITY_BINS];
    for &v in values {
        let k = ((v * QUALITY_BINS as f64) as usize).min(QUALITY_BINS - 1);
        hist[k] += 1;
    }
    (bins, hist)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::mesh::{Element, PhysicalGroup};

    fn tri(nodes: [usize; 3]) -> Element {
        Element {
            kind: ElementKind::Triangle,
            physical: 1,
            entity: 1,
            nodes: nodes.to_vec(),
        }
    }

    /// Two triangles of a unit square whose shared diagonal is stored
    /// twice, once slightly displaced, plus a sliver and a stray node.
    fn dirty() -> Mesh {
        Mesh {
            nodes: vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
                Point2::new(1.0 + 1e-6, 1.0),
                Point2::new(5.0, 5.0),
                Point2::new(0.5, 0.0001),
            ],
            elements: vec![
                tri([0, 1, 2]),
                tri([0, 4, 3]),
                tri([0, 2, 4]),
                tri([0, 1, 6]),
            ],
            physical_groups: vec![PhysicalGroup {
                dim: 2,
                id: 1,
                name: "box".into(),
            }],
        }
    }

    #[test]
    fn equilateral_quality_is_one() {
        let h = 3.0_f64.sqrt() / 2.0;
        let q = triangle_quality(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.5, h),
        );
        assert_relative_eq!(q, 1.0, epsilon = 1e-12);
        let flat = triangle_quality(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(2.0, 0.0),
        );
        assert_relative_eq!(flat, 0.0);
    }

    #[test]
    fn heal_merges_drops_and_renumbers() {
        let mut mesh = dirty();
        let stats = heal(&mut mesh, &HealConfig::default());
        assert_eq!(stats.merged_nodes, 1);
        assert_eq!(stats.degenerate_elements, 1);
        assert_eq!(stats.gamma_stats.bad_elements, vec![4]);
        // the duplicate, the stray node and the sliver apex
        assert_eq!(stats.removed_nodes, 3);
        assert_eq!(mesh.nodes.len(), 4);
        assert_eq!(mesh.elements.len(), 2);
        assert_eq!(mesh.elements[1].nodes, vec![0, 2, 3]);
        assert_eq!(stats.gamma_stats.hist.iter().sum::<usize>(), 3);
        assert_eq!(stats.gamma_stats.bins.len(), 11);
    }

    #[test]
    fn healing_is_idempotent() {
        let mut once = dirty();
        heal(&mut once, &HealConfig::default());
        let mut twice = once.clone();
        let stats = heal(&mut twice, &HealConfig::default());
        assert_eq!(once, twice);
        assert!(stats.is_clean());
    }

    #[test]
    fn chained_nodes_merge_onto_lowest_index() {
        let nodes = [
            Point2::new(0.0, 0.0),
            Point2::new(0.6, 0.0),
            Point2::new(1.2, 0.0),
            Point2::new(9.0, 0.0),
        ];
        assert_eq!(merge_nodes(&nodes, 1.0), vec![0, 0, 0, 3]);
    }

    #[test]
    fn heal_file_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("box_cut.msh");
        msh::write_msh(&dirty(), &raw).unwrap();
        let (healed, stats) = heal_file(&raw, HealConfig::default()).unwrap();
        assert_eq!(healed, dir.path().join("box_cut_healed.msh"));
        assert_eq!(msh::read_msh(&healed).unwrap().elements.len(), 2);
        let text = std::fs::read_to_string(dir.path().join("box_cut_heal_stats.yaml")).unwrap();
        let back: HealStats = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        let cfg = HealConfig {
            node_tol: 1e-4,
            quality_tol: 2.0,
        };
        assert!(cfg.validate().is_err());
    }
}
