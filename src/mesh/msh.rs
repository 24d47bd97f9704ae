//! Gmsh MSH 2.2 ASCII reader and writer.
//!
//! Only the sections the pipeline needs are handled: `$MeshFormat`,
//! `$PhysicalNames`, `$Nodes` and `$Elements`. Other sections are skipped
//! on read. Node and element tags are renumbered from one on write.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{FlowMcError, MeshError, Result};
use crate::math::Point2;

use super::{Element, ElementKind, Mesh, PhysicalGroup};

/// Renders a mesh as MSH 2.2 text.
#[must_use]
pub fn to_msh_string(mesh: &Mesh) -> String {
    let mut out = String::new();
    out.push_str("$MeshFormat\n2.2 0 8\n$EndMeshFormat\n");

    if !mesh.physical_groups.is_empty() {
        out.push_str("$PhysicalNames\n");
        let _ = writeln!(out, "{}", mesh.physical_groups.len());
        for g in &mesh.physical_groups {
            let _ = writeln!(out, "{} {} \"{}\"", g.dim, g.id, g.name);
        }
        out.push_str("$EndPhysicalNames\n");
    }

    out.push_str("$Nodes\n");
    let _ = writeln!(out, "{}", mesh.nodes.len());
    for (i, p) in mesh.nodes.iter().enumerate() {
        let _ = writeln!(out, "{} {:?} {:?} 0", i + 1, p.x, p.y);
    }
    out.push_str("$EndNodes\n");

    out.push_str("$Elements\n");
    let _ = writeln!(out, "{}", mesh.elements.len());
    for (i, e) in mesh.elements.iter().enumerate() {
        let _ = write!(out, "{} {} 2 {} {}", i + 1, e.kind.code(), e.physical, e.entity);
        for n in &e.nodes {
            let _ = write!(out, " {}", n + 1);
        }
        out.push('\n');
    }
    out.push_str("$EndElements\n");
    out
}

/// Writes a mesh to `path` in MSH 2.2 format.
///
/// # Errors
///
/// Returns an I/O error carrying the path if the file cannot be written.
pub fn write_msh(mesh: &Mesh, path: &Path) -> Result<()> {
    fs::write(path, to_msh_string(mesh)).map_err(|e| FlowMcError::io(path, e))
}

/// Reads an MSH 2.2 file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or
/// [`MeshError::Format`] if its content is malformed.
pub fn read_msh(path: &Path) -> Result<Mesh> {
    let text = fs::read_to_string(path).map_err(|e| FlowMcError::io(path, e))?;
    parse_msh(&text)
}

/// Line cursor that remembers the line number for error messages.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    line: usize,
}

impl<'a> Lines<'a> {
    fn next_line(&mut self) -> Result<&'a str> {
        loop {
            let Some((i, line)) = self.inner.next() else {
                return Err(self.error("unexpected end of file"));
            };
            self.line = i + 1;
            let line = line.trim();
            if !line.is_empty() {
                return Ok(line);
            }
        }
    }

    fn count(&mut self) -> Result<usize> {
        let line = self.next_line()?;
        line.parse()
            .map_err(|_| self.error(&format!("expected a count, got {line:?}")))
    }

    fn expect_marker(&mut self, marker: &str) -> Result<()> {
        let line = self.next_line()?;
        if line == marker {
            Ok(())
        } else {
            Err(self.error(&format!("expected {marker}, got {line:?}")))
        }
    }

    fn error(&self, message: &str) -> FlowMcError {
        MeshError::Format {
            line: self.line,
            message: message.to_owned(),
        }
        .into()
    }
}

fn field<T: std::str::FromStr>(lines: &Lines, token: Option<&str>, what: &str) -> Result<T> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| lines.error(&format!("invalid {what}")))
}

/// Parses MSH 2.2 text.
///
/// # Errors
///
/// Returns [`MeshError::Format`] for malformed content, unsupported format
/// versions and references to unknown nodes, and
/// [`MeshError::UnsupportedElement`] for element types other than points,
/// lines and triangles.
pub fn parse_msh(text: &str) -> Result<Mesh> {
    let mut lines = Lines {
        inner: text.lines().enumerate(),
        line: 0,
    };
    let mut mesh = Mesh::default();
    let mut node_index: HashMap<u64, usize> = HashMap::new();
    let mut seen_format = false;

    while let Some((i, raw)) = lines.inner.next() {
        lines.line = i + 1;
        let header = raw.trim();
        match header {
            "" => {}
            "$MeshFormat" => {
                let line = lines.next_line()?;
                if !line.starts_with("2.") {
                    return Err(lines.error(&format!("unsupported format version {line:?}")));
                }
                if line.split_whitespace().nth(1) != Some("0") {
                    return Err(lines.error("binary MSH files are not supported"));
                }
                lines.expect_marker("$EndMeshFormat")?;
                seen_format = true;
            }
            "$PhysicalNames" => {
                let n = lines.count()?;
                for _ in 0..n {
                    let line = lines.next_line()?;
                    let mut parts = line.splitn(3, char::is_whitespace);
                    let dim = field(&lines, parts.next(), "physical dimension")?;
                    let id = field(&lines, parts.next(), "physical id")?;
                    let name = parts.next().unwrap_or("").trim().trim_matches('"').to_owned();
                    mesh.physical_groups.push(PhysicalGroup { dim, id, name });
                }
                lines.expect_marker("$EndPhysicalNames")?;
            }
            "$Nodes" => {
                let n = lines.count()?;
                mesh.nodes.reserve(n);
                for _ in 0..n {
                    let line = lines.next_line()?;
                    let mut parts = line.split_whitespace();
                    let tag: u64 = field(&lines, parts.next(), "node tag")?;
                    let x: f64 = field(&lines, parts.next(), "node coordinate")?;
                    let y: f64 = field(&lines, parts.next(), "node coordinate")?;
                    node_index.insert(tag, mesh.nodes.len());
                    mesh.nodes.push(Point2::new(x, y));
                }
                lines.expect_marker("$EndNodes")?;
            }
            "$Elements" => {
                let n = lines.count()?;
                mesh.elements.reserve(n);
                for _ in 0..n {
                    let line = lines.next_line()?;
                    mesh.elements.push(parse_element(&lines, line, &node_index)?);
                }
                lines.expect_marker("$EndElements")?;
            }
            other if other.starts_with('$') && !other.starts_with("$End") => {
                let end = format!("$End{}", &other[1..]);
                loop {
                    if lines.next_line()? == end {
                        break;
                    }
                }
            }
            other => {
                return Err(lines.error(&format!("unexpected line {other:?}")));
            }
        }
    }

    if !seen_format {
        return Err(lines.error("missing $MeshFormat section"));
    }
    Ok(mesh)
}

fn parse_element(lines: &Lines, line: &str, node_index: &HashMap<u64, usize>) -> Result<Element> {
    let mut parts = line.split_whitespace();
    let _tag: u64 = field(lines, parts.next(), "element tag")?;
    let kind = ElementKind::from_code(field(lines, parts.next(), "element type")?)?;
    let n_tags: usize = field(lines, parts.next(), "tag count")?;
    let tags = (0..n_tags)
        .map(|_| field::<u32>(lines, parts.next(), "element tag"))
        .collect::<Result<Vec<_>>>()?;
    let nodes = (0..kind.node_count())
        .map(|_| {
            let tag: u64 = field(lines, parts.next(), "element node")?;
            node_index
                .get(&tag)
                .copied()
                .ok_or_else(|| lines.error(&format!("unknown node {tag}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Element {
        kind,
        physical: tags.first().copied().unwrap_or(0),
        entity: tags.get(1).copied().unwrap_or(0),
        nodes,
    })
}
