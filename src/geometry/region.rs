use std::fmt;

/// One of the four outer sides of the box domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Bottom,
    Top,
    Left,
    Right,
}

impl Side {
    /// All sides in tagging order.
    pub const ALL: [Side; 4] = [Side::Bottom, Side::Top, Side::Left, Side::Right];
}

/// Region identifier attached to a shape of the geometric model.
///
/// Resolved once while the domain is built; the textual name is only
/// produced when the mesh is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionTag {
    /// Bulk material of the drilled box.
    Box,
    /// Bulk material of the opening when it is kept as a meshed region.
    Opening,
    /// Outer side of the box.
    Side(Side),
    /// Boundary of a cut opening.
    OpeningBoundary,
}

impl RegionTag {
    /// Name of the physical group in the mesh file.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RegionTag::Box => "box",
            RegionTag::Opening => "tunnel",
            RegionTag::Side(Side::Bottom) => ".bottom",
            RegionTag::Side(Side::Top) => ".top",
            RegionTag::Side(Side::Left) => ".left",
            RegionTag::Side(Side::Right) => ".right",
            RegionTag::OpeningBoundary => ".tunnel",
        }
    }

    /// Topological dimension of the tagged entities.
    #[must_use]
    pub fn dim(self) -> usize {
        if self.is_boundary() {
            1
        } else {
            2
        }
    }

    /// Whether the tag names a boundary (curve) region.
    #[must_use]
    pub fn is_boundary(self) -> bool {
        matches!(self, RegionTag::Side(_) | RegionTag::OpeningBoundary)
    }
}

impl fmt::Display for RegionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_names_carry_dot_prefix() {
        for side in Side::ALL {
            let tag = RegionTag::Side(side);
            assert!(tag.name().starts_with('.'));
            assert_eq!(tag.dim(), 1);
        }
        assert_eq!(RegionTag::OpeningBoundary.name(), ".tunnel");
        assert_eq!(RegionTag::Box.dim(), 2);
        assert_eq!(RegionTag::Opening.to_string(), "tunnel");
    }
}
