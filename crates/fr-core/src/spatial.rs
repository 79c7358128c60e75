use std::collections::{BTreeSet, HashMap};

use glam::Vec3;

use crate::entity::EntityId;
use crate::geometry::Aabb;

/// A 2D cell coordinate in the index grid (the Y axis is ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    /// Cell column.
    pub x: i32,
    /// Cell row.
    pub z: i32,
}

impl CellCoord {
    /// Cell at column `x`, row `z`.
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// Footprints spanning more cells than this are kept outside the grid.
pub const MAX_FOOTPRINT_CELLS: u64 = 1024;

/// Inclusive cell rectangle covered by a box.
#[derive(Debug, Clone, Copy)]
struct CellSpan {
    lo: CellCoord,
    hi: CellCoord,
}

impl CellSpan {
    fn cell_count(&self) -> u64 {
        let width = (i64::from(self.hi.x) - i64::from(self.lo.x) + 1).max(0) as u64;
        let depth = (i64::from(self.hi.z) - i64::from(self.lo.z) + 1).max(0) as u64;
        width.saturating_mul(depth)
    }

    fn contains(&self, coord: CellCoord) -> bool {
        (self.lo.x..=self.hi.x).contains(&coord.x) && (self.lo.z..=self.hi.z).contains(&coord.z)
    }

    fn coords(self) -> impl Iterator<Item = CellCoord> {
        (self.lo.x..=self.hi.x)
            .flat_map(move |x| (self.lo.z..=self.hi.z).map(move |z| CellCoord::new(x, z)))
    }
}

/// Fixed-size grid over the horizontal plane.
///
/// Each entity is placed in every cell its footprint touches, so a query only
/// has to look at the cells covered by the query box. Results are candidates:
/// callers still run their exact test on the returned entities.
///
/// Work is bounded by what is indexed, not by box size. Footprints wider than
/// [`MAX_FOOTPRINT_CELLS`] go to an oversized set that every query returns,
/// and a query box covering more cells than are occupied walks the occupied
/// cells instead.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: HashMap<CellCoord, BTreeSet<EntityId>>,
    placements: HashMap<EntityId, Vec<CellCoord>>,
    oversized: BTreeSet<EntityId>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl SpatialIndex {
    /// Create an empty index with the given cell size.
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive");
        Self {
            cell_size,
            cells: HashMap::new(),
            placements: HashMap::new(),
            oversized: BTreeSet::new(),
        }
    }

    /// Edge length of one cell.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Convert a world position to a cell coordinate.
    pub fn position_to_cell(&self, pos: Vec3) -> CellCoord {
        CellCoord {
            x: (pos.x / self.cell_size).floor() as i32,
            z: (pos.z / self.cell_size).floor() as i32,
        }
    }

    /// Place `id` in every cell covered by `footprint`, replacing any
    /// previous placement.
    pub fn insert(&mut self, id: EntityId, footprint: Aabb) {
        self.remove(&id);
        let span = self.span(&footprint);
        if span.cell_count() > MAX_FOOTPRINT_CELLS {
            self.oversized.insert(id.clone());
            self.placements.insert(id, Vec::new());
            return;
        }
        let coords: Vec<CellCoord> = span.coords().collect();
        for coord in &coords {
            self.cells.entry(*coord).or_default().insert(id.clone());
        }
        self.placements.insert(id, coords);
    }

    /// Remove `id` from the index. Returns `false` if it was not indexed.
    pub fn remove(&mut self, id: &EntityId) -> bool {
        let Some(coords) = self.placements.remove(id) else {
            return false;
        };
        self.oversized.remove(id);
        for coord in coords {
            if let Some(ids) = self.cells.get_mut(&coord) {
                ids.remove(id);
                if ids.is_empty() {
                    self.cells.remove(&coord);
                }
            }
        }
        true
    }

    /// Whether `id` has a placement.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.placements.contains_key(id)
    }

    /// Candidate entities whose cells intersect `area`.
    pub fn query(&self, area: &Aabb) -> BTreeSet<EntityId> {
        let mut result = self.oversized.clone();
        let span = self.span(area);
        if span.cell_count() > self.cells.len() as u64 {
            for (coord, ids) in &self.cells {
                if span.contains(*coord) {
                    result.extend(ids.iter().cloned());
                }
            }
        } else {
            for coord in span.coords() {
                if let Some(ids) = self.cells.get(&coord) {
                    result.extend(ids.iter().cloned());
                }
            }
        }
        result
    }

    /// Candidate entities within `radius` of `center` on the horizontal plane.
    pub fn query_radius(&self, center: Vec3, radius: f32) -> BTreeSet<EntityId> {
        self.query(&Aabb::from_center(center, Vec3::new(radius, 0.0, radius)))
    }

    /// Drop every placement.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.placements.clear();
        self.oversized.clear();
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of entities kept outside the grid.
    pub fn oversized_count(&self) -> usize {
        self.oversized.len()
    }

    fn span(&self, area: &Aabb) -> CellSpan {
        CellSpan {
            lo: self.position_to_cell(area.min),
            hi: self.position_to_cell(area.max),
        }
    }
}
