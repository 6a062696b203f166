use serde::{Deserialize, Serialize};

/// Inclusive index-space box over three axes.
///
/// An axis with `max < min` makes the extent empty. Single-axis data uses
/// `[lo, hi]` on axis 0 and `[0, 0]` on the remaining axes, see
/// [`Extent::line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub min: [i64; 3],
    pub max: [i64; 3],
}

impl Extent {
    pub fn new(min: [i64; 3], max: [i64; 3]) -> Self {
        Self { min, max }
    }

    /// One-dimensional extent `[lo, hi]` on axis 0.
    pub fn line(lo: i64, hi: i64) -> Self {
        Self {
            min: [lo, 0, 0],
            max: [hi, 0, 0],
        }
    }

    /// The canonical empty extent.
    pub fn empty() -> Self {
        Self {
            min: [0, 0, 0],
            max: [-1, -1, -1],
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|a| self.max[a] < self.min[a])
    }

    /// Number of index points covered, zero when empty.
    pub fn num_points(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        (0..3).map(|a| (self.max[a] - self.min[a] + 1) as u64).product()
    }

    pub fn axis_len(&self, axis: usize) -> i64 {
        (self.max[axis] - self.min[axis] + 1).max(0)
    }

    /// Axis with the largest point count; ties resolve to the lowest axis.
    pub fn longest_axis(&self) -> usize {
        let mut best = 0;
        for axis in 1..3 {
            if self.axis_len(axis) > self.axis_len(best) {
                best = axis;
            }
        }
        best
    }

    pub fn contains_point(&self, p: [i64; 3]) -> bool {
        (0..3).all(|a| p[a] >= self.min[a] && p[a] <= self.max[a])
    }

    pub fn contains(&self, other: &Extent) -> bool {
        if other.is_empty() {
            return true;
        }
        (0..3).all(|a| other.min[a] >= self.min[a] && other.max[a] <= self.max[a])
    }

    pub fn intersect(&self, other: &Extent) -> Extent {
        let mut out = *self;
        for a in 0..3 {
            out.min[a] = out.min[a].max(other.min[a]);
            out.max[a] = out.max[a].min(other.max[a]);
        }
        out
    }

    pub fn union(&self, other: &Extent) -> Extent {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let mut out = *self;
        for a in 0..3 {
            out.min[a] = out.min[a].min(other.min[a]);
            out.max[a] = out.max[a].max(other.max[a]);
        }
        out
    }

    /// Grow by `amount` index units on every side of every axis. Negative
    /// amounts shrink. The result is not clamped; pair with [`intersect`]
    /// to stay inside a whole extent.
    ///
    /// [`intersect`]: Extent::intersect
    pub fn dilate(&self, amount: i64) -> Extent {
        let mut out = *self;
        for a in 0..3 {
            out.min[a] -= amount;
            out.max[a] += amount;
        }
        out
    }

    /// Row-major offset of `p` within this extent. Caller must ensure the
    /// point lies inside.
    pub fn offset_of(&self, p: [i64; 3]) -> usize {
        let nx = self.axis_len(0);
        let ny = self.axis_len(1);
        let x = p[0] - self.min[0];
        let y = p[1] - self.min[1];
        let z = p[2] - self.min[2];
        (z * ny * nx + y * nx + x) as usize
    }

    /// Iterate all covered points in row-major order.
    pub fn points(&self) -> impl Iterator<Item = [i64; 3]> + '_ {
        let e = *self;
        (e.min[2]..=e.max[2]).flat_map(move |z| {
            (e.min[1]..=e.max[1])
                .flat_map(move |y| (e.min[0]..=e.max[0]).map(move |x| [x, y, z]))
        })
    }
}

/// What a downstream consumer asks of an output port.
///
/// A region is always interpreted relative to the producing dataset's whole
/// extent. `Pieces` addresses one partition of a streamed or unstructured
/// dataset; at structured ports the executive resolves it to an [`Extent`]
/// through the port's [`RegionTranslator`](super::RegionTranslator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Region {
    Extent(Extent),
    Pieces {
        piece: u32,
        num_pieces: u32,
        ghost_level: u32,
    },
}

impl Region {
    /// The "everything, unstreamed" request: piece 0 of 1, no ghosts.
    pub fn whole() -> Self {
        Region::Pieces {
            piece: 0,
            num_pieces: 1,
            ghost_level: 0,
        }
    }

    pub fn as_extent(&self) -> Option<&Extent> {
        match self {
            Region::Extent(e) => Some(e),
            Region::Pieces { .. } => None,
        }
    }

    pub fn ghost_level(&self) -> u32 {
        match self {
            Region::Extent(_) => 0,
            Region::Pieces { ghost_level, .. } => *ghost_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_extent() {
        assert!(Extent::empty().is_empty());
        assert_eq!(Extent::empty().num_points(), 0);
        assert!(!Extent::line(0, 0).is_empty());
    }

    #[test]
    fn test_num_points() {
        assert_eq!(Extent::line(0, 99).num_points(), 100);
        assert_eq!(Extent::new([0, 0, 0], [1, 1, 1]).num_points(), 8);
    }

    #[test]
    fn test_contains() {
        let whole = Extent::line(0, 99);
        assert!(whole.contains(&Extent::line(25, 49)));
        assert!(!whole.contains(&Extent::line(50, 100)));
        // The empty extent is contained everywhere.
        assert!(whole.contains(&Extent::empty()));
    }

    #[test]
    fn test_dilate_and_clamp() {
        let piece = Extent::line(25, 49);
        let grown = piece.dilate(1).intersect(&Extent::line(0, 99));
        assert_eq!(grown, Extent::line(24, 50));

        let edge = Extent::line(0, 24).dilate(1).intersect(&Extent::line(0, 99));
        assert_eq!(edge, Extent::line(0, 25));
    }

    #[test]
    fn test_offsets_are_row_major() {
        let e = Extent::new([0, 0, 0], [2, 1, 0]);
        let offsets: Vec<usize> = e.points().map(|p| e.offset_of(p)).collect();
        assert_eq!(offsets, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_whole_region_is_single_piece() {
        match Region::whole() {
            Region::Pieces {
                piece,
                num_pieces,
                ghost_level,
            } => {
                assert_eq!((piece, num_pieces, ghost_level), (0, 1, 0));
            }
            Region::Extent(_) => panic!("whole() must be a piece request"),
        }
    }
}
