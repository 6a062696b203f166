use std::fmt;
use std::sync::Arc;

use super::region::Extent;

/// Strategy mapping `(piece, num_pieces, ghost_level)` onto a concrete
/// extent of a structured dataset.
///
/// Contract:
/// - `num_pieces == 1` always yields the whole extent.
/// - `piece >= num_pieces` is a caller error (checked by debug assertion).
/// - With `ghost_level == 0` the extents for pieces `0..num_pieces` tile the
///   whole extent without overlap; with `ghost_level > 0` each extent may
///   overlap its neighbours by up to `ghost_level` units per side, clamped
///   to the whole extent.
pub trait RegionTranslator: Send + Sync {
    fn piece_to_extent(
        &self,
        piece: u32,
        num_pieces: u32,
        ghost_level: u32,
        whole: &Extent,
    ) -> Extent;
}

impl fmt::Debug for dyn RegionTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RegionTranslator")
    }
}

/// Shared handle to a translator, the form carried in metadata records.
pub type TranslatorHandle = Arc<dyn RegionTranslator>;

/// Translator for data that cannot be spatially decomposed: every piece is
/// the whole extent, forcing full-data requests downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTranslator;

impl RegionTranslator for DefaultTranslator {
    fn piece_to_extent(
        &self,
        piece: u32,
        num_pieces: u32,
        _ghost_level: u32,
        whole: &Extent,
    ) -> Extent {
        debug_assert!(num_pieces == 0 || piece < num_pieces);
        *whole
    }
}

/// Splits the longest axis of the whole extent into contiguous slabs, one
/// per piece, the remainder points going to the leading slabs. Ghost levels
/// dilate the slab on every axis, clamped to the whole extent.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockTranslator;

impl RegionTranslator for BlockTranslator {
    fn piece_to_extent(
        &self,
        piece: u32,
        num_pieces: u32,
        ghost_level: u32,
        whole: &Extent,
    ) -> Extent {
        debug_assert!(num_pieces == 0 || piece < num_pieces);
        if num_pieces <= 1 {
            return *whole;
        }
        if whole.is_empty() {
            return Extent::empty();
        }

        let axis = whole.longest_axis();
        let len = whole.axis_len(axis);
        let pieces = num_pieces as i64;
        let base = len / pieces;
        let rem = len % pieces;

        let p = piece as i64;
        // Pieces below `rem` are one point longer.
        let start = whole.min[axis] + p * base + p.min(rem);
        let size = base + if p < rem { 1 } else { 0 };
        if size == 0 {
            return Extent::empty();
        }

        let mut out = *whole;
        out.min[axis] = start;
        out.max[axis] = start + size - 1;

        if ghost_level > 0 {
            out = out.dilate(ghost_level as i64).intersect(whole);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_translator_returns_whole() {
        let whole = Extent::line(0, 99);
        let t = DefaultTranslator;
        assert_eq!(t.piece_to_extent(2, 4, 0, &whole), whole);
        assert_eq!(t.piece_to_extent(0, 1, 3, &whole), whole);
    }

    #[test]
    fn test_block_split_even() {
        let whole = Extent::line(0, 99);
        let t = BlockTranslator;
        assert_eq!(t.piece_to_extent(0, 4, 0, &whole), Extent::line(0, 24));
        assert_eq!(t.piece_to_extent(1, 4, 0, &whole), Extent::line(25, 49));
        assert_eq!(t.piece_to_extent(3, 4, 0, &whole), Extent::line(75, 99));
    }

    #[test]
    fn test_block_split_remainder_leads() {
        let whole = Extent::line(0, 9);
        let t = BlockTranslator;
        // 10 points over 3 pieces: 4 + 3 + 3.
        assert_eq!(t.piece_to_extent(0, 3, 0, &whole), Extent::line(0, 3));
        assert_eq!(t.piece_to_extent(1, 3, 0, &whole), Extent::line(4, 6));
        assert_eq!(t.piece_to_extent(2, 3, 0, &whole), Extent::line(7, 9));
    }

    #[test]
    fn test_block_ghost_overlaps_and_clamps() {
        let whole = Extent::line(0, 99);
        let t = BlockTranslator;
        assert_eq!(t.piece_to_extent(1, 4, 1, &whole), Extent::line(24, 50));
        // First piece clamps at the lower boundary.
        assert_eq!(t.piece_to_extent(0, 4, 1, &whole), Extent::line(0, 25));
    }

    #[test]
    fn test_block_splits_longest_axis() {
        let whole = Extent::new([0, 0, 0], [4, 19, 4]);
        let t = BlockTranslator;
        let first = t.piece_to_extent(0, 2, 0, &whole);
        assert_eq!(first.min, [0, 0, 0]);
        assert_eq!(first.max, [4, 9, 4]);
    }

    // Coverage invariant: for every piece count the pieces cover the whole
    // extent, and with ghost level 0 they tile it without overlap.
    #[test]
    fn test_coverage_and_tiling() {
        let whole = Extent::line(0, 99);
        let t = BlockTranslator;
        for num_pieces in 1..=8u32 {
            let mut counts = vec![0u32; whole.num_points() as usize];
            for piece in 0..num_pieces {
                let e = t.piece_to_extent(piece, num_pieces, 0, &whole);
                assert!(whole.contains(&e));
                for p in e.points() {
                    counts[whole.offset_of(p)] += 1;
                }
            }
            assert!(
                counts.iter().all(|&c| c == 1),
                "pieces must tile exactly for num_pieces={num_pieces}"
            );
        }
    }

    #[test]
    fn test_more_pieces_than_points() {
        let whole = Extent::line(0, 2);
        let t = BlockTranslator;
        let mut covered = 0;
        for piece in 0..5u32 {
            let e = t.piece_to_extent(piece, 5, 0, &whole);
            covered += e.num_points();
        }
        assert_eq!(covered, whole.num_points());
        assert!(t.piece_to_extent(4, 5, 0, &whole).is_empty());
    }
}
