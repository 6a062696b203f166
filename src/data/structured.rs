use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extent::Extent;

/// Structured grid: named point arrays over an index-space extent, plus a
/// per-point validity mask.
///
/// The mask records which locations are *resolved*. Freshly allocated grids
/// start fully unresolved; [`set_value`](Self::set_value) resolves a point.
/// The mask is what makes fill-only-empty composite merging possible: a
/// resolved point is never overwritten by [`fill_empty_from`](Self::fill_empty_from).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredData {
    extent: Extent,
    arrays: BTreeMap<String, Vec<f64>>,
    mask: Vec<bool>,
}

impl StructuredData {
    /// A grid over `extent` with no arrays and every point unresolved.
    pub fn unresolved(extent: Extent) -> Self {
        let n = extent.num_points() as usize;
        Self {
            extent,
            arrays: BTreeMap::new(),
            mask: vec![false; n],
        }
    }

    /// A fully resolved grid with one array produced by `f` per point.
    pub fn from_fn(extent: Extent, array: &str, f: impl Fn([i64; 3]) -> f64) -> Self {
        let n = extent.num_points() as usize;
        let mut values = Vec::with_capacity(n);
        for p in extent.points() {
            values.push(f(p));
        }
        let mut arrays = BTreeMap::new();
        arrays.insert(array.to_string(), values);
        Self {
            extent,
            arrays,
            mask: vec![true; n],
        }
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn array_names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(|s| s.as_str())
    }

    pub fn array(&self, name: &str) -> Option<&[f64]> {
        self.arrays.get(name).map(|v| v.as_slice())
    }

    pub fn is_resolved(&self, p: [i64; 3]) -> bool {
        self.extent.contains_point(p) && self.mask[self.extent.offset_of(p)]
    }

    pub fn fully_resolved(&self) -> bool {
        self.mask.iter().all(|&m| m)
    }

    pub fn num_resolved(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Value of `name` at `p`, `None` for unresolved or out-of-extent
    /// points and for missing arrays.
    pub fn value(&self, name: &str, p: [i64; 3]) -> Option<f64> {
        if !self.is_resolved(p) {
            return None;
        }
        self.arrays.get(name).map(|v| v[self.extent.offset_of(p)])
    }

    /// Write `value` into `name` at `p` and mark the point resolved. The
    /// array is allocated on first use; points outside the extent are
    /// ignored.
    pub fn set_value(&mut self, name: &str, p: [i64; 3], value: f64) {
        if !self.extent.contains_point(p) {
            return;
        }
        let n = self.extent.num_points() as usize;
        let offset = self.extent.offset_of(p);
        self.arrays
            .entry(name.to_string())
            .or_insert_with(|| vec![0.0; n])[offset] = value;
        self.mask[offset] = true;
    }

    /// Copy values from `other` into every point of `self` that is still
    /// unresolved and that `other` has resolved. Resolved points are never
    /// overwritten. Returns how many points were filled.
    pub fn fill_empty_from(&mut self, other: &StructuredData) -> usize {
        let mut filled = 0;
        let shared = self.extent.intersect(other.extent());
        if shared.is_empty() {
            return 0;
        }
        let names: Vec<String> = other.arrays.keys().cloned().collect();
        for p in shared.points() {
            let offset = self.extent.offset_of(p);
            if self.mask[offset] || !other.is_resolved(p) {
                continue;
            }
            for name in &names {
                if let Some(v) = other.value(name, p) {
                    self.set_value(name, p, v);
                }
            }
            self.mask[offset] = true;
            filled += 1;
        }
        filled
    }

    /// Copy of this grid restricted to `to` (intersected with the current
    /// extent). Used for exact-region requests.
    pub fn crop(&self, to: &Extent) -> StructuredData {
        let target = self.extent.intersect(to);
        let mut out = StructuredData::unresolved(target);
        for p in target.points() {
            if !self.is_resolved(p) {
                continue;
            }
            for (name, values) in &self.arrays {
                out.set_value(name, p, values[self.extent.offset_of(p)]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_is_fully_resolved() {
        let d = StructuredData::from_fn(Extent::line(0, 9), "v", |p| p[0] as f64);
        assert!(d.fully_resolved());
        assert_eq!(d.value("v", [3, 0, 0]), Some(3.0));
        assert_eq!(d.value("v", [10, 0, 0]), None);
    }

    #[test]
    fn test_unresolved_reports_no_values() {
        let d = StructuredData::unresolved(Extent::line(0, 4));
        assert!(!d.fully_resolved());
        assert_eq!(d.num_resolved(), 0);
        assert_eq!(d.value("v", [0, 0, 0]), None);
    }

    #[test]
    fn test_fill_empty_never_overwrites() {
        let mut target = StructuredData::unresolved(Extent::line(0, 9));
        target.set_value("v", [2, 0, 0], 100.0);

        let donor = StructuredData::from_fn(Extent::line(0, 4), "v", |_| 1.0);
        let filled = target.fill_empty_from(&donor);

        // Points 0,1,3,4 filled; point 2 kept its prior value.
        assert_eq!(filled, 4);
        assert_eq!(target.value("v", [2, 0, 0]), Some(100.0));
        assert_eq!(target.value("v", [4, 0, 0]), Some(1.0));
        assert_eq!(target.value("v", [5, 0, 0]), None);
    }

    #[test]
    fn test_fill_from_disjoint_extent() {
        let mut target = StructuredData::unresolved(Extent::line(0, 4));
        let donor = StructuredData::from_fn(Extent::line(10, 14), "v", |_| 1.0);
        assert_eq!(target.fill_empty_from(&donor), 0);
    }

    #[test]
    fn test_crop() {
        let d = StructuredData::from_fn(Extent::line(0, 99), "v", |p| p[0] as f64);
        let c = d.crop(&Extent::line(25, 49));
        assert_eq!(*c.extent(), Extent::line(25, 49));
        assert!(c.fully_resolved());
        assert_eq!(c.value("v", [30, 0, 0]), Some(30.0));
        assert_eq!(c.value("v", [24, 0, 0]), None);
    }
}
