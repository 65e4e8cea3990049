//! Weighted piece catalogs.
//!
//! A [`Catalog`] is the shared, read-only template for one family. Every
//! generation instantiates its own [`WeightTable`] from it, so placement
//! counts never leak between structures or threads.

use std::fmt::Debug;

use crate::error::StructureError;
use crate::random::StructureRng;

/// One weighted entry of a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceWeight<K> {
    pub kind: K,
    pub weight: i32,
    /// 0 means unlimited.
    pub max_placements: i32,
    pub placed: i32,
    /// Whether the same kind may be placed twice in a row.
    pub allow_in_row: bool,
    /// The entry only places at depths strictly greater than this.
    pub min_depth: Option<u32>,
}

impl<K> PieceWeight<K> {
    pub fn new(kind: K, weight: i32, max_placements: i32) -> Self {
        Self {
            kind,
            weight,
            max_placements,
            placed: 0,
            allow_in_row: false,
            min_depth: None,
        }
    }

    pub fn repeatable(mut self) -> Self {
        self.allow_in_row = true;
        self
    }

    pub fn deeper_than(mut self, depth: u32) -> Self {
        self.min_depth = Some(depth);
        self
    }

    pub fn has_quota(&self) -> bool {
        self.max_placements == 0 || self.placed < self.max_placements
    }

    pub fn is_finite(&self) -> bool {
        self.max_placements > 0
    }

    /// Quota and depth gate for placing this entry at `depth`.
    pub fn can_place(&self, depth: u32) -> bool {
        let deep_enough = self.min_depth.map_or(true, |min| depth > min);
        deep_enough && self.has_quota()
    }
}

/// Outcome of one weighted draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draw {
    /// Nothing left to draw from.
    Exhausted,
    /// The drawn entry may not place here; the attempt is spent.
    Rejected,
    /// Index of the drawn entry in the live table.
    Picked(usize),
}

/// Read-only catalog template.
#[derive(Debug, Clone)]
pub struct Catalog<K> {
    entries: Vec<PieceWeight<K>>,
    finite_quota_rule: bool,
}

impl<K: Copy + PartialEq + Debug> Catalog<K> {
    /// Validates and freezes a list of entries.
    pub fn new(entries: Vec<PieceWeight<K>>) -> Result<Self, StructureError> {
        if entries.is_empty() {
            return Err(StructureError::InvalidCatalog("catalog has no entries".into()));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entry.weight < 0 {
                return Err(StructureError::InvalidCatalog(format!(
                    "{:?} has negative weight {}",
                    entry.kind, entry.weight
                )));
            }
            if entry.max_placements < 0 {
                return Err(StructureError::InvalidCatalog(format!(
                    "{:?} has negative placement limit {}",
                    entry.kind, entry.max_placements
                )));
            }
            if entries[..i].iter().any(|e| e.kind == entry.kind) {
                return Err(StructureError::InvalidCatalog(format!(
                    "{:?} is listed twice",
                    entry.kind
                )));
            }
        }
        Ok(Self {
            entries: entries
                .into_iter()
                .map(|mut e| {
                    e.placed = 0;
                    e
                })
                .collect(),
            finite_quota_rule: false,
        })
    }

    /// Treat the table as exhausted once every finite entry has used its
    /// quota, even when unlimited entries remain.
    pub fn with_finite_quota_rule(mut self) -> Self {
        self.finite_quota_rule = true;
        self
    }

    pub fn entries(&self) -> &[PieceWeight<K>] {
        &self.entries
    }

    pub fn instantiate(&self) -> WeightTable<K> {
        WeightTable {
            entries: self.entries.clone(),
            finite_quota_rule: self.finite_quota_rule,
            imposed: None,
        }
    }
}

/// Per-generation copy of a catalog with live placement counts.
#[derive(Debug, Clone)]
pub struct WeightTable<K> {
    entries: Vec<PieceWeight<K>>,
    finite_quota_rule: bool,
    imposed: Option<K>,
}

impl<K: Copy + PartialEq + Debug> WeightTable<K> {
    pub fn entries(&self) -> &[PieceWeight<K>] {
        &self.entries
    }

    pub fn total_weight(&self) -> i32 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    pub fn is_exhausted(&self) -> bool {
        if self.total_weight() <= 0 {
            return true;
        }
        self.finite_quota_rule && !self.entries.iter().any(|e| e.is_finite() && e.has_quota())
    }

    /// Draws an entry by weight.
    ///
    /// `exclude` is the kind placed last; it is rejected unless the entry
    /// allows repeats.
    pub fn draw<R: StructureRng + ?Sized>(
        &self,
        rng: &mut R,
        exclude: Option<K>,
        depth: u32,
    ) -> Draw {
        if self.is_exhausted() {
            return Draw::Exhausted;
        }
        let mut remaining = rng.next_int(self.total_weight());
        for (index, entry) in self.entries.iter().enumerate() {
            remaining -= entry.weight;
            if remaining < 0 {
                return if self.eligible(index, exclude, depth) {
                    Draw::Picked(index)
                } else {
                    Draw::Rejected
                };
            }
        }
        Draw::Rejected
    }

    pub fn eligible(&self, index: usize, exclude: Option<K>, depth: u32) -> bool {
        let Some(entry) = self.entries.get(index) else {
            return false;
        };
        if !entry.can_place(depth) {
            return false;
        }
        !(exclude == Some(entry.kind) && !entry.allow_in_row)
    }

    /// Live index of `kind`; `None` once its quota is used up.
    pub fn index_of(&self, kind: K) -> Option<usize> {
        self.entries.iter().position(|e| e.kind == kind)
    }

    pub fn kind_at(&self, index: usize) -> Option<K> {
        self.entries.get(index).map(|e| e.kind)
    }

    /// Counts a placement and drops the entry once its quota is used up.
    pub fn record_placement(&mut self, index: usize) {
        let Some(entry) = self.entries.get_mut(index) else {
            return;
        };
        entry.placed += 1;
        if !entry.has_quota() {
            self.entries.remove(index);
        }
    }

    /// Same as [`WeightTable::record_placement`], looked up by kind. Kinds
    /// no longer in the table are ignored.
    pub fn record_kind(&mut self, kind: K) {
        if let Some(index) = self.index_of(kind) {
            self.record_placement(index);
        }
    }

    /// Forces the next selection to try `kind` first.
    pub fn impose(&mut self, kind: K) {
        self.imposed = Some(kind);
    }

    pub fn take_imposed(&mut self) -> Option<K> {
        self.imposed.take()
    }

    pub fn placed(&self, kind: K) -> Option<i32> {
        self.entries.iter().find(|e| e.kind == kind).map(|e| e.placed)
    }
}
