//! Proximity Strategies
//!
//! General-purpose hit-testing over measured drop targets. Sidebar-specific
//! filtering happens before these run; a strategy only ranks what it is given.

use crate::{Droppable, Point};

/// A ranked drop candidate (lower distance = better match)
#[derive(Clone, Debug, PartialEq)]
pub struct Collision {
    pub id: String,
    pub distance: f64,
}

/// Swappable hit-test primitive
pub trait Proximity: Send + Sync {
    /// Rank `candidates` relative to `origin`, best first
    fn detect(&self, origin: Point, candidates: &[Droppable]) -> Vec<Collision>;
}

/// Rank every candidate by distance between its center and the origin
/// (the dragged rect's center).
#[derive(Clone, Copy, Debug, Default)]
pub struct ClosestCenter;

impl Proximity for ClosestCenter {
    fn detect(&self, origin: Point, candidates: &[Droppable]) -> Vec<Collision> {
        let mut hits: Vec<Collision> = candidates
            .iter()
            .map(|d| Collision {
                id: d.id.clone(),
                distance: origin.distance_to(d.rect.center()),
            })
            .collect();
        sort_by_distance(&mut hits);
        hits
    }
}

/// Only candidates whose rect contains the pointer, nearest center first
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerWithin;

impl Proximity for PointerWithin {
    fn detect(&self, origin: Point, candidates: &[Droppable]) -> Vec<Collision> {
        let mut hits: Vec<Collision> = candidates
            .iter()
            .filter(|d| d.rect.contains(origin))
            .map(|d| Collision {
                id: d.id.clone(),
                distance: origin.distance_to(d.rect.center()),
            })
            .collect();
        sort_by_distance(&mut hits);
        hits
    }
}

// Stable, so equal distances keep registration order
fn sort_by_distance(hits: &mut [Collision]) {
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}
