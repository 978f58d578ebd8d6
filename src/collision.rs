//! Collision Resolver
//!
//! Proximity hit-testing alone cannot tell "reorder inside my group" from
//! "jump to the neighbouring group" while nested lists overlap during
//! animation. Each drag frame is first narrowed to the single valid
//! interpretation for the pointer's zone, then ranked by a swappable
//! [`Proximity`] strategy.

use log::debug;
use navtree_dnd::{ClosestCenter, Collision, Droppable, Point, Proximity, Rect};

use crate::identity::{self, RootId, SortableId};

/// Last measured content rect of a group (still valid when collapsed)
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBounds {
    pub group_id: String,
    pub rect: Rect,
}

impl GroupBounds {
    pub fn new(group_id: impl Into<String>, rect: Rect) -> Self {
        Self {
            group_id: group_id.into(),
            rect,
        }
    }
}

/// Pointer state for one drag frame
#[derive(Debug, Clone, Copy)]
pub struct DragFrame<'a> {
    /// Everything currently registered as a drop target
    pub droppables: &'a [Droppable],
    pub pointer: Option<Point>,
    /// Rect of the dragged overlay, if measured
    pub collision_rect: Option<Rect>,
    pub groups: &'a [GroupBounds],
}

/// Which rule produced the candidate set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    /// A group is being dragged: root ids only
    GroupAtRoot,
    /// Reorder among siblings of this group
    WithinGroup(String),
    /// Move into this group via its dropzone
    IntoGroup(String),
    /// Pointer outside every group (also the fallback)
    Root,
}

/// The group whose content rect contains the pointer's y coordinate
pub fn current_group<'a>(pointer: Option<Point>, groups: &'a [GroupBounds]) -> Option<&'a str> {
    let y = pointer?.y;
    groups
        .iter()
        .find(|bounds| bounds.rect.contains_y(y))
        .map(|bounds| bounds.group_id.as_str())
}

fn root_candidates(droppables: &[Droppable]) -> Vec<Droppable> {
    droppables
        .iter()
        .filter(|d| identity::is_root_id(&d.id))
        .cloned()
        .collect()
}

/// Narrow the registered droppables for this frame. First matching rule
/// wins; an empty result falls back to root-level ids.
pub fn restrict_candidates(active_id: &str, frame: &DragFrame<'_>) -> (Restriction, Vec<Droppable>) {
    let active = SortableId::parse(active_id);

    if matches!(active, Some(SortableId::Root(RootId::Group(_)))) {
        return (Restriction::GroupAtRoot, root_candidates(frame.droppables));
    }

    let source_group = match &active {
        Some(SortableId::Child(child)) => Some(child.group_id.as_str()),
        _ => None,
    };

    let restricted = match current_group(frame.pointer, frame.groups) {
        Some(current) if Some(current) == source_group => {
            let siblings: Vec<Droppable> = frame
                .droppables
                .iter()
                .filter(|d| {
                    identity::parse_child_id(&d.id).is_some_and(|c| c.group_id == current)
                })
                .cloned()
                .collect();
            Some((Restriction::WithinGroup(current.to_string()), siblings))
        }
        Some(current) => {
            let zone_id = identity::dropzone_id(current);
            let zone = frame
                .droppables
                .iter()
                .find(|d| d.id == zone_id)
                .cloned()
                .or_else(|| {
                    // Not registered separately: the group's own rect stands in
                    frame
                        .groups
                        .iter()
                        .find(|b| b.group_id == current)
                        .map(|b| Droppable::new(zone_id.clone(), b.rect))
                });
            Some((Restriction::IntoGroup(current.to_string()), zone.into_iter().collect()))
        }
        None => None,
    };

    match restricted {
        Some((rule, candidates)) if !candidates.is_empty() => (rule, candidates),
        _ => (Restriction::Root, root_candidates(frame.droppables)),
    }
}

/// Restriction rules composed with a proximity primitive
pub struct CollisionResolver {
    proximity: Box<dyn Proximity>,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(ClosestCenter)
    }
}

impl CollisionResolver {
    pub fn new(proximity: impl Proximity + 'static) -> Self {
        Self {
            proximity: Box::new(proximity),
        }
    }

    /// Ranked collisions for the frame, best first. Empty when neither a
    /// collision rect nor a pointer is known.
    pub fn resolve(&self, active_id: &str, frame: &DragFrame<'_>) -> Vec<Collision> {
        let Some(origin) = frame.collision_rect.map(|r| r.center()).or(frame.pointer) else {
            return Vec::new();
        };
        let (rule, candidates) = restrict_candidates(active_id, frame);
        debug!(
            "[DND] {} over {:?}: {} candidate(s)",
            active_id,
            rule,
            candidates.len()
        );
        self.proximity.detect(origin, &candidates)
    }
}
