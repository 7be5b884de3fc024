use crate::core::{geo::GeoPoint, viewport::Viewport};
use crate::data::records::Entity;

/// Visible-area filtering.
///
/// Clustering only ever looks at what survives this pass, so its cost is
/// proportional to what is rendered.
pub struct Culling;

impl Culling {
    /// Returns `true` if a point lies inside the visible area
    pub fn point_visible(viewport: &Viewport<'_>, point: &GeoPoint) -> bool {
        viewport.contains(point)
    }

    /// Entities whose position is visible, in input order
    pub fn visible_entities<'e>(entities: &'e [Entity], viewport: &Viewport<'_>) -> Vec<&'e Entity> {
        entities
            .iter()
            .filter(|entity| Self::point_visible(viewport, &entity.position))
            .collect()
    }
}
