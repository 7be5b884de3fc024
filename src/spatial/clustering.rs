//! Viewport-aware region clustering
//!
//! Depending on the zoom tier, visible entities are either grouped into one
//! cluster per administrative region, narrowed to the dominant region, or
//! returned as-is for individual markers.

use crate::core::{
    config::{MarkerSizeConfig, ZoomTierConfig},
    geo::{GeoBounds, GeoPoint},
    viewport::{Viewport, ZoomTier},
};
use crate::data::{records::Entity, region::Region};
use crate::prelude::HashMap;
use crate::spatial::culling::Culling;
use serde::Serialize;

/// Represents all visible entities of one region rendered as a single marker
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub region: Region,
    pub members: Vec<Entity>,
    /// Unweighted mean of member positions
    pub centroid: GeoPoint,
}

impl Cluster {
    /// Builds a cluster; `None` for an empty member list
    pub fn from_members(region: Region, members: Vec<Entity>) -> Option<Self> {
        let centroid = GeoPoint::mean(members.iter().map(|entity| &entity.position))?;
        Some(Self {
            region,
            members,
            centroid,
        })
    }

    /// Every entity of `region`, regardless of visibility
    pub fn for_region(region: &Region, entities: &[Entity]) -> Option<Self> {
        let members = entities
            .iter()
            .filter(|entity| &entity.region == region)
            .cloned()
            .collect();
        Self::from_members(region.clone(), members)
    }

    /// Get the number of entities in the cluster
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Bounds of the member positions, used to zoom into the region
    pub fn member_bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(self.members.iter().map(|entity| &entity.position))
    }
}

/// Output of one clustering pass
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterResult {
    Grouped(Vec<Cluster>),
    Individual(Vec<Entity>),
}

impl ClusterResult {
    /// Number of markers this result renders
    pub fn len(&self) -> usize {
        match self {
            ClusterResult::Grouped(clusters) => clusters.len(),
            ClusterResult::Individual(entities) => entities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entities represented, counting cluster members
    pub fn entity_count(&self) -> usize {
        match self {
            ClusterResult::Grouped(clusters) => clusters.iter().map(Cluster::count).sum(),
            ClusterResult::Individual(entities) => entities.len(),
        }
    }

    /// Bounding box of every rendered marker position
    pub fn extent(&self) -> Option<GeoBounds> {
        match self {
            ClusterResult::Grouped(clusters) => {
                GeoBounds::from_points(clusters.iter().map(|cluster| &cluster.centroid))
            }
            ClusterResult::Individual(entities) => {
                GeoBounds::from_points(entities.iter().map(|entity| &entity.position))
            }
        }
    }

    /// Marker requests for the display, one per cluster or entity
    pub fn marker_requests(&self, sizing: &MarkerSizeConfig) -> Vec<MarkerRequest> {
        match self {
            ClusterResult::Grouped(clusters) => clusters
                .iter()
                .map(|cluster| MarkerRequest::for_cluster(cluster, sizing))
                .collect(),
            ClusterResult::Individual(entities) => entities
                .iter()
                .map(|entity| MarkerRequest::for_entity(entity, sizing))
                .collect(),
        }
    }
}

/// What the display is asked to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerRequest {
    Cluster {
        position: GeoPoint,
        label: String,
        count: usize,
        /// Glyph diameter in pixels
        size: f64,
        font_size: u32,
    },
    Entity {
        position: GeoPoint,
        record_id: String,
        display_name: String,
        link: String,
    },
}

impl MarkerRequest {
    pub fn for_cluster(cluster: &Cluster, sizing: &MarkerSizeConfig) -> Self {
        let count = cluster.count();
        MarkerRequest::Cluster {
            position: cluster.centroid,
            label: cluster.region.to_string(),
            count,
            size: sizing.cluster_size(count),
            font_size: MarkerSizeConfig::label_font_size(count),
        }
    }

    pub fn for_entity(entity: &Entity, sizing: &MarkerSizeConfig) -> Self {
        MarkerRequest::Entity {
            position: entity.position,
            record_id: entity.code().to_string(),
            display_name: truncate_name(&entity.record.display_name(), sizing.name_max_chars),
            link: format!("/mountain/{}", entity.code()),
        }
    }

    pub fn position(&self) -> GeoPoint {
        match self {
            MarkerRequest::Cluster { position, .. } | MarkerRequest::Entity { position, .. } => {
                *position
            }
        }
    }
}

fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() > max_chars {
        let mut truncated: String = name.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    } else {
        name.to_string()
    }
}

/// Groups entities by region, keeping regions in first-encountered order
fn group_by_region<'e>(entities: &[&'e Entity]) -> Vec<(Region, Vec<&'e Entity>)> {
    let mut index: HashMap<&Region, usize> = HashMap::default();
    let mut groups: Vec<(Region, Vec<&'e Entity>)> = Vec::new();

    for &entity in entities {
        match index.get(&entity.region) {
            Some(&slot) => groups[slot].1.push(entity),
            None => {
                index.insert(&entity.region, groups.len());
                groups.push((entity.region.clone(), vec![entity]));
            }
        }
    }

    groups
}

/// Stateless clustering engine parameterized by zoom thresholds
#[derive(Debug, Clone, Default)]
pub struct ClusteringEngine {
    config: ZoomTierConfig,
}

impl ClusteringEngine {
    pub fn new(config: ZoomTierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ZoomTierConfig {
        &self.config
    }

    pub fn tier(&self, zoom_level: i32) -> ZoomTier {
        ZoomTier::classify(zoom_level, &self.config)
    }

    /// Clusters the visible subset of `entities` for the given viewport.
    ///
    /// Entities are read only; calling twice with the same inputs yields the
    /// same result.
    pub fn cluster(&self, entities: &[Entity], viewport: &Viewport<'_>) -> ClusterResult {
        let visible = Culling::visible_entities(entities, viewport);
        let visible_count = visible.len();
        let tier = viewport.tier(&self.config);

        let result = match tier {
            ZoomTier::Individual => {
                ClusterResult::Individual(visible.into_iter().cloned().collect())
            }
            ZoomTier::Mixed => {
                let mut dominant: Option<(Region, Vec<&Entity>)> = None;
                for (region, members) in group_by_region(&visible) {
                    // strictly greater keeps the first-encountered region on ties
                    let larger = dominant
                        .as_ref()
                        .map_or(true, |(_, best)| members.len() > best.len());
                    if larger {
                        dominant = Some((region, members));
                    }
                }

                match dominant {
                    Some((region, members)) => {
                        log::debug!("opening region {} ({} entities)", region, members.len());
                        ClusterResult::Individual(members.into_iter().cloned().collect())
                    }
                    None => ClusterResult::Individual(Vec::new()),
                }
            }
            ZoomTier::Clustered => ClusterResult::Grouped(
                group_by_region(&visible)
                    .into_iter()
                    .filter_map(|(region, members)| {
                        Cluster::from_members(region, members.into_iter().cloned().collect())
                    })
                    .collect(),
            ),
        };

        log::debug!(
            "zoom {} ({:?}): {} of {} entities visible, {} markers",
            viewport.zoom_level,
            tier,
            visible_count,
            entities.len(),
            result.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::RawLocationRecord;

    fn entity(code: &str, location: &str, lat: f64, lon: f64) -> Entity {
        Entity::new(
            RawLocationRecord::new(code, format!("산 {}", code), location),
            GeoPoint::new(lat, lon),
        )
    }

    fn everywhere() -> GeoBounds {
        GeoBounds::from_coords(-90.0, -180.0, 90.0, 180.0)
    }

    fn seoul_and_gyeonggi() -> Vec<Entity> {
        vec![
            entity("s1", "서울 도봉구", 37.50, 126.94),
            entity("g1", "경기 가평군", 37.83, 127.51),
            entity("s2", "서울 관악구", 37.55, 126.99),
            entity("s3", "서울 강북구", 37.60, 127.04),
        ]
    }

    #[test]
    fn test_clustered_tier_groups_by_region() {
        let engine = ClusteringEngine::default();
        let bounds = everywhere();
        let result = engine.cluster(&seoul_and_gyeonggi(), &Viewport::new(7, &bounds));

        let ClusterResult::Grouped(clusters) = result else {
            panic!("expected grouped result");
        };
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].region.as_str(), "서울");
        assert_eq!(clusters[0].count(), 3);
        assert!((clusters[0].centroid.lat - 37.55).abs() < 1e-9);
        assert!((clusters[0].centroid.lon - 126.99).abs() < 1e-9);
        assert_eq!(clusters[1].region.as_str(), "경기");
        assert_eq!(clusters[1].count(), 1);
        assert_eq!(clusters[1].centroid, GeoPoint::new(37.83, 127.51));
    }

    #[test]
    fn test_individual_tier_returns_all_visible() {
        let engine = ClusteringEngine::default();
        let bounds = everywhere();
        let entities = seoul_and_gyeonggi();
        let result = engine.cluster(&entities, &Viewport::new(5, &bounds));
        assert_eq!(result, ClusterResult::Individual(entities));
    }

    #[test]
    fn test_mixed_tier_opens_dominant_region() {
        let engine = ClusteringEngine::default();
        let bounds = everywhere();
        let result = engine.cluster(&seoul_and_gyeonggi(), &Viewport::new(6, &bounds));

        let ClusterResult::Individual(members) = result else {
            panic!("expected individual result");
        };
        let codes: Vec<&str> = members.iter().map(Entity::code).collect();
        assert_eq!(codes, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn test_mixed_tier_tie_breaks_on_first_encountered() {
        let engine = ClusteringEngine::default();
        let bounds = everywhere();
        let entities = vec![
            entity("g1", "경기 가평군", 37.83, 127.51),
            entity("s1", "서울 도봉구", 37.50, 126.94),
            entity("s2", "서울 관악구", 37.55, 126.99),
            entity("g2", "경기 양평군", 37.49, 127.49),
        ];
        let result = engine.cluster(&entities, &Viewport::new(6, &bounds));
        let ClusterResult::Individual(members) = result else {
            panic!("expected individual result");
        };
        assert!(members.iter().all(|e| e.region.as_str() == "경기"));
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn test_offscreen_entities_never_appear() {
        let engine = ClusteringEngine::default();
        // excludes 가평 (lon 127.51)
        let bounds = GeoBounds::from_coords(37.0, 126.5, 38.0, 127.2);
        let entities = seoul_and_gyeonggi();

        for zoom in [3, 6, 9] {
            let result = engine.cluster(&entities, &Viewport::new(zoom, &bounds));
            match &result {
                ClusterResult::Grouped(clusters) => {
                    assert!(clusters
                        .iter()
                        .flat_map(|c| &c.members)
                        .all(|e| bounds.contains(&e.position)));
                    assert_eq!(result.entity_count(), 3);
                }
                ClusterResult::Individual(members) => {
                    assert!(members.iter().all(|e| bounds.contains(&e.position)));
                }
            }
        }
    }

    #[test]
    fn test_unlabelled_entities_are_clustered_as_other() {
        let engine = ClusteringEngine::default();
        let bounds = everywhere();
        let entities = vec![
            entity("a", "", 36.0, 128.0),
            entity("b", "   ", 36.2, 128.2),
            entity("c", "강원 인제군", 38.1, 128.4),
        ];
        let ClusterResult::Grouped(clusters) = engine.cluster(&entities, &Viewport::new(8, &bounds))
        else {
            panic!("expected grouped result");
        };
        assert_eq!(clusters.len(), 2);
        assert!(clusters[0].region.is_other());
        assert_eq!(clusters[0].count(), 2);
        assert_eq!(clusters.iter().map(Cluster::count).sum::<usize>(), 3);
    }

    #[test]
    fn test_empty_viewport() {
        let engine = ClusteringEngine::default();
        let nowhere = |_: &GeoPoint| false;
        let entities = seoul_and_gyeonggi();
        assert_eq!(
            engine.cluster(&entities, &Viewport::new(9, &nowhere)),
            ClusterResult::Grouped(Vec::new())
        );
        assert_eq!(
            engine.cluster(&entities, &Viewport::new(6, &nowhere)),
            ClusterResult::Individual(Vec::new())
        );
    }

    #[test]
    fn test_idempotent() {
        let engine = ClusteringEngine::default();
        let bounds = GeoBounds::from_coords(37.0, 126.0, 38.0, 128.0);
        let entities = seoul_and_gyeonggi();
        for zoom in [4, 6, 8] {
            let viewport = Viewport::new(zoom, &bounds);
            assert_eq!(engine.cluster(&entities, &viewport), engine.cluster(&entities, &viewport));
        }
    }

    #[test]
    fn test_marker_requests() {
        let engine = ClusteringEngine::default();
        let bounds = everywhere();
        let sizing = MarkerSizeConfig::default();
        let entities = vec![
            entity("s1", "서울 도봉구", 37.50, 126.94),
            Entity::new(
                RawLocationRecord::new("long", "아주아주아주아주긴이름을가진산입니다", "서울"),
                GeoPoint::new(37.6, 127.0),
            ),
        ];

        let grouped = engine.cluster(&entities, &Viewport::new(10, &bounds));
        match &grouped.marker_requests(&sizing)[..] {
            [MarkerRequest::Cluster { label, count, size, font_size, .. }] => {
                assert_eq!(label, "서울");
                assert_eq!(*count, 2);
                assert!((size - (40.0 + 2f64.sqrt() * 6.0)).abs() < 1e-9);
                assert_eq!(*font_size, 12);
            }
            other => panic!("unexpected markers {:?}", other),
        }

        let individual = engine.cluster(&entities, &Viewport::new(1, &bounds));
        let markers = individual.marker_requests(&sizing);
        assert_eq!(markers.len(), 2);
        match &markers[1] {
            MarkerRequest::Entity { record_id, display_name, link, .. } => {
                assert_eq!(record_id, "long");
                assert_eq!(display_name, "아주아주아주아주긴이름을가진산...");
                assert_eq!(link, "/mountain/long");
            }
            other => panic!("unexpected marker {:?}", other),
        }
    }

    #[test]
    fn test_extent() {
        let engine = ClusteringEngine::default();
        let bounds = everywhere();
        let result = engine.cluster(&seoul_and_gyeonggi(), &Viewport::new(3, &bounds));
        let extent = result.extent().unwrap();
        assert_eq!(extent.south_west, GeoPoint::new(37.50, 126.94));
        assert_eq!(extent.north_east, GeoPoint::new(37.83, 127.51));
        assert!(ClusterResult::Grouped(Vec::new()).extent().is_none());
    }
}
