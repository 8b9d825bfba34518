//! Grid clustering of news markers.
//!
//! Clusters are rebuilt from scratch for every item set and zoom level; they
//! carry no identity across calls.

use serde::Serialize;
use std::collections::HashMap;

use super::places::{country_coordinates, is_global, Placement, Specificity};
use super::GeoPoint;

/// Zoom thresholds and the cell size (degrees) used below each of them.
/// Cell sizes halve from tier to tier so finer grids nest in coarser ones.
const PRECISION_TIERS: [(f64, f64); 3] = [(2.0, 8.0), (4.0, 4.0), (6.0, 2.0)];
const FINEST_CELL_DEG: f64 = 1.0;

#[derive(Debug, Clone, Serialize)]
pub struct Cluster<'a, T> {
    pub label: String,
    pub specificity: Specificity,
    pub center: GeoPoint,
    pub count: usize,
    pub items: Vec<&'a T>,
}

/// Grid cell size in degrees for a map scale.
pub fn precision_for_scale(scale: f64) -> f64 {
    PRECISION_TIERS
        .iter()
        .find(|(threshold, _)| scale < *threshold)
        .map(|(_, cell)| *cell)
        .unwrap_or(FINEST_CELL_DEG)
}

/// Grid cell holding `point` for the given cell size.
pub fn bucket_key(point: GeoPoint, cell_deg: f64) -> (i64, i64) {
    (
        (point.lat / cell_deg).floor() as i64,
        (point.lng / cell_deg).floor() as i64,
    )
}

/// Globe marker radius (in globe radii) for a cluster of `count` items.
pub fn marker_radius(count: usize) -> f64 {
    (0.02 + count as f64 * 0.004).clamp(0.025, 0.06)
}

struct Accumulator<'a, T> {
    label: String,
    specificity: Specificity,
    lat_sum: f64,
    lng_sum: f64,
    items: Vec<&'a T>,
}

impl<'a, T> Accumulator<'a, T> {
    fn new(placement: &Placement) -> Self {
        Self {
            label: placement.label.clone(),
            specificity: placement.specificity,
            lat_sum: 0.0,
            lng_sum: 0.0,
            items: Vec::new(),
        }
    }

    fn push(&mut self, item: &'a T, placement: Placement) {
        // More specific names win; ties go to the alphabetically first name
        // so the label does not depend on arrival order.
        if placement.specificity > self.specificity
            || (placement.specificity == self.specificity && placement.label < self.label)
        {
            self.label = placement.label;
            self.specificity = placement.specificity;
        }
        self.lat_sum += placement.point.lat;
        self.lng_sum += placement.point.lng;
        self.items.push(item);
    }

    fn finish(self) -> Cluster<'a, T> {
        let count = self.items.len();
        Cluster {
            label: self.label,
            specificity: self.specificity,
            center: GeoPoint::new(self.lat_sum / count as f64, self.lng_sum / count as f64),
            count,
            items: self.items,
        }
    }
}

fn sort_clusters<T>(clusters: &mut [Cluster<'_, T>]) {
    clusters.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
}

/// Buckets placed items into a grid sized for `scale`.
///
/// `locate` supplies each item's placement; unplaced items are skipped.
/// Output is ordered by size, largest first, then by label.
pub fn cluster_news<'a, T, F>(items: &'a [T], scale: f64, locate: F) -> Vec<Cluster<'a, T>>
where
    F: Fn(&T) -> Option<Placement>,
{
    let cell = precision_for_scale(scale);
    let mut buckets: HashMap<(i64, i64), Accumulator<'a, T>> = HashMap::new();

    for item in items {
        let Some(placement) = locate(item) else {
            continue;
        };
        buckets
            .entry(bucket_key(placement.point, cell))
            .or_insert_with(|| Accumulator::new(&placement))
            .push(item, placement);
    }

    let mut clusters: Vec<_> = buckets.into_values().map(Accumulator::finish).collect();
    sort_clusters(&mut clusters);
    clusters
}

/// One cluster per country, as the globe shows them regardless of zoom.
pub fn cluster_by_country<'a, T, F>(items: &'a [T], country_of: F) -> Vec<Cluster<'a, T>>
where
    F: Fn(&T) -> String,
{
    let mut groups: HashMap<String, Vec<&'a T>> = HashMap::new();
    for item in items {
        groups.entry(country_of(item)).or_default().push(item);
    }

    let mut clusters: Vec<_> = groups
        .into_iter()
        .filter(|(country, _)| !is_global(country))
        .filter_map(|(country, items)| {
            let coords = country_coordinates(&country)?;
            Some(Cluster {
                label: country,
                specificity: Specificity::Country,
                center: coords.point(),
                count: items.len(),
                items,
            })
        })
        .collect();
    sort_clusters(&mut clusters);
    clusters
}
