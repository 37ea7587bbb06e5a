//! Nearest-site search
//!
//! Ranks a caller-supplied candidate set of camps by distance from a point.
//! Never fetches data itself; deterministic for a fixed candidate ordering
//! (stable sort, so ties keep their original relative order).

use serde::Serialize;

use super::{distance_km, Coordinate};
use crate::camp_registry::types::Camp;

/// A camp paired with its distance from the search point
#[derive(Debug, Clone, Serialize)]
pub struct RankedCamp {
    #[serde(flatten)]
    pub camp: Camp,
    pub distance_km: f64,
}

/// Rank candidates by ascending distance from `point`
pub fn rank_by_distance(point: Coordinate, camps: Vec<Camp>) -> Vec<RankedCamp> {
    let mut ranked: Vec<RankedCamp> = camps
        .into_iter()
        .map(|camp| {
            let distance_km = distance_km(point, camp.coordinate);
            RankedCamp { camp, distance_km }
        })
        .collect();
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}

/// First `n` entries of [`rank_by_distance`], clamped to the candidate count
pub fn top_n(point: Coordinate, camps: Vec<Camp>, n: usize) -> Vec<RankedCamp> {
    let mut ranked = rank_by_distance(point, camps);
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camp_registry::types::{CampResources, CampStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn camp(name: &str, lat: f64, lon: f64) -> Camp {
        Camp {
            camp_id: Uuid::new_v4(),
            name: name.to_string(),
            address: format!("{} address", name),
            coordinate: Coordinate::new(lat, lon).unwrap(),
            capacity: 100,
            current_occupancy: 0,
            resources: CampResources::default(),
            facilities: vec![],
            connected_camps: vec![],
            status: CampStatus::Active,
            managed_by: "Disaster Management Authority".to_string(),
            contact_number: None,
            established_at: Utc::now(),
        }
    }

    #[test]
    fn test_rank_is_non_decreasing() {
        let point = Coordinate::new(0.0, 0.0).unwrap();
        let camps = vec![
            camp("far", 30.0, 30.0),
            camp("near", 0.5, 0.5),
            camp("mid", 10.0, 10.0),
        ];

        let ranked = rank_by_distance(point, camps);
        assert_eq!(ranked[0].camp.name, "near");
        assert_eq!(ranked[2].camp.name, "far");
        for pair in ranked.windows(2) {
            assert!(pair[0].distance_km <= pair[1].distance_km);
        }
    }

    #[test]
    fn test_ties_keep_original_order() {
        let point = Coordinate::new(0.0, 0.0).unwrap();
        // Same location, so identical distances
        let camps = vec![
            camp("first", 1.0, 1.0),
            camp("second", 1.0, 1.0),
            camp("third", 1.0, 1.0),
        ];

        let ranked = rank_by_distance(point, camps);
        let names: Vec<&str> = ranked.iter().map(|r| r.camp.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_top_n_is_a_prefix_of_the_ranking() {
        let point = Coordinate::new(0.0, 0.0).unwrap();
        let camps = vec![
            camp("a", 5.0, 5.0),
            camp("b", 1.0, 1.0),
            camp("c", 3.0, 3.0),
            camp("d", 2.0, 2.0),
        ];

        let full = rank_by_distance(point, camps.clone());
        let top = top_n(point, camps, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].camp.camp_id, full[0].camp.camp_id);
        assert_eq!(top[1].camp.camp_id, full[1].camp.camp_id);
    }

    #[test]
    fn test_top_n_clamps_to_candidate_count() {
        let point = Coordinate::new(0.0, 0.0).unwrap();
        let camps = vec![camp("only", 1.0, 1.0)];
        assert_eq!(top_n(point, camps, 5).len(), 1);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let point = Coordinate::new(0.0, 0.0).unwrap();
        assert!(rank_by_distance(point, vec![]).is_empty());
        assert!(top_n(point, vec![], 3).is_empty());
    }
}
