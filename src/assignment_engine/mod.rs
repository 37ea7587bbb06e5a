//! AssignmentEngine - capacity-aware camp assignment
//!
//! ## Responsibilities
//!
//! - Eligibility: camps open for intake with room for the family
//! - Selection: nearest eligible camp, deterministic tie-break
//! - Reservation: one conditional occupancy update per attempt, bounded
//!   retries across the remaining candidates on concurrent conflicts
//! - Release/discharge: returning reserved capacity without breaking the
//!   `assigned_camp <=> Assigned` invariant
//!
//! The engine is the only writer of camp occupancy and of refugee assignment
//! fields.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::camp_registry::occupancy::derive_status;
use crate::camp_registry::repository::{CampRepository, ReserveOutcome};
use crate::camp_registry::types::Camp;
use crate::error::{Error, Result};
use crate::geo::search;
use crate::geo::Coordinate;
use crate::refugee_registry::repository::RefugeeRepository;
use crate::refugee_registry::types::{CreateRefugeeRequest, Refugee, RefugeeStatus};

/// A successful assignment: the refugee, the chosen camp and the distance
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResult {
    pub refugee: Refugee,
    pub camp: Camp,
    pub distance_km: f64,
}

/// Outcome of register-and-assign
///
/// `Pending` is a valid terminal state: the refugee is persisted and waits
/// for capacity, it is not an error.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    Assigned(AssignmentResult),
    Pending(Refugee),
}

/// AssignmentEngine instance
pub struct AssignmentEngine {
    camps: Arc<dyn CampRepository>,
    refugees: Arc<dyn RefugeeRepository>,
}

impl AssignmentEngine {
    pub fn new(camps: Arc<dyn CampRepository>, refugees: Arc<dyn RefugeeRepository>) -> Self {
        Self { camps, refugees }
    }

    /// Camps that can take a family of `family_members`
    ///
    /// Distinguishes "no camp accepts intake at all" from "open camps exist
    /// but none has room for this family".
    pub async fn find_eligible_camps(&self, family_members: u32) -> Result<Vec<Camp>> {
        let eligible = self.camps.find_eligible(family_members).await?;
        if !eligible.is_empty() {
            return Ok(eligible);
        }

        let any_room = self.camps.find_eligible(1).await?;
        if any_room.is_empty() {
            Err(Error::NoCampsAvailable)
        } else {
            Err(Error::NoCapacitySufficient)
        }
    }

    /// Assign a registered refugee to the nearest eligible camp
    pub async fn assign(&self, refugee_id: Uuid) -> Result<AssignmentResult> {
        let mut refugee = self
            .refugees
            .fetch(refugee_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("refugee {refugee_id}")))?;

        if refugee.assigned_camp.is_some() {
            return Err(Error::AlreadyAssigned(refugee_id));
        }

        self.try_assign(&mut refugee).await
    }

    /// Register a refugee from attributes plus a resolved coordinate, then
    /// attempt assignment; without an eligible camp the record stays Pending
    pub async fn register_and_assign(
        &self,
        req: CreateRefugeeRequest,
        coordinate: Coordinate,
    ) -> Result<RegistrationOutcome> {
        req.validate().map_err(Error::Validation)?;

        let mut refugee = req.into_refugee(coordinate);
        self.refugees.insert(&refugee).await?;
        info!(
            refugee_id = %refugee.refugee_id,
            family_members = refugee.family_members,
            "Refugee registered"
        );

        match self.try_assign(&mut refugee).await {
            Ok(result) => Ok(RegistrationOutcome::Assigned(result)),
            Err(Error::NoCampsAvailable) | Err(Error::NoCapacitySufficient) => {
                info!(
                    refugee_id = %refugee.refugee_id,
                    "No eligible camp, refugee kept pending"
                );
                Ok(RegistrationOutcome::Pending(refugee))
            }
            Err(e) => Err(e),
        }
    }

    /// Return the refugee's reserved capacity and set the record back to
    /// Pending (manual un-assignment)
    pub async fn release(&self, refugee_id: Uuid) -> Result<Refugee> {
        let mut refugee = self
            .refugees
            .fetch(refugee_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("refugee {refugee_id}")))?;

        let camp_id = refugee
            .assigned_camp
            .ok_or(Error::RefugeeNotAssigned(refugee_id))?;

        // Decrement before detaching: a failure in between leaves occupancy
        // conservatively low, never a refugee pointing at freed capacity.
        self.vacate(camp_id, refugee.family_members).await?;

        refugee.assigned_camp = None;
        refugee.status = RefugeeStatus::Pending;
        self.refugees.update(&refugee).await?;

        info!(refugee_id = %refugee_id, camp_id = %camp_id, "Refugee released from camp");
        Ok(refugee)
    }

    /// Deletion flow: release reserved capacity if assigned, detach, then
    /// remove the record
    pub async fn discharge(&self, refugee_id: Uuid) -> Result<()> {
        let refugee = self
            .refugees
            .fetch(refugee_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("refugee {refugee_id}")))?;

        if let Some(camp_id) = refugee.assigned_camp {
            self.vacate(camp_id, refugee.family_members).await?;

            let mut detached = refugee.clone();
            detached.assigned_camp = None;
            detached.status = RefugeeStatus::Pending;
            self.refugees.update(&detached).await?;
        }

        self.refugees.remove(refugee_id).await?;
        info!(refugee_id = %refugee_id, "Refugee record removed");
        Ok(())
    }

    async fn try_assign(&self, refugee: &mut Refugee) -> Result<AssignmentResult> {
        let candidates = self.find_eligible_camps(refugee.family_members).await?;
        let ranked = search::rank_by_distance(refugee.coordinate, candidates);
        let attempts = ranked.len();

        for entry in ranked {
            match self
                .camps
                .adjust_occupancy(entry.camp.camp_id, i64::from(refugee.family_members))
                .await?
            {
                ReserveOutcome::Reserved(camp) => {
                    refugee.assigned_camp = Some(camp.camp_id);
                    refugee.status = RefugeeStatus::Assigned;
                    self.refugees.update(refugee).await?;

                    let camp = self.refresh_status(camp).await?;
                    info!(
                        refugee_id = %refugee.refugee_id,
                        camp_id = %camp.camp_id,
                        distance_km = entry.distance_km,
                        "Refugee assigned to camp"
                    );
                    return Ok(AssignmentResult {
                        refugee: refugee.clone(),
                        camp,
                        distance_km: entry.distance_km,
                    });
                }
                ReserveOutcome::Conflict => {
                    warn!(
                        camp_id = %entry.camp.camp_id,
                        "Capacity taken concurrently, trying next candidate"
                    );
                }
            }
        }

        warn!(
            refugee_id = %refugee.refugee_id,
            attempts,
            "All candidate reservations conflicted"
        );
        Err(Error::NoCapacitySufficient)
    }

    /// Give back `family_members` units of the camp's capacity
    ///
    /// A conflict here means the stored occupancy no longer covers the
    /// family; the counter is left unchanged rather than driven below zero.
    async fn vacate(&self, camp_id: Uuid, family_members: u32) -> Result<()> {
        match self
            .camps
            .adjust_occupancy(camp_id, -i64::from(family_members))
            .await?
        {
            ReserveOutcome::Reserved(camp) => {
                self.refresh_status(camp).await?;
            }
            ReserveOutcome::Conflict => {
                warn!(camp_id = %camp_id, "Occupancy release conflicted, counter left unchanged");
            }
        }
        Ok(())
    }

    async fn refresh_status(&self, camp: Camp) -> Result<Camp> {
        let next = derive_status(camp.status, camp.current_occupancy, camp.capacity);
        if next != camp.status {
            self.camps.set_status(camp.camp_id, next).await?;
        }
        Ok(Camp {
            status: next,
            ..camp
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camp_registry::memory::InMemoryCampRepository;
    use crate::camp_registry::types::{CampResources, CampStatus};
    use crate::refugee_registry::memory::InMemoryRefugeeRepository;
    use crate::refugee_registry::types::Gender;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn camp(name: &str, lat: f64, lon: f64, capacity: u32, occupancy: u32) -> Camp {
        Camp {
            camp_id: Uuid::new_v4(),
            name: name.to_string(),
            address: format!("{} address", name),
            coordinate: Coordinate::new(lat, lon).unwrap(),
            capacity,
            current_occupancy: occupancy,
            resources: CampResources::default(),
            facilities: vec![],
            connected_camps: vec![],
            status: CampStatus::Active,
            managed_by: "Disaster Management Authority".to_string(),
            contact_number: None,
            established_at: Utc::now(),
        }
    }

    fn refugee(lat: f64, lon: f64, family_members: u32) -> Refugee {
        CreateRefugeeRequest {
            name: "Asha".to_string(),
            age: 34,
            gender: Gender::Female,
            contact_number: None,
            address: "old town".to_string(),
            family_members,
            medical_conditions: "None".to_string(),
        }
        .into_refugee(Coordinate::new(lat, lon).unwrap())
    }

    async fn engine_with(
        camps: Vec<Camp>,
        refugees: Vec<Refugee>,
    ) -> (
        AssignmentEngine,
        Arc<InMemoryCampRepository>,
        Arc<InMemoryRefugeeRepository>,
    ) {
        let camp_repo = Arc::new(InMemoryCampRepository::new());
        let refugee_repo = Arc::new(InMemoryRefugeeRepository::new());
        for c in &camps {
            camp_repo.insert(c).await.unwrap();
        }
        for r in &refugees {
            refugee_repo.insert(r).await.unwrap();
        }
        (
            AssignmentEngine::new(camp_repo.clone(), refugee_repo.clone()),
            camp_repo,
            refugee_repo,
        )
    }

    #[tokio::test]
    async fn test_assigns_nearest_camp_with_room() {
        let near = camp("near", 0.0, 0.0, 10, 0);
        let far = camp("far", 10.0, 10.0, 10, 0);
        let person = refugee(0.01, 0.01, 2);
        let person_id = person.refugee_id;
        let near_id = near.camp_id;

        let (engine, camps, refugees) = engine_with(vec![far, near], vec![person]).await;
        let result = engine.assign(person_id).await.unwrap();

        assert_eq!(result.camp.camp_id, near_id);
        assert!(result.distance_km < 5.0);

        let stored_camp = camps.fetch(near_id).await.unwrap().unwrap();
        assert_eq!(stored_camp.current_occupancy, 2);

        let stored_refugee = refugees.fetch(person_id).await.unwrap().unwrap();
        assert_eq!(stored_refugee.status, RefugeeStatus::Assigned);
        assert_eq!(stored_refugee.assigned_camp, Some(near_id));
    }

    #[tokio::test]
    async fn test_family_too_large_for_remaining_space() {
        let only = camp("only", 0.0, 0.0, 10, 8);
        let only_id = only.camp_id;
        let person = refugee(0.0, 0.0, 3);
        let person_id = person.refugee_id;

        let (engine, camps, refugees) = engine_with(vec![only], vec![person]).await;
        let err = engine.assign(person_id).await.unwrap_err();
        assert!(matches!(err, Error::NoCapacitySufficient));

        // Occupancy untouched, refugee still pending
        let stored = camps.fetch(only_id).await.unwrap().unwrap();
        assert_eq!(stored.current_occupancy, 8);
        let stored = refugees.fetch(person_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RefugeeStatus::Pending);
    }

    #[tokio::test]
    async fn test_distinguishes_no_camps_from_no_fit() {
        // No camp accepts intake at all
        let mut closed = camp("closed", 0.0, 0.0, 10, 0);
        closed.status = CampStatus::Inactive;
        let person = refugee(0.0, 0.0, 1);
        let person_id = person.refugee_id;

        let (engine, _, _) = engine_with(vec![closed], vec![person]).await;
        assert!(matches!(
            engine.assign(person_id).await.unwrap_err(),
            Error::NoCampsAvailable
        ));

        // An open camp exists, but not for a family this big
        let tight = camp("tight", 0.0, 0.0, 10, 9);
        let person = refugee(0.0, 0.0, 4);
        let person_id = person.refugee_id;

        let (engine, _, _) = engine_with(vec![tight], vec![person]).await;
        assert!(matches!(
            engine.assign(person_id).await.unwrap_err(),
            Error::NoCapacitySufficient
        ));
    }

    #[tokio::test]
    async fn test_refuses_double_assignment() {
        let site = camp("site", 0.0, 0.0, 10, 0);
        let person = refugee(0.0, 0.0, 1);
        let person_id = person.refugee_id;

        let (engine, _, _) = engine_with(vec![site], vec![person]).await;
        engine.assign(person_id).await.unwrap();

        let err = engine.assign(person_id).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyAssigned(id) if id == person_id));
    }

    #[tokio::test]
    async fn test_unknown_refugee_is_not_found() {
        let (engine, _, _) = engine_with(vec![camp("site", 0.0, 0.0, 10, 0)], vec![]).await;
        let err = engine.assign(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_register_and_assign_keeps_pending_without_camps() {
        let (engine, _, refugees) = engine_with(vec![], vec![]).await;

        let req = CreateRefugeeRequest {
            name: "Asha".to_string(),
            age: 34,
            gender: Gender::Female,
            contact_number: None,
            address: "old town".to_string(),
            family_members: 2,
            medical_conditions: "None".to_string(),
        };
        let outcome = engine
            .register_and_assign(req, Coordinate::new(1.0, 1.0).unwrap())
            .await
            .unwrap();

        let RegistrationOutcome::Pending(pending) = outcome else {
            panic!("expected pending outcome");
        };
        let stored = refugees.fetch(pending.refugee_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RefugeeStatus::Pending);
        assert!(stored.assigned_camp.is_none());
    }

    #[tokio::test]
    async fn test_register_and_assign_with_capacity() {
        let site = camp("site", 0.0, 0.0, 10, 0);
        let site_id = site.camp_id;
        let (engine, camps, _) = engine_with(vec![site], vec![]).await;

        let req = CreateRefugeeRequest {
            name: "Asha".to_string(),
            age: 34,
            gender: Gender::Female,
            contact_number: None,
            address: "old town".to_string(),
            family_members: 4,
            medical_conditions: "None".to_string(),
        };
        let outcome = engine
            .register_and_assign(req, Coordinate::new(0.1, 0.1).unwrap())
            .await
            .unwrap();

        let RegistrationOutcome::Assigned(result) = outcome else {
            panic!("expected assigned outcome");
        };
        assert_eq!(result.camp.camp_id, site_id);
        assert_eq!(
            camps.fetch(site_id).await.unwrap().unwrap().current_occupancy,
            4
        );
    }

    #[tokio::test]
    async fn test_release_returns_capacity_and_detaches() {
        let site = camp("site", 0.0, 0.0, 10, 0);
        let site_id = site.camp_id;
        let person = refugee(0.0, 0.0, 3);
        let person_id = person.refugee_id;

        let (engine, camps, _) = engine_with(vec![site], vec![person]).await;
        engine.assign(person_id).await.unwrap();

        let released = engine.release(person_id).await.unwrap();
        assert_eq!(released.status, RefugeeStatus::Pending);
        assert!(released.assigned_camp.is_none());
        assert_eq!(
            camps.fetch(site_id).await.unwrap().unwrap().current_occupancy,
            0
        );

        // Nothing left to release
        let err = engine.release(person_id).await.unwrap_err();
        assert!(matches!(err, Error::RefugeeNotAssigned(_)));
    }

    #[tokio::test]
    async fn test_discharge_returns_capacity_before_removal() {
        let site = camp("site", 0.0, 0.0, 10, 0);
        let site_id = site.camp_id;
        let person = refugee(0.0, 0.0, 2);
        let person_id = person.refugee_id;

        let (engine, camps, refugees) = engine_with(vec![site], vec![person]).await;
        engine.assign(person_id).await.unwrap();

        engine.discharge(person_id).await.unwrap();
        assert!(refugees.fetch(person_id).await.unwrap().is_none());
        assert_eq!(
            camps.fetch(site_id).await.unwrap().unwrap().current_occupancy,
            0
        );
    }

    #[tokio::test]
    async fn test_full_camp_flips_status_and_reopens_on_release() {
        let site = camp("site", 0.0, 0.0, 2, 0);
        let site_id = site.camp_id;
        let person = refugee(0.0, 0.0, 2);
        let person_id = person.refugee_id;

        let (engine, camps, _) = engine_with(vec![site], vec![person]).await;
        engine.assign(person_id).await.unwrap();
        assert_eq!(
            camps.fetch(site_id).await.unwrap().unwrap().status,
            CampStatus::Full
        );

        engine.release(person_id).await.unwrap();
        assert_eq!(
            camps.fetch(site_id).await.unwrap().unwrap().status,
            CampStatus::Active
        );
    }

    /// Delegating repository that reports one spurious conflict for a target
    /// camp, as a concurrent reservation would
    struct ConflictOnce {
        inner: Arc<InMemoryCampRepository>,
        target: Uuid,
        tripped: AtomicBool,
    }

    #[async_trait]
    impl CampRepository for ConflictOnce {
        async fn insert(&self, camp: &Camp) -> crate::Result<()> {
            self.inner.insert(camp).await
        }
        async fn fetch(&self, camp_id: Uuid) -> crate::Result<Option<Camp>> {
            self.inner.fetch(camp_id).await
        }
        async fn fetch_by_name(&self, name: &str) -> crate::Result<Option<Camp>> {
            self.inner.fetch_by_name(name).await
        }
        async fn list(&self) -> crate::Result<Vec<Camp>> {
            self.inner.list().await
        }
        async fn find_eligible(&self, required_space: u32) -> crate::Result<Vec<Camp>> {
            self.inner.find_eligible(required_space).await
        }
        async fn update(&self, camp: &Camp) -> crate::Result<()> {
            self.inner.update(camp).await
        }
        async fn remove(&self, camp_id: Uuid) -> crate::Result<()> {
            self.inner.remove(camp_id).await
        }
        async fn adjust_occupancy(
            &self,
            camp_id: Uuid,
            delta: i64,
        ) -> crate::Result<ReserveOutcome> {
            if camp_id == self.target && !self.tripped.swap(true, Ordering::SeqCst) {
                return Ok(ReserveOutcome::Conflict);
            }
            self.inner.adjust_occupancy(camp_id, delta).await
        }
        async fn set_status(&self, camp_id: Uuid, status: CampStatus) -> crate::Result<()> {
            self.inner.set_status(camp_id, status).await
        }
        async fn connect(&self, camp_id: Uuid, other: Uuid) -> crate::Result<()> {
            self.inner.connect(camp_id, other).await
        }
    }

    #[tokio::test]
    async fn test_conflict_falls_back_to_next_candidate() {
        let near = camp("near", 0.0, 0.0, 10, 0);
        let far = camp("far", 5.0, 5.0, 10, 0);
        let near_id = near.camp_id;
        let far_id = far.camp_id;
        let person = refugee(0.0, 0.0, 1);
        let person_id = person.refugee_id;

        let inner = Arc::new(InMemoryCampRepository::new());
        inner.insert(&near).await.unwrap();
        inner.insert(&far).await.unwrap();
        let camps = Arc::new(ConflictOnce {
            inner: inner.clone(),
            target: near_id,
            tripped: AtomicBool::new(false),
        });

        let refugees = Arc::new(InMemoryRefugeeRepository::new());
        refugees.insert(&person).await.unwrap();

        let engine = AssignmentEngine::new(camps, refugees);
        let result = engine.assign(person_id).await.unwrap();

        // Nearest camp conflicted, engine moved on to the next one
        assert_eq!(result.camp.camp_id, far_id);
        assert_eq!(
            inner.fetch(near_id).await.unwrap().unwrap().current_occupancy,
            0
        );
        assert_eq!(
            inner.fetch(far_id).await.unwrap().unwrap().current_occupancy,
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_assignments_never_exceed_capacity() {
        const CAPACITY: u32 = 10;
        const REQUESTS: usize = 25;

        let site = camp("site", 0.0, 0.0, CAPACITY, 0);
        let site_id = site.camp_id;

        let people: Vec<Refugee> = (0..REQUESTS).map(|_| refugee(0.0, 0.0, 1)).collect();
        let ids: Vec<Uuid> = people.iter().map(|r| r.refugee_id).collect();

        let (engine, camps, refugees) = engine_with(vec![site], people).await;
        let engine = Arc::new(engine);

        let mut handles = Vec::new();
        for id in ids {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move { engine.assign(id).await }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, CAPACITY as usize);
        let stored = camps.fetch(site_id).await.unwrap().unwrap();
        assert_eq!(stored.current_occupancy, CAPACITY);
        assert_eq!(stored.status, CampStatus::Full);

        // Every assigned record points at the camp, every other stays pending
        let assigned = refugees
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.status == RefugeeStatus::Assigned)
            .count();
        assert_eq!(assigned, CAPACITY as usize);
    }
}
