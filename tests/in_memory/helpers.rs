//! Shared helpers for in-memory integration tests.

use invigilo::assignment::{
    adapters::memory::InMemoryAssignmentStore,
    domain::{ExamCenter, ExamCenterId, InvigilatorId, InvigilatorProfile, School},
    services::{
        AllocationService, AssignmentTaskService, RegisterExamCenterRequest,
        RegisterInvigilatorRequest, RegisterSchoolRequest, RegistryService,
    },
};
use mockable::DefaultClock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

pub const DISTRICT: &str = "North Ridge";

/// A registered district: schools, one center each, and invigilator benches.
pub struct DistrictFixture {
    pub store: Arc<InMemoryAssignmentStore>,
    pub clock: Arc<DefaultClock>,
    pub schools: Vec<School>,
    pub centers: Vec<ExamCenter>,
    pub benches: Vec<Vec<InvigilatorProfile>>,
}

impl DistrictFixture {
    pub fn registry(&self) -> RegistryService<InMemoryAssignmentStore> {
        RegistryService::new(Arc::clone(&self.store))
    }

    pub fn tasks(&self) -> AssignmentTaskService<InMemoryAssignmentStore, DefaultClock> {
        AssignmentTaskService::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    pub fn allocator(
        &self,
        seed: u64,
    ) -> AllocationService<InMemoryAssignmentStore, DefaultClock, StdRng> {
        AllocationService::with_rng(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn center_id(&self, school_index: usize) -> ExamCenterId {
        self.centers[school_index].id()
    }

    /// Flattens the benches of the given schools into one eligibility pool.
    pub fn pool_from_schools(&self, school_indexes: &[usize]) -> Vec<InvigilatorId> {
        school_indexes
            .iter()
            .flat_map(|index| self.benches[*index].iter().map(InvigilatorProfile::id))
            .collect()
    }
}

/// Registers `school_count` schools with one center and `bench_size`
/// invigilators each.
pub async fn district(school_count: usize, bench_size: usize) -> DistrictFixture {
    let store = Arc::new(InMemoryAssignmentStore::new());
    let clock = Arc::new(DefaultClock);
    let registry = RegistryService::new(Arc::clone(&store));

    let mut schools = Vec::with_capacity(school_count);
    let mut centers = Vec::with_capacity(school_count);
    let mut benches = Vec::with_capacity(school_count);
    for index in 0..school_count {
        let school = registry
            .register_school(RegisterSchoolRequest::new(
                format!("SK Taman {index}"),
                format!("SCH-{index:03}"),
                DISTRICT,
                format!("{index} Jalan Besar"),
            ))
            .await
            .expect("school registration should succeed");
        let center = registry
            .register_exam_center(RegisterExamCenterRequest::new(
                format!("EC-{index:03}"),
                format!("SR-{index}"),
                school.id(),
            ))
            .await
            .expect("center registration should succeed");

        let mut bench = Vec::with_capacity(bench_size);
        for seat in 0..bench_size {
            let profile = registry
                .register_invigilator(RegisterInvigilatorRequest::new(
                    format!("Teacher {index}-{seat}"),
                    school.id(),
                ))
                .await
                .expect("invigilator registration should succeed");
            bench.push(profile);
        }

        schools.push(school);
        centers.push(center);
        benches.push(bench);
    }

    DistrictFixture {
        store,
        clock,
        schools,
        centers,
        benches,
    }
}
