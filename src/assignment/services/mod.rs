//! Orchestration services for the assignment engine.

mod allocation;
mod cascade;
mod registry;
mod tasks;

pub use allocation::{
    AllocationService, AllocationServiceError, AllocationServiceResult, EditResultSetRequest,
    ReallocationPolicy, ResolvedCenterAllocation, ResolvedInvigilator, ResolvedResultSet,
};
pub use registry::{
    RegisterExamCenterRequest, RegisterInvigilatorRequest, RegisterSchoolRequest,
    RegistryService, RegistryServiceError, RegistryServiceResult,
};
pub use tasks::{
    AssignmentTaskService, CreateTaskRequest, EditTaskRequest, RoleDemand,
    SubmitRequirementsRequest, TaskServiceError, TaskServiceResult,
};
