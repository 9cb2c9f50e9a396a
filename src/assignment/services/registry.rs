//! Service layer for the school, exam center, and invigilator registry.
//!
//! The registry is the engine's view of the district office's master data.
//! It shares the assignment store so that cascades touching center task
//! lists and invigilator profiles commit atomically with the rest of the
//! graph.

use crate::assignment::{
    domain::{
        AssignmentDomainError, CenterCode, District, ExamCenter, ExamCenterId, InvigilatorId,
        InvigilatorProfile, School, SchoolCode, SchoolId,
    },
    ports::{AssignmentStore, StoreError, WriteBatch, WriteOp},
};
use std::sync::Arc;
use thiserror::Error;

/// Request payload for registering a school.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSchoolRequest {
    name: String,
    code: String,
    district: String,
    address: String,
}

impl RegisterSchoolRequest {
    /// Creates a request with all required school fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        district: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            district: district.into(),
            address: address.into(),
        }
    }
}

/// Request payload for registering an exam center under a school.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterExamCenterRequest {
    code: String,
    safe_room_no: String,
    school: SchoolId,
}

impl RegisterExamCenterRequest {
    /// Creates a request with all required exam center fields.
    #[must_use]
    pub fn new(code: impl Into<String>, safe_room_no: impl Into<String>, school: SchoolId) -> Self {
        Self {
            code: code.into(),
            safe_room_no: safe_room_no.into(),
            school,
        }
    }
}

/// Request payload for registering an invigilator profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterInvigilatorRequest {
    name: String,
    home_school: SchoolId,
    email: Option<String>,
}

impl RegisterInvigilatorRequest {
    /// Creates a request with the required profile fields.
    #[must_use]
    pub fn new(name: impl Into<String>, home_school: SchoolId) -> Self {
        Self {
            name: name.into(),
            home_school,
            email: None,
        }
    }

    /// Sets the contact email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Service-level errors for registry operations.
#[derive(Debug, Error)]
pub enum RegistryServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] AssignmentDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for registry service operations.
pub type RegistryServiceResult<T> = Result<T, RegistryServiceError>;

/// Registration and lookup service over the shared assignment store.
#[derive(Clone)]
pub struct RegistryService<S>
where
    S: AssignmentStore,
{
    store: Arc<S>,
}

impl<S> RegistryService<S>
where
    S: AssignmentStore,
{
    /// Creates a new registry service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Registers a new school.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError`] when validation fails or the school
    /// code is already taken.
    pub async fn register_school(
        &self,
        request: RegisterSchoolRequest,
    ) -> RegistryServiceResult<School> {
        let code = SchoolCode::new(request.code)?;
        let district = District::new(request.district)?;
        let school = School::new(request.name, code, district, request.address)?;

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::PutSchool(school.clone()));
        self.store.commit(batch).await?;
        Ok(school)
    }

    /// Registers a new exam center hosted by an existing school.
    ///
    /// The center inherits the school's district, and the school's hosted
    /// center list is updated in the same commit.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError`] when validation fails, the school
    /// does not exist, or the center code is already taken.
    pub async fn register_exam_center(
        &self,
        request: RegisterExamCenterRequest,
    ) -> RegistryServiceResult<ExamCenter> {
        let code = CenterCode::new(request.code)?;
        let mut school = self
            .store
            .find_school(request.school)
            .await?
            .ok_or(StoreError::SchoolNotFound(request.school))?;

        let center = ExamCenter::new(
            code,
            request.safe_room_no,
            school.district().clone(),
            school.id(),
        );
        school.attach_exam_center(center.id());

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::PutExamCenter(center.clone()));
        batch.push(WriteOp::PutSchool(school));
        self.store.commit(batch).await?;
        Ok(center)
    }

    /// Registers a new invigilator profile.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError`] when validation fails or the home
    /// school does not exist.
    pub async fn register_invigilator(
        &self,
        request: RegisterInvigilatorRequest,
    ) -> RegistryServiceResult<InvigilatorProfile> {
        self.store
            .find_school(request.home_school)
            .await?
            .ok_or(StoreError::SchoolNotFound(request.home_school))?;

        let mut profile = InvigilatorProfile::new(request.name, request.home_school)?;
        if let Some(email) = request.email {
            profile = profile.with_email(email);
        }

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::PutInvigilator(profile.clone()));
        self.store.commit(batch).await?;
        Ok(profile)
    }

    /// Finds a school by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Store`] when the lookup fails.
    pub async fn find_school(&self, id: SchoolId) -> RegistryServiceResult<Option<School>> {
        Ok(self.store.find_school(id).await?)
    }

    /// Finds an exam center by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Store`] when the lookup fails.
    pub async fn find_exam_center(
        &self,
        id: ExamCenterId,
    ) -> RegistryServiceResult<Option<ExamCenter>> {
        Ok(self.store.find_exam_center(id).await?)
    }

    /// Finds an invigilator profile by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Store`] when the lookup fails.
    pub async fn find_invigilator(
        &self,
        id: InvigilatorId,
    ) -> RegistryServiceResult<Option<InvigilatorProfile>> {
        Ok(self.store.find_invigilator(id).await?)
    }
}
