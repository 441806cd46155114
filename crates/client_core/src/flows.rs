//! Service-side steps of the list and modal flows.
//!
//! Each function is one network-bound step a modal controller awaits; the
//! state machine that decides when to call them lives with the UI.

use shared::{
    domain::{split_car_name, BrandId, CarBrand, CarType, PolicyNumber, PremiumRate},
    error::{ApiError, ErrorCode},
    protocol::{PolicyDetail, PolicySummary},
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{form::FormState, AuthContext, PolicyService, ServiceError, ValidForm};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("policy number has not been allocated; reopen the form to request a new one")]
    MissingPolicyNumber,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<&SubmitError> for ApiError {
    fn from(value: &SubmitError) -> Self {
        match value {
            SubmitError::MissingPolicyNumber => {
                ApiError::new(ErrorCode::Validation, value.to_string())
            }
            SubmitError::Service(err) => err.into(),
        }
    }
}

/// Read-only presentation of a single policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyView {
    pub detail: PolicyDetail,
    pub brand_name: String,
    pub type_name: String,
}

/// Everything the Edit modal needs before it becomes interactive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub form: FormState,
    pub car_types: Vec<CarType>,
}

pub async fn load_policies(
    service: &dyn PolicyService,
) -> Result<Vec<PolicySummary>, ServiceError> {
    let policies = service.list_policies().await.map_err(|err| {
        error!("failed to fetch policies: {err}");
        err
    })?;
    info!(count = policies.len(), "policies loaded");
    Ok(policies)
}

pub async fn load_car_brands(service: &dyn PolicyService) -> Vec<CarBrand> {
    service.list_car_brands().await.unwrap_or_else(|err| {
        warn!("failed to fetch car brands, continuing without them: {err}");
        Vec::new()
    })
}

pub async fn load_rates(service: &dyn PolicyService) -> Vec<PremiumRate> {
    service.list_rates().await.unwrap_or_else(|err| {
        warn!("failed to fetch premium rates, continuing without them: {err}");
        Vec::new()
    })
}

pub async fn load_car_types(service: &dyn PolicyService, brand: &BrandId) -> Vec<CarType> {
    if brand.is_empty() {
        return Vec::new();
    }
    service.list_car_types(brand).await.unwrap_or_else(|err| {
        warn!(brand = %brand, "failed to fetch car types: {err}");
        Vec::new()
    })
}

/// Requests a fresh policy number. A failure leaves it empty so the Add form
/// can still open; submission refuses an empty number.
pub async fn allocate_policy_number(service: &dyn PolicyService) -> PolicyNumber {
    match service.new_policy_number().await {
        Ok(policy_number) => policy_number,
        Err(err) => {
            warn!("failed to allocate a new policy number: {err}");
            PolicyNumber::default()
        }
    }
}

pub async fn open_view(
    service: &dyn PolicyService,
    policy_number: &PolicyNumber,
) -> Result<PolicyView, ServiceError> {
    let detail = service.fetch_policy(policy_number).await?;
    let (brand_name, type_name) = split_car_name(&detail.summary.car_name);
    Ok(PolicyView {
        detail,
        brand_name,
        type_name,
    })
}

/// Policy first, then the car types of its brand; the draft is only complete
/// once both have arrived.
pub async fn open_edit(
    service: &dyn PolicyService,
    policy_number: &PolicyNumber,
) -> Result<EditDraft, ServiceError> {
    let detail = service.fetch_policy(policy_number).await?;
    let form = FormState::from_detail(&detail);
    let car_types = load_car_types(service, &form.car_brand).await;
    Ok(EditDraft { form, car_types })
}

pub async fn submit_add(
    service: &dyn PolicyService,
    form: &ValidForm,
    auth: &AuthContext,
) -> Result<(), SubmitError> {
    if form.policy_number.is_empty() {
        return Err(SubmitError::MissingPolicyNumber);
    }
    service.create_policy(&form.to_create_form(auth)).await?;
    info!(policy_number = %form.policy_number, actor = %auth.actor(), "policy created");
    Ok(())
}

pub async fn submit_edit(
    service: &dyn PolicyService,
    form: &ValidForm,
    auth: &AuthContext,
) -> Result<(), SubmitError> {
    if form.policy_number.is_empty() {
        return Err(SubmitError::MissingPolicyNumber);
    }
    service.update_policy(&form.to_update_request(auth)).await?;
    info!(policy_number = %form.policy_number, actor = %auth.actor(), "policy updated");
    Ok(())
}

pub async fn confirm_delete(
    service: &dyn PolicyService,
    policy_number: &PolicyNumber,
) -> Result<(), ServiceError> {
    service.delete_policy(policy_number).await?;
    info!(policy_number = %policy_number, "policy deleted");
    Ok(())
}

#[cfg(test)]
#[path = "tests/flows_tests.rs"]
mod tests;
