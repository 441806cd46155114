use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{ActorId, BrandId, CarBrand, CarType, PolicyNumber, PremiumRate},
    error::{ApiError, ErrorCode},
    protocol::{
        CreatePolicyForm, DeletePolicyRequest, Envelope, NewPolicyNumber, OneOrMany,
        PolicyDetail, PolicySummary, UpdatePolicyRequest,
    },
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub mod flows;
pub mod form;
pub mod premium;
pub mod presenter;

pub use form::{ErrorMap, FormState, PolicyField, ValidForm};
pub use premium::{compute_premium, premium_for, RateInput};

const STATUS_OK: u16 = 200;
const STATUS_CREATED: u16 = 201;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("{message}")]
    Rejected { status_code: u16, message: String },
    #[error("response carried no data")]
    MissingData,
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) => ErrorCode::Transport,
            Self::Decode(_) | Self::MissingData => ErrorCode::Decode,
            Self::Rejected { status_code: 404, .. } => ErrorCode::NotFound,
            Self::Rejected { .. } => ErrorCode::Rejected,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl From<&ServiceError> for ApiError {
    fn from(value: &ServiceError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}

/// The principal on whose behalf mutations are submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    actor: ActorId,
}

impl AuthContext {
    pub fn new(actor: ActorId) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }
}

/// Operations exposed by the remote Policy Service.
#[async_trait]
pub trait PolicyService: Send + Sync {
    async fn list_policies(&self) -> Result<Vec<PolicySummary>, ServiceError>;
    async fn fetch_policy(&self, policy_number: &PolicyNumber)
        -> Result<PolicyDetail, ServiceError>;
    async fn create_policy(&self, form: &CreatePolicyForm) -> Result<(), ServiceError>;
    async fn update_policy(&self, request: &UpdatePolicyRequest) -> Result<(), ServiceError>;
    async fn delete_policy(&self, policy_number: &PolicyNumber) -> Result<(), ServiceError>;
    async fn new_policy_number(&self) -> Result<PolicyNumber, ServiceError>;
    async fn list_car_brands(&self) -> Result<Vec<CarBrand>, ServiceError>;
    async fn list_car_types(&self, brand: &BrandId) -> Result<Vec<CarType>, ServiceError>;
    async fn list_rates(&self) -> Result<Vec<PremiumRate>, ServiceError>;
}

pub struct HttpPolicyClient {
    http: Client,
    base_url: String,
}

impl HttpPolicyClient {
    pub fn new(base_url: &Url) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: &Url, timeout: Option<Duration>) -> Result<Self, ServiceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: Response,
    ) -> Result<Envelope<T>, ServiceError> {
        let http_status = response.status();
        let body = response.text().await?;
        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !http_status.is_success() => Err(ServiceError::Rejected {
                status_code: http_status.as_u16(),
                message: format!("HTTP {http_status}"),
            }),
            Err(err) => Err(ServiceError::Decode(err.to_string())),
        }
    }

    fn expect_status<T>(envelope: Envelope<T>, expected: u16) -> Result<Option<T>, ServiceError> {
        if envelope.succeeded_with(expected) {
            Ok(envelope.data)
        } else {
            Err(ServiceError::Rejected {
                status_code: envelope.status_code,
                message: envelope.failure_message(),
            })
        }
    }

    /// Reference-data endpoints are read without a status check; a missing
    /// payload reads as an empty list.
    async fn reference_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ServiceError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .query(query)
            .send()
            .await?;
        let envelope: Envelope<OneOrMany<T>> = Self::read_envelope(response).await?;
        if !envelope.succeeded_with(STATUS_OK) {
            warn!(
                path,
                status_code = envelope.status_code,
                "reference data request was not successful"
            );
        }
        Ok(envelope.data.map(OneOrMany::into_vec).unwrap_or_default())
    }
}

#[async_trait]
impl PolicyService for HttpPolicyClient {
    async fn list_policies(&self) -> Result<Vec<PolicySummary>, ServiceError> {
        let response = self.http.get(self.endpoint("policies")).send().await?;
        let envelope = Self::read_envelope::<Vec<PolicySummary>>(response).await?;
        Ok(Self::expect_status(envelope, STATUS_OK)?.unwrap_or_default())
    }

    async fn fetch_policy(
        &self,
        policy_number: &PolicyNumber,
    ) -> Result<PolicyDetail, ServiceError> {
        let response = self
            .http
            .get(self.endpoint("policies"))
            .query(&[("policy_number", policy_number.as_str())])
            .send()
            .await?;
        let envelope = Self::read_envelope::<PolicyDetail>(response).await?;
        Self::expect_status(envelope, STATUS_OK)?.ok_or(ServiceError::MissingData)
    }

    async fn create_policy(&self, form: &CreatePolicyForm) -> Result<(), ServiceError> {
        let response = self
            .http
            .post(self.endpoint("policies"))
            .form(form)
            .send()
            .await?;
        let envelope = Self::read_envelope::<serde_json::Value>(response).await?;
        if envelope.succeeded_with(STATUS_CREATED) {
            debug!(
                policy_number = %form.policy_number,
                message = envelope.message.as_deref().unwrap_or_default(),
                "policy created"
            );
        }
        Self::expect_status(envelope, STATUS_CREATED).map(|_| ())
    }

    async fn update_policy(&self, request: &UpdatePolicyRequest) -> Result<(), ServiceError> {
        let response = self
            .http
            .put(self.endpoint("policies"))
            .json(request)
            .send()
            .await?;
        let envelope = Self::read_envelope::<serde_json::Value>(response).await?;
        Self::expect_status(envelope, STATUS_OK).map(|_| ())
    }

    async fn delete_policy(&self, policy_number: &PolicyNumber) -> Result<(), ServiceError> {
        let response = self
            .http
            .delete(self.endpoint("policies"))
            .json(&DeletePolicyRequest {
                policy_number: policy_number.clone(),
            })
            .send()
            .await?;
        let envelope = Self::read_envelope::<serde_json::Value>(response).await?;
        Self::expect_status(envelope, STATUS_OK).map(|_| ())
    }

    async fn new_policy_number(&self) -> Result<PolicyNumber, ServiceError> {
        let response = self
            .http
            .get(self.endpoint("policies/new-number"))
            .send()
            .await?;
        let envelope = Self::read_envelope::<NewPolicyNumber>(response).await?;
        Self::expect_status(envelope, STATUS_OK)?
            .map(|allocated| allocated.policy_number)
            .ok_or(ServiceError::MissingData)
    }

    async fn list_car_brands(&self) -> Result<Vec<CarBrand>, ServiceError> {
        self.reference_list("car-brands", &[]).await
    }

    async fn list_car_types(&self, brand: &BrandId) -> Result<Vec<CarType>, ServiceError> {
        let mut car_types: Vec<CarType> = self
            .reference_list("car-types", &[("brand", brand.as_str())])
            .await?;
        for car_type in &mut car_types {
            if car_type.brand_uid.is_empty() {
                car_type.brand_uid = brand.clone();
            }
        }
        Ok(car_types)
    }

    async fn list_rates(&self) -> Result<Vec<PremiumRate>, ServiceError> {
        self.reference_list("rates", &[]).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
