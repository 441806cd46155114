//! Backend-to-UI events and error modeling for the desktop controller.

use client_core::{
    flows::{EditDraft, PolicyView, SubmitError},
    ServiceError, ValidForm,
};
use shared::{
    domain::{BrandId, CarBrand, CarType, PolicyNumber, PremiumRate},
    error::{ApiError, ErrorCode},
    protocol::PolicySummary,
};

/// Identifies one opening of a modal. Events for any other opening are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModalToken(pub u64);

pub enum UiEvent {
    Info(String),
    Error(UiError),
    PoliciesLoaded(Vec<PolicySummary>),
    PoliciesFailed(UiError),
    CarBrandsLoaded(Vec<CarBrand>),
    RatesLoaded(Vec<PremiumRate>),
    PolicyNumberAllocated {
        token: ModalToken,
        policy_number: PolicyNumber,
    },
    CarTypesLoaded {
        token: ModalToken,
        brand: BrandId,
        car_types: Vec<CarType>,
    },
    ViewReady {
        token: ModalToken,
        view: PolicyView,
    },
    EditReady {
        token: ModalToken,
        draft: EditDraft,
    },
    ModalLoadFailed {
        token: ModalToken,
        error: UiError,
    },
    PolicyCreated {
        token: ModalToken,
        form: ValidForm,
    },
    PolicyUpdated {
        token: ModalToken,
        form: ValidForm,
    },
    PolicyDeleted {
        token: ModalToken,
        policy_number: PolicyNumber,
    },
    SubmitFailed {
        token: ModalToken,
        error: UiError,
    },
}

impl UiEvent {
    /// Modal the event belongs to, if it is modal-scoped.
    pub fn token(&self) -> Option<ModalToken> {
        match self {
            Self::PolicyNumberAllocated { token, .. }
            | Self::CarTypesLoaded { token, .. }
            | Self::ViewReady { token, .. }
            | Self::EditReady { token, .. }
            | Self::ModalLoadFailed { token, .. }
            | Self::PolicyCreated { token, .. }
            | Self::PolicyUpdated { token, .. }
            | Self::PolicyDeleted { token, .. }
            | Self::SubmitFailed { token, .. } => Some(*token),
            Self::Info(_)
            | Self::Error(_)
            | Self::PoliciesLoaded(_)
            | Self::PoliciesFailed(_)
            | Self::CarBrandsLoaded(_)
            | Self::RatesLoaded(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Rejected,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadPolicies,
    AddPolicy,
    ViewPolicy,
    EditPolicy,
    DeletePolicy,
}

impl UiErrorContext {
    pub fn title(self) -> &'static str {
        match self {
            Self::BackendStartup => "Startup failed",
            Self::LoadPolicies => "Could not load policies",
            Self::AddPolicy => "Could not create policy",
            Self::ViewPolicy => "Could not open policy",
            Self::EditPolicy => "Could not update policy",
            Self::DeletePolicy => "Could not delete policy",
        }
    }
}

const UNREACHABLE_MESSAGE: &str =
    "The policy service could not be reached or sent an unreadable reply; check the connection and retry.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("required")
            || message_lower.contains("not been allocated")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("transport")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Rejections keep the server's message verbatim; transport and decode
    /// failures collapse into one generic message.
    pub fn from_api(context: UiErrorContext, err: ApiError) -> Self {
        let (category, message) = match err.code {
            ErrorCode::Rejected | ErrorCode::NotFound => (UiErrorCategory::Rejected, err.message),
            ErrorCode::Transport | ErrorCode::Decode => {
                (UiErrorCategory::Transport, UNREACHABLE_MESSAGE.to_string())
            }
            ErrorCode::Validation => (UiErrorCategory::Validation, err.message),
        };
        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_service(context: UiErrorContext, err: &ServiceError) -> Self {
        Self::from_api(context, err.into())
    }

    pub fn from_submit(context: UiErrorContext, err: &SubmitError) -> Self {
        Self::from_api(context, err.into())
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
