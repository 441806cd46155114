//! Backend commands queued from UI to backend worker.

use client_core::ValidForm;
use shared::domain::{BrandId, PolicyNumber};

use crate::controller::events::ModalToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    LoadPolicies,
    /// Brands and rates, fetched as two independent tasks.
    LoadReferenceData,
    AllocatePolicyNumber {
        token: ModalToken,
    },
    LoadCarTypes {
        token: ModalToken,
        brand: BrandId,
    },
    OpenView {
        token: ModalToken,
        policy_number: PolicyNumber,
    },
    OpenEdit {
        token: ModalToken,
        policy_number: PolicyNumber,
    },
    SubmitAdd {
        token: ModalToken,
        form: ValidForm,
    },
    SubmitEdit {
        token: ModalToken,
        form: ValidForm,
    },
    DeletePolicy {
        token: ModalToken,
        policy_number: PolicyNumber,
    },
    /// Aborts every task still running for a closed modal.
    CancelModal {
        token: ModalToken,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadPolicies => "load_policies",
            Self::LoadReferenceData => "load_reference_data",
            Self::AllocatePolicyNumber { .. } => "allocate_policy_number",
            Self::LoadCarTypes { .. } => "load_car_types",
            Self::OpenView { .. } => "open_view",
            Self::OpenEdit { .. } => "open_edit",
            Self::SubmitAdd { .. } => "submit_add",
            Self::SubmitEdit { .. } => "submit_edit",
            Self::DeletePolicy { .. } => "delete_policy",
            Self::CancelModal { .. } => "cancel_modal",
        }
    }

    pub fn token(&self) -> Option<ModalToken> {
        match self {
            Self::LoadPolicies | Self::LoadReferenceData => None,
            Self::AllocatePolicyNumber { token }
            | Self::LoadCarTypes { token, .. }
            | Self::OpenView { token, .. }
            | Self::OpenEdit { token, .. }
            | Self::SubmitAdd { token, .. }
            | Self::SubmitEdit { token, .. }
            | Self::DeletePolicy { token, .. }
            | Self::CancelModal { token } => Some(*token),
        }
    }
}
