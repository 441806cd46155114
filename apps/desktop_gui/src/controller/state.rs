//! Application state owned by the UI thread and the modal state machine.
//!
//! Every user action returns the backend commands it needs queued; every
//! backend event is folded in through [`AppState::apply`]. Nothing here
//! touches egui, so transitions are tested directly.

use client_core::{flows::PolicyView, FormState, PolicyField, RateInput, ValidForm};
use shared::{
    domain::{BrandId, CarBrand, CarType, CarTypeId, PolicyNumber, PremiumRate, RateId},
    protocol::PolicySummary,
};
use tracing::debug;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{ModalToken, UiError, UiEvent},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Loading,
    Ready,
    Submitting,
}

/// Add and Edit share one shape: a form plus the car types of its brand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormModal {
    pub token: ModalToken,
    pub phase: ModalPhase,
    pub form: FormState,
    pub car_types: Vec<CarType>,
    /// Free-text percentage, kept apart from the rate picked from the list.
    pub custom_rate: String,
}

impl FormModal {
    fn loading(token: ModalToken, form: FormState) -> Self {
        Self {
            token,
            phase: ModalPhase::Loading,
            form,
            car_types: Vec::new(),
            custom_rate: String::new(),
        }
    }

    fn begin_submit(&mut self) -> Option<ValidForm> {
        if self.phase != ModalPhase::Ready {
            return None;
        }
        match self.form.check() {
            Ok(valid) => {
                self.phase = ModalPhase::Submitting;
                Some(valid)
            }
            Err(errors) => {
                debug!(fields = errors.len(), "form has validation errors");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModal {
    pub token: ModalToken,
    pub phase: ModalPhase,
    pub policy_number: PolicyNumber,
    pub view: Option<PolicyView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteModal {
    pub token: ModalToken,
    pub phase: ModalPhase,
    pub policy_number: PolicyNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Add(FormModal),
    View(ViewModal),
    Edit(FormModal),
    ConfirmDelete(DeleteModal),
}

impl ModalState {
    pub fn token(&self) -> Option<ModalToken> {
        match self {
            Self::Closed => None,
            Self::Add(modal) | Self::Edit(modal) => Some(modal.token),
            Self::View(modal) => Some(modal.token),
            Self::ConfirmDelete(modal) => Some(modal.token),
        }
    }

    pub fn phase(&self) -> Option<ModalPhase> {
        match self {
            Self::Closed => None,
            Self::Add(modal) | Self::Edit(modal) => Some(modal.phase),
            Self::View(modal) => Some(modal.phase),
            Self::ConfirmDelete(modal) => Some(modal.phase),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// A modal waiting on a save or delete stays up until the service answers.
    pub fn can_close(&self) -> bool {
        self.phase() != Some(ModalPhase::Submitting)
    }

    pub fn form_modal(&self) -> Option<&FormModal> {
        match self {
            Self::Add(modal) | Self::Edit(modal) => Some(modal),
            _ => None,
        }
    }

    pub fn form_modal_mut(&mut self) -> Option<&mut FormModal> {
        match self {
            Self::Add(modal) | Self::Edit(modal) => Some(modal),
            _ => None,
        }
    }

    fn set_phase(&mut self, phase: ModalPhase) {
        match self {
            Self::Closed => {}
            Self::Add(modal) | Self::Edit(modal) => modal.phase = phase,
            Self::View(modal) => modal.phase = phase,
            Self::ConfirmDelete(modal) => modal.phase = phase,
        }
    }
}

/// One edit made in an Add or Edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormInput {
    Insured(String),
    EffectiveDate(String),
    ExpirationDate(String),
    Brand(BrandId),
    CarType(CarTypeId),
    CarYear(String),
    CarPrice(String),
    /// Focus left the price field; regroup its digits.
    CarPriceCommitted,
    Rate(RateId),
    CustomRate(String),
}

#[derive(Debug, Default)]
pub struct AppState {
    pub policies: Vec<PolicySummary>,
    pub brands: Vec<CarBrand>,
    pub rates: Vec<PremiumRate>,
    pub loading: bool,
    pub modal: ModalState,
    pub alert: Option<UiError>,
    pub status: String,
    last_token: u64,
}

impl AppState {
    /// Policies, brands and rates load independently; only the policy fetch
    /// drives the loading indicator.
    pub fn mount(&mut self) -> Vec<BackendCommand> {
        self.loading = true;
        vec![BackendCommand::LoadPolicies, BackendCommand::LoadReferenceData]
    }

    pub fn reload(&mut self) -> Vec<BackendCommand> {
        self.loading = true;
        vec![BackendCommand::LoadPolicies]
    }

    fn mint_token(&mut self) -> ModalToken {
        self.last_token += 1;
        ModalToken(self.last_token)
    }

    fn modal_locked(&self) -> bool {
        let locked = !self.modal.can_close();
        if locked {
            debug!("modal is submitting; keeping it open");
        }
        locked
    }

    fn replace_modal(&mut self, next: ModalState) -> Vec<BackendCommand> {
        let previous = std::mem::replace(&mut self.modal, next);
        previous
            .token()
            .map(|token| BackendCommand::CancelModal { token })
            .into_iter()
            .collect()
    }

    pub fn open_add(&mut self, current_year: i32) -> Vec<BackendCommand> {
        if self.modal_locked() {
            return Vec::new();
        }
        let token = self.mint_token();
        let form = FormState::for_new_policy(current_year);
        let mut cmds = self.replace_modal(ModalState::Add(FormModal::loading(token, form)));
        cmds.push(BackendCommand::AllocatePolicyNumber { token });
        cmds
    }

    pub fn open_view(&mut self, policy_number: PolicyNumber) -> Vec<BackendCommand> {
        if self.modal_locked() {
            return Vec::new();
        }
        let token = self.mint_token();
        let mut cmds = self.replace_modal(ModalState::View(ViewModal {
            token,
            phase: ModalPhase::Loading,
            policy_number: policy_number.clone(),
            view: None,
        }));
        cmds.push(BackendCommand::OpenView {
            token,
            policy_number,
        });
        cmds
    }

    pub fn open_edit(&mut self, policy_number: PolicyNumber) -> Vec<BackendCommand> {
        if self.modal_locked() {
            return Vec::new();
        }
        let token = self.mint_token();
        let mut form = FormState::default();
        form.policy_number = policy_number.clone();
        let mut cmds = self.replace_modal(ModalState::Edit(FormModal::loading(token, form)));
        cmds.push(BackendCommand::OpenEdit {
            token,
            policy_number,
        });
        cmds
    }

    pub fn open_delete(&mut self, policy_number: PolicyNumber) -> Vec<BackendCommand> {
        if self.modal_locked() {
            return Vec::new();
        }
        let token = self.mint_token();
        self.replace_modal(ModalState::ConfirmDelete(DeleteModal {
            token,
            phase: ModalPhase::Ready,
            policy_number,
        }))
    }

    pub fn close_modal(&mut self) -> Vec<BackendCommand> {
        if self.modal_locked() {
            return Vec::new();
        }
        self.replace_modal(ModalState::Closed)
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn edit_form(&mut self, input: FormInput) -> Vec<BackendCommand> {
        let rates = &self.rates;
        let Some(modal) = self.modal.form_modal_mut() else {
            return Vec::new();
        };
        if modal.phase != ModalPhase::Ready {
            return Vec::new();
        }
        let form = &mut modal.form;

        match input {
            FormInput::Insured(value) => {
                form.insured = value;
                form.touch(PolicyField::Insured);
            }
            FormInput::EffectiveDate(value) => {
                form.effective_date = value;
                form.touch(PolicyField::EffectiveDate);
            }
            FormInput::ExpirationDate(value) => {
                form.expiration_date = value;
                form.touch(PolicyField::ExpirationDate);
            }
            FormInput::Brand(brand) => {
                if !form.select_brand(brand.clone()) {
                    return Vec::new();
                }
                modal.car_types.clear();
                if brand.is_empty() {
                    return Vec::new();
                }
                return vec![BackendCommand::LoadCarTypes {
                    token: modal.token,
                    brand,
                }];
            }
            FormInput::CarType(car_type) => form.select_car_type(car_type),
            FormInput::CarYear(value) => {
                form.car_year = value;
                form.touch(PolicyField::CarYear);
            }
            FormInput::CarPrice(raw) => form.set_car_price(&raw, rates),
            FormInput::CarPriceCommitted => form.reformat_car_price(rates),
            FormInput::Rate(rate_id) => {
                modal.custom_rate.clear();
                form.set_premium_rate(Some(RateInput::Reference(rate_id)), rates);
            }
            FormInput::CustomRate(raw) => {
                form.set_premium_rate(RateInput::resolve(&raw, rates), rates);
                modal.custom_rate = raw;
            }
        }
        Vec::new()
    }

    /// Confirm in whichever modal is open. Invalid forms stay open with
    /// their field errors and nothing is sent.
    pub fn submit(&mut self) -> Vec<BackendCommand> {
        let cmd = match &mut self.modal {
            ModalState::Add(modal) => modal
                .begin_submit()
                .map(|form| BackendCommand::SubmitAdd {
                    token: modal.token,
                    form,
                }),
            ModalState::Edit(modal) => modal
                .begin_submit()
                .map(|form| BackendCommand::SubmitEdit {
                    token: modal.token,
                    form,
                }),
            ModalState::ConfirmDelete(modal) if modal.phase == ModalPhase::Ready => {
                modal.phase = ModalPhase::Submitting;
                Some(BackendCommand::DeletePolicy {
                    token: modal.token,
                    policy_number: modal.policy_number.clone(),
                })
            }
            _ => None,
        };
        cmd.into_iter().collect()
    }

    pub fn apply(&mut self, event: UiEvent) -> Vec<BackendCommand> {
        if let Some(token) = event.token() {
            if self.modal.token() != Some(token) {
                debug!(token = token.0, "dropping event for a modal that is no longer open");
                return Vec::new();
            }
        }

        match event {
            UiEvent::Info(message) => self.status = message,
            UiEvent::Error(error) => self.alert = Some(error),
            UiEvent::PoliciesLoaded(policies) => {
                self.status = format!("Loaded {} policies", policies.len());
                self.policies = policies;
                self.loading = false;
            }
            UiEvent::PoliciesFailed(error) => {
                self.loading = false;
                self.status = error.message().to_string();
            }
            UiEvent::CarBrandsLoaded(brands) => self.brands = brands,
            UiEvent::RatesLoaded(rates) => self.rates = rates,
            UiEvent::PolicyNumberAllocated { policy_number, .. } => {
                if let ModalState::Add(modal) = &mut self.modal {
                    if modal.phase == ModalPhase::Loading {
                        modal.form.policy_number = policy_number;
                        modal.phase = ModalPhase::Ready;
                    }
                }
            }
            UiEvent::CarTypesLoaded {
                brand, car_types, ..
            } => {
                if let Some(modal) = self.modal.form_modal_mut() {
                    if modal.form.car_brand == brand {
                        modal.car_types = car_types;
                    } else {
                        debug!(brand = %brand, "dropping car types for a deselected brand");
                    }
                }
            }
            UiEvent::ViewReady { view, .. } => {
                if let ModalState::View(modal) = &mut self.modal {
                    modal.view = Some(view);
                    modal.phase = ModalPhase::Ready;
                }
            }
            UiEvent::EditReady { draft, .. } => {
                if let ModalState::Edit(modal) = &mut self.modal {
                    modal.custom_rate = match &draft.form.premium_rate {
                        Some(RateInput::Literal(percentage)) => percentage.normalize().to_string(),
                        _ => String::new(),
                    };
                    modal.form = draft.form;
                    modal.car_types = draft.car_types;
                    modal.phase = ModalPhase::Ready;
                }
            }
            UiEvent::ModalLoadFailed { error, .. } => {
                self.modal = ModalState::Closed;
                self.alert = Some(error);
            }
            UiEvent::PolicyCreated { form, .. } => {
                if let ModalState::Add(modal) = &self.modal {
                    let row = form.to_summary(&self.brands, &modal.car_types);
                    self.status = format!("Policy {} created", row.policy_number);
                    self.policies.push(row);
                    self.modal = ModalState::Closed;
                }
            }
            UiEvent::PolicyUpdated { form, .. } => {
                if let ModalState::Edit(modal) = &self.modal {
                    let row = form.to_summary(&self.brands, &modal.car_types);
                    self.status = format!("Policy {} updated", row.policy_number);
                    if let Some(existing) = self
                        .policies
                        .iter_mut()
                        .find(|policy| policy.policy_number == row.policy_number)
                    {
                        *existing = row;
                    }
                    self.modal = ModalState::Closed;
                }
            }
            UiEvent::PolicyDeleted { policy_number, .. } => {
                self.status = format!("Policy {policy_number} deleted");
                self.modal = ModalState::Closed;
                return self.reload();
            }
            UiEvent::SubmitFailed { error, .. } => {
                self.modal.set_phase(ModalPhase::Ready);
                self.alert = Some(error);
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
