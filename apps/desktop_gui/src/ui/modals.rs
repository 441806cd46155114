//! Add, View, Edit and Delete dialogs plus the blocking alert.

use client_core::{
    flows::PolicyView,
    presenter::{car_year_options, format_grouped, format_long_date, format_rupiah},
    PolicyField, RateInput,
};
use eframe::egui;
use shared::domain::{BrandId, CarBrand, PremiumRate, RateId};

use crate::{
    controller::events::UiErrorCategory,
    controller::state::{
        AppState, DeleteModal, FormInput, FormModal, ModalPhase, ModalState, ViewModal,
    },
    ui::app::UiAction,
};

const MODAL_WIDTH: f32 = 460.0;

pub fn show_modal(
    ctx: &egui::Context,
    state: &AppState,
    current_year: i32,
    actions: &mut Vec<UiAction>,
) {
    let title = match &state.modal {
        ModalState::Closed => return,
        ModalState::Add(_) => "Add policy",
        ModalState::View(_) => "Policy details",
        ModalState::Edit(_) => "Edit policy",
        ModalState::ConfirmDelete(_) => "Delete policy",
    };

    let mut open = true;
    let window = egui::Window::new(title)
        .id(egui::Id::new("policy_modal"))
        .collapsible(false)
        .resizable(false)
        .default_width(MODAL_WIDTH)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0));
    // No title-bar close while a save or delete is in flight.
    let window = if state.modal.can_close() {
        window.open(&mut open)
    } else {
        window
    };
    window.show(ctx, |ui| match &state.modal {
        ModalState::Closed => {}
        ModalState::Add(modal) | ModalState::Edit(modal) => {
            show_form(ui, modal, state, current_year, actions);
        }
        ModalState::View(modal) => show_view(ui, modal, &state.rates, actions),
        ModalState::ConfirmDelete(modal) => show_delete(ui, modal, actions),
    });

    if !open {
        actions.push(UiAction::Close);
    }
}

pub fn show_alert(ctx: &egui::Context, state: &AppState, actions: &mut Vec<UiAction>) {
    let Some(alert) = &state.alert else {
        return;
    };
    egui::Window::new(alert.context().title())
        .id(egui::Id::new("alert_modal"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 48.0))
        .show(ctx, |ui| {
            ui.label(alert.message());
            if alert.category() == UiErrorCategory::Transport {
                ui.weak("Check the API base URL and the network connection.");
            }
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                actions.push(UiAction::DismissAlert);
            }
        });
}

fn loading(ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.spinner();
        ui.label("Loading...");
    });
}

fn field_error(ui: &mut egui::Ui, modal: &FormModal, field: PolicyField) {
    if let Some(message) = modal.form.error(field) {
        ui.colored_label(ui.visuals().error_fg_color, message);
    }
}

/// Single-line editor over a copy of `value`; returns the response and the
/// new text when it changed.
fn text_input(
    ui: &mut egui::Ui,
    id: &'static str,
    value: &str,
    hint: &str,
) -> (egui::Response, Option<String>) {
    let mut buffer = value.to_string();
    let response = ui.add(
        egui::TextEdit::singleline(&mut buffer)
            .id_salt(id)
            .hint_text(hint)
            .desired_width(260.0),
    );
    let changed = response.changed().then_some(buffer);
    (response, changed)
}

fn show_form(
    ui: &mut egui::Ui,
    modal: &FormModal,
    state: &AppState,
    current_year: i32,
    actions: &mut Vec<UiAction>,
) {
    if modal.phase == ModalPhase::Loading {
        loading(ui);
        return;
    }
    let form = &modal.form;
    let editable = modal.phase == ModalPhase::Ready;

    ui.add_enabled_ui(editable, |ui| {
        egui::Grid::new("policy_form")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label(PolicyField::PolicyNumber.label());
                if form.policy_number.is_empty() {
                    ui.weak("(not allocated)");
                } else {
                    ui.strong(form.policy_number.as_str());
                }
                ui.end_row();

                ui.label(PolicyField::Insured.label());
                ui.vertical(|ui| {
                    let (_, changed) = text_input(ui, "insured", &form.insured, "Full name");
                    if let Some(value) = changed {
                        actions.push(UiAction::Form(FormInput::Insured(value)));
                    }
                    field_error(ui, modal, PolicyField::Insured);
                });
                ui.end_row();

                ui.label(PolicyField::EffectiveDate.label());
                ui.vertical(|ui| {
                    let (_, changed) =
                        text_input(ui, "effective_date", &form.effective_date, "YYYY-MM-DD");
                    if let Some(value) = changed {
                        actions.push(UiAction::Form(FormInput::EffectiveDate(value)));
                    }
                    field_error(ui, modal, PolicyField::EffectiveDate);
                });
                ui.end_row();

                ui.label(PolicyField::ExpirationDate.label());
                ui.vertical(|ui| {
                    let (_, changed) =
                        text_input(ui, "expiration_date", &form.expiration_date, "YYYY-MM-DD");
                    if let Some(value) = changed {
                        actions.push(UiAction::Form(FormInput::ExpirationDate(value)));
                    }
                    field_error(ui, modal, PolicyField::ExpirationDate);
                });
                ui.end_row();

                ui.label(PolicyField::CarBrand.label());
                ui.vertical(|ui| {
                    brand_picker(ui, &form.car_brand, &state.brands, actions);
                    field_error(ui, modal, PolicyField::CarBrand);
                });
                ui.end_row();

                ui.label(PolicyField::CarType.label());
                ui.vertical(|ui| {
                    let mut selected = form.car_type.clone();
                    let selected_text = modal
                        .car_types
                        .iter()
                        .find(|car_type| car_type.uid == form.car_type)
                        .map(|car_type| car_type.name.clone())
                        .unwrap_or_else(|| "Select type".to_string());
                    ui.add_enabled_ui(!modal.car_types.is_empty(), |ui| {
                        egui::ComboBox::from_id_salt("car_type")
                            .selected_text(selected_text)
                            .show_ui(ui, |ui| {
                                for car_type in &modal.car_types {
                                    ui.selectable_value(
                                        &mut selected,
                                        car_type.uid.clone(),
                                        &car_type.name,
                                    );
                                }
                            });
                    });
                    if selected != form.car_type {
                        actions.push(UiAction::Form(FormInput::CarType(selected)));
                    }
                    field_error(ui, modal, PolicyField::CarType);
                });
                ui.end_row();

                ui.label(PolicyField::CarYear.label());
                ui.vertical(|ui| {
                    let mut selected = form.car_year.clone();
                    egui::ComboBox::from_id_salt("car_year")
                        .selected_text(if selected.is_empty() {
                            "Select year".to_string()
                        } else {
                            selected.clone()
                        })
                        .show_ui(ui, |ui| {
                            for year in car_year_options(current_year).into_iter().rev() {
                                ui.selectable_value(&mut selected, year.to_string(), year.to_string());
                            }
                        });
                    if selected != form.car_year {
                        actions.push(UiAction::Form(FormInput::CarYear(selected)));
                    }
                    field_error(ui, modal, PolicyField::CarYear);
                });
                ui.end_row();

                ui.label(format!("{} (Rp)", PolicyField::CarPrice.label()));
                ui.vertical(|ui| {
                    let (response, changed) =
                        text_input(ui, "car_price", &form.car_price, "e.g. 150.000.000");
                    if let Some(value) = changed {
                        actions.push(UiAction::Form(FormInput::CarPrice(value)));
                    }
                    if response.lost_focus() {
                        actions.push(UiAction::Form(FormInput::CarPriceCommitted));
                    }
                    field_error(ui, modal, PolicyField::CarPrice);
                });
                ui.end_row();

                ui.label(PolicyField::PremiumRate.label());
                ui.vertical(|ui| {
                    rate_picker(ui, form.premium_rate.as_ref(), &state.rates, actions);
                    let (_, changed) =
                        text_input(ui, "custom_rate", &modal.custom_rate, "or enter a rate in %");
                    if let Some(value) = changed {
                        actions.push(UiAction::Form(FormInput::CustomRate(value)));
                    }
                    field_error(ui, modal, PolicyField::PremiumRate);
                });
                ui.end_row();

                ui.label(PolicyField::PremiumPrice.label());
                ui.vertical(|ui| {
                    ui.strong(format!("Rp {}", format_grouped(form.premium_price)));
                    field_error(ui, modal, PolicyField::PremiumPrice);
                });
                ui.end_row();
            });
    });

    ui.separator();
    ui.horizontal(|ui| {
        let cancel = egui::Button::new("Cancel");
        if ui
            .add_enabled(modal.phase != ModalPhase::Submitting, cancel)
            .clicked()
        {
            actions.push(UiAction::Close);
        }
        let label = if modal.phase == ModalPhase::Submitting {
            "Saving..."
        } else {
            "Save"
        };
        if ui.add_enabled(editable, egui::Button::new(label)).clicked() {
            actions.push(UiAction::Submit);
        }
        if modal.phase == ModalPhase::Submitting {
            ui.spinner();
        }
    });
}

fn brand_picker(
    ui: &mut egui::Ui,
    current: &BrandId,
    brands: &[CarBrand],
    actions: &mut Vec<UiAction>,
) {
    let mut selected = current.clone();
    let selected_text = brands
        .iter()
        .find(|brand| &brand.uid == current)
        .map(|brand| brand.name.clone())
        .unwrap_or_else(|| "Select brand".to_string());
    egui::ComboBox::from_id_salt("car_brand")
        .selected_text(selected_text)
        .show_ui(ui, |ui| {
            for brand in brands {
                ui.selectable_value(&mut selected, brand.uid.clone(), &brand.name);
            }
        });
    if &selected != current {
        actions.push(UiAction::Form(FormInput::Brand(selected)));
    }
}

fn rate_picker(
    ui: &mut egui::Ui,
    current: Option<&RateInput>,
    rates: &[PremiumRate],
    actions: &mut Vec<UiAction>,
) {
    let current_id = match current {
        Some(RateInput::Reference(rate_id)) => rate_id.clone(),
        _ => RateId::default(),
    };
    let mut selected = current_id.clone();
    let selected_text = match current {
        Some(rate @ RateInput::Reference(_)) => rate.label(rates),
        _ => "Select rate".to_string(),
    };
    egui::ComboBox::from_id_salt("premium_rate")
        .selected_text(selected_text)
        .show_ui(ui, |ui| {
            for rate in rates {
                ui.selectable_value(
                    &mut selected,
                    rate.uid.clone(),
                    format!("{}%", rate.rate.normalize()),
                );
            }
        });
    if selected != current_id {
        actions.push(UiAction::Form(FormInput::Rate(selected)));
    }
}

fn show_view(
    ui: &mut egui::Ui,
    modal: &ViewModal,
    rates: &[PremiumRate],
    actions: &mut Vec<UiAction>,
) {
    let Some(view) = modal.view.as_ref().filter(|_| modal.phase == ModalPhase::Ready) else {
        loading(ui);
        return;
    };
    let PolicyView {
        detail,
        brand_name,
        type_name,
    } = view;
    let summary = &detail.summary;
    let rate = if !detail.premium_rate_uid.is_empty() {
        RateInput::Reference(detail.premium_rate_uid.clone()).label(rates)
    } else {
        format!("{}%", detail.premium_rate.normalize())
    };

    egui::Grid::new("policy_view")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            let rows = [
                ("Policy number", summary.policy_number.to_string()),
                ("Insured", summary.insured.clone()),
                ("Effective date", format_long_date(&summary.effective_date)),
                ("Expiration date", format_long_date(&summary.expiration_date)),
                ("Car brand", brand_name.clone()),
                ("Car type", type_name.clone()),
                ("Car year", summary.car_year.to_string()),
                ("Car price", format_rupiah(summary.car_price)),
                ("Premium rate", rate),
                ("Premium", format_rupiah(summary.premium_price)),
            ];
            for (label, value) in rows {
                ui.label(label);
                ui.strong(value);
                ui.end_row();
            }
        });

    ui.separator();
    if ui.button("Close").clicked() {
        actions.push(UiAction::Close);
    }
}

fn show_delete(ui: &mut egui::Ui, modal: &DeleteModal, actions: &mut Vec<UiAction>) {
    ui.label(format!(
        "Delete policy {}? This cannot be undone.",
        modal.policy_number
    ));
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        let submitting = modal.phase == ModalPhase::Submitting;
        if ui
            .add_enabled(!submitting, egui::Button::new("Cancel"))
            .clicked()
        {
            actions.push(UiAction::Close);
        }
        if ui
            .add_enabled(!submitting, egui::Button::new("Delete"))
            .clicked()
        {
            actions.push(UiAction::Submit);
        }
        if submitting {
            ui.spinner();
        }
    });
}
