use std::time::Duration;

use chrono::Datelike;
use client_core::presenter::PolicyRow;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::PolicyNumber;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{
        events::UiEvent,
        orchestration::dispatch_all,
        state::{AppState, FormInput, ModalPhase},
    },
    ui::modals,
};

/// Something the user did this frame; applied after drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Reload,
    OpenAdd,
    View(PolicyNumber),
    Edit(PolicyNumber),
    Delete(PolicyNumber),
    Form(FormInput),
    Submit,
    Close,
    DismissAlert,
}

pub struct PolicyDeskApp {
    state: AppState,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    current_year: i32,
}

impl PolicyDeskApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        let mut app = Self {
            state: AppState::default(),
            cmd_tx,
            ui_rx,
            current_year: chrono::Local::now().year(),
        };
        let cmds = app.state.mount();
        dispatch_all(&app.cmd_tx, cmds, &mut app.state.status);
        app
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            let cmds = self.state.apply(event);
            dispatch_all(&self.cmd_tx, cmds, &mut self.state.status);
        }
    }

    fn handle(&mut self, action: UiAction) {
        let cmds = match action {
            UiAction::Reload => self.state.reload(),
            UiAction::OpenAdd => self.state.open_add(self.current_year),
            UiAction::View(policy_number) => self.state.open_view(policy_number),
            UiAction::Edit(policy_number) => self.state.open_edit(policy_number),
            UiAction::Delete(policy_number) => self.state.open_delete(policy_number),
            UiAction::Form(input) => self.state.edit_form(input),
            UiAction::Submit => self.state.submit(),
            UiAction::Close => self.state.close_modal(),
            UiAction::DismissAlert => {
                self.state.dismiss_alert();
                Vec::new()
            }
        };
        dispatch_all(&self.cmd_tx, cmds, &mut self.state.status);
    }

    fn show_top_bar(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        egui::TopBottomPanel::top("policy_top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Vehicle Policies");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(!self.state.modal.is_open(), egui::Button::new("Add policy"))
                        .clicked()
                    {
                        actions.push(UiAction::OpenAdd);
                    }
                    if ui
                        .add_enabled(!self.state.loading, egui::Button::new("Reload"))
                        .clicked()
                    {
                        actions.push(UiAction::Reload);
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("policy_status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.state.loading
                    || self.state.modal.phase() == Some(ModalPhase::Submitting)
                {
                    ui.spinner();
                }
                ui.small(&self.state.status);
            });
        });
    }

    fn show_policy_table(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.loading && self.state.policies.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }
            if self.state.policies.is_empty() {
                ui.weak("No policies yet.");
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    egui::Grid::new("policy_table")
                        .striped(true)
                        .num_columns(7)
                        .spacing([16.0, 6.0])
                        .show(ui, |ui| {
                            for header in [
                                "Policy number",
                                "Insured",
                                "Period",
                                "Vehicle",
                                "Car price",
                                "Premium",
                                "",
                            ] {
                                ui.label(egui::RichText::new(header).strong());
                            }
                            ui.end_row();

                            for summary in &self.state.policies {
                                let row = PolicyRow::from_summary(summary);
                                ui.label(&row.policy_number);
                                ui.label(&row.insured);
                                ui.label(&row.period);
                                ui.label(&row.vehicle);
                                ui.label(&row.car_price);
                                ui.label(&row.premium_price);
                                ui.menu_button("Actions", |ui| {
                                    let policy_number = &summary.policy_number;
                                    if ui.button("View").clicked() {
                                        actions.push(UiAction::View(policy_number.clone()));
                                        ui.close();
                                    }
                                    if ui.button("Edit").clicked() {
                                        actions.push(UiAction::Edit(policy_number.clone()));
                                        ui.close();
                                    }
                                    if ui.button("Delete").clicked() {
                                        actions.push(UiAction::Delete(policy_number.clone()));
                                        ui.close();
                                    }
                                });
                                ui.end_row();
                            }
                        });
                });
        });
    }
}

impl eframe::App for PolicyDeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        let mut actions = Vec::new();
        self.show_top_bar(ctx, &mut actions);
        self.show_policy_table(ctx, &mut actions);
        modals::show_modal(ctx, &self.state, self.current_year, &mut actions);
        modals::show_alert(ctx, &self.state, &mut actions);

        for action in actions {
            self.handle(action);
        }

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
