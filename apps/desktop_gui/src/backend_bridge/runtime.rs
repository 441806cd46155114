//! Runtime bridge between UI command queue and backend event intake.

use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
    thread::{self, JoinHandle},
};

use client_core::{flows, AuthContext, PolicyService};
use crossbeam_channel::{Receiver, Sender};
use tokio::task::JoinHandle as TaskHandle;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{ModalToken, UiError, UiErrorContext, UiEvent},
};

/// Tasks still running on behalf of an open modal.
#[derive(Default)]
struct ModalTasks {
    by_token: HashMap<ModalToken, Vec<TaskHandle<()>>>,
}

impl ModalTasks {
    fn track(&mut self, token: ModalToken, task: TaskHandle<()>) {
        self.by_token.entry(token).or_default().push(task);
    }

    fn cancel(&mut self, token: ModalToken) {
        if let Some(tasks) = self.by_token.remove(&token) {
            let running = tasks.iter().filter(|task| !task.is_finished()).count();
            for task in tasks {
                task.abort();
            }
            if running > 0 {
                tracing::debug!(token = token.0, running, "aborted modal tasks");
            }
        }
    }

    fn prune(&mut self) {
        self.by_token.retain(|_, tasks| {
            tasks.retain(|task| !task.is_finished());
            !tasks.is_empty()
        });
    }
}

fn emit(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    if ui_tx.try_send(event).is_err() {
        tracing::warn!("ui event queue is full or closed; dropping backend event");
    }
}

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    service: Arc<dyn PolicyService>,
    auth: AuthContext,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("policy-desk-backend".to_string())
        .spawn(move || run_worker(cmd_rx, ui_tx, service, auth))
}

fn run_worker(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    service: Arc<dyn PolicyService>,
    auth: AuthContext,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            emit(
                &ui_tx,
                UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )),
            );
            tracing::error!("failed to build backend runtime: {err}");
            return;
        }
    };

    runtime.block_on(async move {
        tracing::info!(actor = %auth.actor(), "backend worker ready");
        emit(&ui_tx, UiEvent::Info("Backend worker ready".to_string()));
        let mut modal_tasks = ModalTasks::default();

        while let Ok(cmd) = cmd_rx.recv() {
            modal_tasks.prune();
            match cmd {
                BackendCommand::CancelModal { token } => modal_tasks.cancel(token),
                BackendCommand::LoadPolicies => {
                    spawn(&service, &ui_tx, |service, ui_tx| async move {
                        let event = match flows::load_policies(&*service).await {
                            Ok(policies) => UiEvent::PoliciesLoaded(policies),
                            Err(err) => UiEvent::PoliciesFailed(UiError::from_service(
                                UiErrorContext::LoadPolicies,
                                &err,
                            )),
                        };
                        emit(&ui_tx, event);
                    });
                }
                BackendCommand::LoadReferenceData => {
                    spawn(&service, &ui_tx, |service, ui_tx| async move {
                        let brands = flows::load_car_brands(&*service).await;
                        emit(&ui_tx, UiEvent::CarBrandsLoaded(brands));
                    });
                    spawn(&service, &ui_tx, |service, ui_tx| async move {
                        let rates = flows::load_rates(&*service).await;
                        emit(&ui_tx, UiEvent::RatesLoaded(rates));
                    });
                }
                BackendCommand::AllocatePolicyNumber { token } => {
                    let task = spawn(&service, &ui_tx, move |service, ui_tx| async move {
                        let policy_number = flows::allocate_policy_number(&*service).await;
                        emit(
                            &ui_tx,
                            UiEvent::PolicyNumberAllocated {
                                token,
                                policy_number,
                            },
                        );
                    });
                    modal_tasks.track(token, task);
                }
                BackendCommand::LoadCarTypes { token, brand } => {
                    let task = spawn(&service, &ui_tx, move |service, ui_tx| async move {
                        let car_types = flows::load_car_types(&*service, &brand).await;
                        emit(
                            &ui_tx,
                            UiEvent::CarTypesLoaded {
                                token,
                                brand,
                                car_types,
                            },
                        );
                    });
                    modal_tasks.track(token, task);
                }
                BackendCommand::OpenView {
                    token,
                    policy_number,
                } => {
                    let task = spawn(&service, &ui_tx, move |service, ui_tx| async move {
                        let event = match flows::open_view(&*service, &policy_number).await {
                            Ok(view) => UiEvent::ViewReady { token, view },
                            Err(err) => {
                                tracing::error!(policy_number = %policy_number, "failed to fetch policy: {err}");
                                UiEvent::ModalLoadFailed {
                                    token,
                                    error: UiError::from_service(UiErrorContext::ViewPolicy, &err),
                                }
                            }
                        };
                        emit(&ui_tx, event);
                    });
                    modal_tasks.track(token, task);
                }
                BackendCommand::OpenEdit {
                    token,
                    policy_number,
                } => {
                    let task = spawn(&service, &ui_tx, move |service, ui_tx| async move {
                        let event = match flows::open_edit(&*service, &policy_number).await {
                            Ok(draft) => UiEvent::EditReady { token, draft },
                            Err(err) => {
                                tracing::error!(policy_number = %policy_number, "failed to load policy for editing: {err}");
                                UiEvent::ModalLoadFailed {
                                    token,
                                    error: UiError::from_service(UiErrorContext::EditPolicy, &err),
                                }
                            }
                        };
                        emit(&ui_tx, event);
                    });
                    modal_tasks.track(token, task);
                }
                BackendCommand::SubmitAdd { token, form } => {
                    let auth = auth.clone();
                    let task = spawn(&service, &ui_tx, move |service, ui_tx| async move {
                        let event = match flows::submit_add(&*service, &form, &auth).await {
                            Ok(()) => UiEvent::PolicyCreated { token, form },
                            Err(err) => {
                                tracing::warn!(policy_number = %form.policy_number, "create rejected: {err}");
                                UiEvent::SubmitFailed {
                                    token,
                                    error: UiError::from_submit(UiErrorContext::AddPolicy, &err),
                                }
                            }
                        };
                        emit(&ui_tx, event);
                    });
                    modal_tasks.track(token, task);
                }
                BackendCommand::SubmitEdit { token, form } => {
                    let auth = auth.clone();
                    let task = spawn(&service, &ui_tx, move |service, ui_tx| async move {
                        let event = match flows::submit_edit(&*service, &form, &auth).await {
                            Ok(()) => UiEvent::PolicyUpdated { token, form },
                            Err(err) => {
                                tracing::warn!(policy_number = %form.policy_number, "update rejected: {err}");
                                UiEvent::SubmitFailed {
                                    token,
                                    error: UiError::from_submit(UiErrorContext::EditPolicy, &err),
                                }
                            }
                        };
                        emit(&ui_tx, event);
                    });
                    modal_tasks.track(token, task);
                }
                BackendCommand::DeletePolicy {
                    token,
                    policy_number,
                } => {
                    let task = spawn(&service, &ui_tx, move |service, ui_tx| async move {
                        let event = match flows::confirm_delete(&*service, &policy_number).await {
                            Ok(()) => UiEvent::PolicyDeleted {
                                token,
                                policy_number,
                            },
                            Err(err) => {
                                tracing::warn!(policy_number = %policy_number, "delete rejected: {err}");
                                UiEvent::SubmitFailed {
                                    token,
                                    error: UiError::from_service(UiErrorContext::DeletePolicy, &err),
                                }
                            }
                        };
                        emit(&ui_tx, event);
                    });
                    modal_tasks.track(token, task);
                }
            }
        }

        tracing::info!("ui command channel closed; backend worker stopping");
    });
}

fn spawn<F, Fut>(
    service: &Arc<dyn PolicyService>,
    ui_tx: &Sender<UiEvent>,
    job: F,
) -> TaskHandle<()>
where
    F: FnOnce(Arc<dyn PolicyService>, Sender<UiEvent>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(job(Arc::clone(service), ui_tx.clone()))
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
