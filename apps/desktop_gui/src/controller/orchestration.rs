//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = cmd.name();
    let token = cmd.token().map(|token| token.0);

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, ?token, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "backend command queue is full");
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!(command = cmd_name, "backend command processor disconnected");
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
        }
    }
}

pub fn dispatch_all(
    cmd_tx: &Sender<BackendCommand>,
    cmds: impl IntoIterator<Item = BackendCommand>,
    status: &mut String,
) {
    for cmd in cmds {
        dispatch_backend_command(cmd_tx, cmd, status);
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::*;

    #[test]
    fn full_queue_reports_status() {
        let (cmd_tx, _cmd_rx) = bounded(1);
        let mut status = String::new();
        dispatch_backend_command(&cmd_tx, BackendCommand::LoadPolicies, &mut status);
        assert!(status.is_empty());
        dispatch_backend_command(&cmd_tx, BackendCommand::LoadReferenceData, &mut status);
        assert!(status.contains("full"));
    }

    #[test]
    fn disconnected_worker_reports_status() {
        let (cmd_tx, cmd_rx) = bounded(4);
        drop(cmd_rx);
        let mut status = String::new();
        dispatch_all(&cmd_tx, [BackendCommand::LoadPolicies], &mut status);
        assert!(status.contains("disconnected"));
    }
}
