//! Keypad consumer task.
//!
//! ```text
//! ┌──────────────┐  ScanReport   ┌────────────────┐  LockCommand   ┌────────────────┐
//! │ MatrixPoller │──────────────►│                │───────────────►│ Command worker │
//! └──────────────┘               │  KeypadWorker  │   (submit)     └────────────────┘
//! ┌──────────────┐  KeypadEvent  │   (decoder)    │
//! │ Key timers   │──────────────►│                │
//! └──────────────┘               └────────────────┘
//! ```
//!
//! The decoder lives inside this task, so its buffer and per-key state are
//! never shared.

use doorlock_controller::{CommandSender, LockCommand};
use doorlock_core::KeypadConfig;
use doorlock_hardware::{Keymap, MatrixScanner, ScanReport};
use doorlock_timer::TimerService;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::decoder::{KeypadDecoder, KeypadEvent};
use crate::error::Result;
use crate::poller::MatrixPoller;

const REPORT_QUEUE_CAPACITY: usize = 16;

/// Owns the decoder and applies its commands.
#[derive(Debug)]
pub struct KeypadWorker {
    decoder: KeypadDecoder,
    events: mpsc::UnboundedReceiver<KeypadEvent>,
    commands: CommandSender,
}

impl KeypadWorker {
    /// # Errors
    ///
    /// Returns `KeypadError::Config` if the keymap does not match the
    /// configured matrix size.
    pub fn new(
        config: &KeypadConfig,
        keymap: Keymap,
        timers: &TimerService,
        commands: CommandSender,
    ) -> Result<Self> {
        let (decoder, events) = KeypadDecoder::new(config, keymap, timers)?;
        Ok(Self {
            decoder,
            events,
            commands,
        })
    }

    /// Spawn the consumer. It runs until `reports` is closed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(self, reports: mpsc::Receiver<ScanReport>) -> JoinHandle<()> {
        tokio::spawn(self.run(reports))
    }

    async fn run(mut self, mut reports: mpsc::Receiver<ScanReport>) {
        info!("Keypad worker started");
        loop {
            tokio::select! {
                report = reports.recv() => match report {
                    Some(report) => {
                        for command in self.decoder.handle_report(&report) {
                            self.dispatch(command);
                        }
                    }
                    None => break,
                },
                Some(event) = self.events.recv() => {
                    if let Some(command) = self.decoder.handle_event(event) {
                        self.dispatch(command);
                    }
                }
            }
        }
        info!("Keypad worker stopped");
    }

    fn dispatch(&self, command: LockCommand) {
        if let Err(e) = self.commands.submit(command) {
            warn!("Keypad {} command dropped: {}", command, e);
        }
    }
}

/// Running keypad tasks.
#[derive(Debug)]
pub struct KeypadHandle {
    reports: mpsc::Sender<ScanReport>,
    poller: Option<JoinHandle<()>>,
    worker: JoinHandle<()>,
}

impl KeypadHandle {
    /// Start the poller and the consumer for a physical matrix.
    ///
    /// # Errors
    ///
    /// Returns `KeypadError::Config` if the keymap does not match the
    /// configured matrix size.
    pub fn start(
        scanner: Box<dyn MatrixScanner>,
        keymap: Keymap,
        config: &KeypadConfig,
        timers: &TimerService,
        commands: CommandSender,
    ) -> Result<Self> {
        let mut handle = Self::start_without_scanner(keymap, config, timers, commands)?;
        let poller = MatrixPoller::new(scanner, config);
        handle.poller = Some(poller.spawn(handle.reports.clone()));
        Ok(handle)
    }

    /// Start only the consumer; reports are injected through
    /// [`report_sender`](Self::report_sender).
    ///
    /// # Errors
    ///
    /// As [`start`](Self::start).
    pub fn start_without_scanner(
        keymap: Keymap,
        config: &KeypadConfig,
        timers: &TimerService,
        commands: CommandSender,
    ) -> Result<Self> {
        let worker = KeypadWorker::new(config, keymap, timers, commands)?;
        let (reports, rx) = mpsc::channel(REPORT_QUEUE_CAPACITY);
        Ok(Self {
            reports,
            poller: None,
            worker: worker.spawn(rx),
        })
    }

    pub fn report_sender(&self) -> mpsc::Sender<ScanReport> {
        self.reports.clone()
    }

    /// Stop the poller and the consumer.
    pub async fn shutdown(self) {
        if let Some(poller) = self.poller {
            poller.abort();
            let _ = poller.await;
        }
        self.worker.abort();
        let _ = self.worker.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_controller::{DoorLockController, spawn_command_worker};
    use doorlock_core::{LockConfig, LockState, RelockPolicy};
    use doorlock_hardware::mock::{MockKeyMatrix, MockOutputPin};
    use doorlock_hardware::{Bolt, Key, PinId};
    use std::time::Duration;

    fn controller(timers: &TimerService) -> DoorLockController {
        let (pin, _handle) = MockOutputPin::new(PinId(0));
        DoorLockController::new(
            Bolt::new(pin),
            LockConfig {
                relock_policy: RelockPolicy::Disabled,
                ..LockConfig::default()
            },
            timers,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_injected_reports_reach_controller() {
        let timers = TimerService::new();
        let controller = controller(&timers);
        let (commands, _worker) = spawn_command_worker(controller.clone());
        let keymap = Keymap::default();
        let hash = keymap.find(Key::Hash).unwrap();

        let keypad = KeypadHandle::start_without_scanner(
            keymap,
            &KeypadConfig::default(),
            &timers,
            commands,
        )
        .unwrap();
        let reports = keypad.report_sender();

        reports.send(ScanReport::pressed(hash)).await.unwrap();
        reports.send(ScanReport::released(hash)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(controller.get_state().lock, LockState::Unlocked);

        reports.send(ScanReport::pressed(hash)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(controller.get_state().lock, LockState::Locked);

        keypad.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_matrix_hold_hash_locks() {
        let timers = TimerService::new();
        let controller = controller(&timers);
        controller.unlock();
        let (commands, _worker) = spawn_command_worker(controller.clone());
        let (matrix, keys) = MockKeyMatrix::new(4, 3);
        let keymap = Keymap::default();
        let hash = keymap.find(Key::Hash).unwrap();

        let keypad = KeypadHandle::start(
            Box::new(matrix),
            keymap,
            &KeypadConfig::default(),
            &timers,
            commands,
        )
        .unwrap();

        keys.press(hash);
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(controller.get_state().lock, LockState::Locked);

        keys.release(hash);
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(controller.get_state().lock, LockState::Locked);

        keypad.shutdown().await;
    }
}
