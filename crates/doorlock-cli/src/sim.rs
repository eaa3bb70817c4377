//! Door lock wired to mock hardware.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use doorlock_controller::{
    CommandSender, DoorLockController, LockCommand, PositionHandle, PositionWorker,
    spawn_command_worker,
};
use doorlock_core::{DoorLockConfig, DoorPosition};
use doorlock_hardware::mock::{
    MockInputHandle, MockInputPin, MockKeyMatrix, MockKeyMatrixHandle, MockOutputPin,
};
use doorlock_hardware::{Bolt, DoorSensor, Key, Keymap, PinId};
use doorlock_keypad::KeypadHandle;
use doorlock_protocol::{ConnectionId, LockService, hex};
use doorlock_timer::TimerService;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::command::SimCommand;

const BOLT_PIN: PinId = PinId(17);
const DOOR_PIN: PinId = PinId(27);

/// The simulated phone connection.
pub const CONSOLE_CONNECTION: ConnectionId = 1;

/// A running door lock on mock lines.
pub struct Simulator {
    config: DoorLockConfig,
    controller: DoorLockController,
    commands: CommandSender,
    service: Arc<LockService>,
    keymap: Keymap,
    keys: MockKeyMatrixHandle,
    door: MockInputHandle,
    keypad: KeypadHandle,
    position: Option<PositionHandle>,
    command_worker: JoinHandle<()>,
}

impl Simulator {
    /// Build the lock and start every worker.
    pub fn start(config: DoorLockConfig) -> Result<Self> {
        let timers = TimerService::new();

        let (bolt_pin, _bolt) = MockOutputPin::new(BOLT_PIN);
        let controller = DoorLockController::builder(Bolt::new(bolt_pin))
            .with_config(config.lock.clone())
            .with_timers(timers.clone())
            .build();
        let (commands, command_worker) = spawn_command_worker(controller.clone());

        let closed = config.door_sensor.closed_level;
        let (door_pin, door) = MockInputPin::new(DOOR_PIN, closed);
        let position = if config.door_sensor.enabled {
            let sensor = DoorSensor::new(Arc::new(door_pin), closed);
            let worker =
                PositionWorker::new(sensor, controller.clone(), &config.door_sensor, &timers)
                    .context("Failed to start door position worker")?;
            Some(worker.spawn())
        } else {
            info!("Door sensor disabled");
            None
        };

        let keymap = Keymap::default();
        let (matrix, keys) = MockKeyMatrix::new(config.keypad.rows, config.keypad.cols);
        let keypad = KeypadHandle::start(
            Box::new(matrix),
            keymap.clone(),
            &config.keypad,
            &timers,
            commands.clone(),
        )
        .context("Failed to start keypad")?;

        let service = LockService::register(
            controller.clone(),
            commands.clone(),
            &config.service,
            Arc::new(|connection: ConnectionId, payload: Bytes| {
                info!("Notify connection {}: {}", connection, hex(&payload));
            }),
        );
        service.on_connect(CONSOLE_CONNECTION);
        service.on_subscribe(CONSOLE_CONNECTION, true);

        Ok(Self {
            config,
            controller,
            commands,
            service,
            keymap,
            keys,
            door,
            keypad,
            position,
            command_worker,
        })
    }

    /// Apply one console command. Returns `false` on quit.
    pub fn apply(&self, command: SimCommand) -> bool {
        match command {
            SimCommand::Unlock => self.service.write_lock_command(CONSOLE_CONNECTION, &[0x01]),
            SimCommand::Lock => {
                if let Err(e) = self.commands.submit(LockCommand::Lock) {
                    warn!("Lock command dropped: {}", e);
                }
            }
            SimCommand::Status => {
                let status = self.controller.get_state();
                println!(
                    "{} (payload {}, relock {})",
                    status,
                    hex(&self.service.read_lock_state()),
                    if self.controller.relock_pending() { "pending" } else { "idle" }
                );
            }
            SimCommand::Door(position) => {
                let sensor = &self.config.door_sensor;
                if !sensor.enabled {
                    println!("door sensor is disabled");
                    return true;
                }
                let level = match position {
                    DoorPosition::Closed => sensor.closed_level,
                    DoorPosition::Open => sensor.closed_level.inverted(),
                };
                self.door.set_level(level);
            }
            SimCommand::Press(key) => self.tap(key, Duration::ZERO),
            SimCommand::Hold(key) => self.tap(key, self.config.keypad.long_press()),
            SimCommand::Help => println!("{}", crate::command::HELP),
            SimCommand::Quit => return false,
        }
        true
    }

    /// Hold `key` long enough for the poller to see it, plus `extra`.
    fn tap(&self, key: Key, extra: Duration) {
        let Some(coord) = self.keymap.find(key) else {
            println!("key {} is not on this keypad", key);
            return;
        };

        let keypad = &self.config.keypad;
        let settle = keypad.scan_interval() * (u32::from(keypad.debounce_ticks) + 1);
        let keys = self.keys.clone();
        keys.press(coord);
        tokio::spawn(async move {
            tokio::time::sleep(settle + extra).await;
            keys.release(coord);
        });
    }

    /// Stop every worker.
    pub async fn shutdown(self) {
        self.service.detach();
        self.keypad.shutdown().await;
        if let Some(position) = self.position {
            position.shutdown().await;
        }
        drop(self.commands);
        drop(self.service);
        self.command_worker.abort();
        let _ = self.command_worker.await;
        info!("Simulator stopped");
    }
}
