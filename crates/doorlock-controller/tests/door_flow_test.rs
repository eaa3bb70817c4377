//! Integration tests for the unlock → open → close → relock flow.
//!
//! These wire the controller, the command worker and the position worker
//! together over mock lines and drive them with paused Tokio time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use doorlock_controller::{
    CommandSender, DoorLockController, LockCommand, LockObserver, PositionHandle, PositionWorker,
    spawn_command_worker,
};
use doorlock_core::{
    DoorPosition, DoorSensorConfig, DoorStatus, LockConfig, LockState, RelockPolicy, SignalLevel,
};
use doorlock_hardware::mock::{MockInputHandle, MockInputPin, MockOutputHandle, MockOutputPin};
use doorlock_hardware::{Bolt, DoorSensor, PinId};
use doorlock_timer::TimerService;

// ============================================================================
// Fixture
// ============================================================================

const RELOCK_MS: u64 = 5_000;
const GUARD_MS: u64 = 300;

#[derive(Default)]
struct Journal {
    statuses: Mutex<Vec<DoorStatus>>,
    relocks: AtomicUsize,
}

impl Journal {
    fn locks(&self) -> Vec<LockState> {
        self.statuses.lock().unwrap().iter().map(|s| s.lock).collect()
    }
}

impl LockObserver for Journal {
    fn on_state_change(&self, status: DoorStatus) {
        self.statuses.lock().unwrap().push(status);
    }

    fn on_relock_complete(&self, _status: DoorStatus) {
        self.relocks.fetch_add(1, Ordering::SeqCst);
    }
}

struct Door {
    controller: DoorLockController,
    commands: CommandSender,
    bolt: MockOutputHandle,
    sensor: MockInputHandle,
    journal: Arc<Journal>,
    timers: TimerService,
    _position: PositionHandle,
}

impl Door {
    async fn start(policy: RelockPolicy) -> Self {
        let timers = TimerService::new();
        let (bolt_pin, bolt) = MockOutputPin::new(PinId(2));
        let (dpi_pin, sensor) = MockInputPin::new(PinId(3), SignalLevel::High);

        let controller = DoorLockController::new(
            Bolt::new(bolt_pin),
            LockConfig {
                relock_duration_ms: RELOCK_MS,
                relock_policy: policy,
                ..LockConfig::default()
            },
            &timers,
        );
        let journal = Arc::new(Journal::default());
        controller.register_observer(journal.clone());

        let position = PositionWorker::new(
            DoorSensor::new(Arc::new(dpi_pin), SignalLevel::High),
            controller.clone(),
            &DoorSensorConfig::default(),
            &timers,
        )
        .unwrap()
        .spawn();
        let (commands, _worker) = spawn_command_worker(controller.clone());

        // Let both workers start and the sensor seed the door position.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        Self {
            controller,
            commands,
            bolt,
            sensor,
            journal,
            timers,
            _position: position,
        }
    }

    fn state(&self) -> LockState {
        self.controller.get_state().lock
    }

    fn door(&self) -> Option<DoorPosition> {
        self.controller.get_state().door_position()
    }

    async fn open(&self) {
        self.sensor
            .bounce(&[SignalLevel::Low, SignalLevel::High, SignalLevel::Low]);
        tokio::time::sleep(Duration::from_millis(GUARD_MS + 50)).await;
    }

    async fn close(&self) {
        self.sensor
            .bounce(&[SignalLevel::High, SignalLevel::Low, SignalLevel::High]);
        tokio::time::sleep(Duration::from_millis(GUARD_MS + 50)).await;
    }
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ============================================================================
// Relock flow
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unlock_then_relock_with_door_closed() {
    let door = Door::start(RelockPolicy::WhenClosed).await;
    assert_eq!(door.door(), Some(DoorPosition::Closed));

    door.commands.send(LockCommand::Unlock).await.unwrap();
    advance(10).await;
    assert_eq!(door.state(), LockState::Unlocked);
    assert_eq!(door.bolt.level(), Some(SignalLevel::High));

    advance(RELOCK_MS).await;
    assert_eq!(door.state(), LockState::Locked);
    assert_eq!(door.bolt.level(), Some(SignalLevel::Low));
    assert_eq!(door.journal.relocks.load(Ordering::SeqCst), 1);
    assert_eq!(door.timers.armed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_door_held_open_keeps_bolt_retracted() {
    let door = Door::start(RelockPolicy::WhenClosed).await;

    door.commands.submit(LockCommand::Unlock).unwrap();
    advance(10).await;
    door.open().await;
    assert_eq!(door.door(), Some(DoorPosition::Open));

    advance(RELOCK_MS * 3).await;
    assert_eq!(door.state(), LockState::Unlocked);

    door.close().await;
    assert_eq!(door.door(), Some(DoorPosition::Closed));
    assert_eq!(door.state(), LockState::Unlocked);

    advance(RELOCK_MS).await;
    assert_eq!(door.state(), LockState::Locked);
    assert_eq!(door.journal.relocks.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_always_policy_relocks_with_door_open() {
    let door = Door::start(RelockPolicy::Always).await;

    door.commands.submit(LockCommand::Unlock).unwrap();
    advance(10).await;
    door.open().await;

    advance(RELOCK_MS).await;
    assert_eq!(door.state(), LockState::Locked);
    assert_eq!(door.door(), Some(DoorPosition::Open));
}

#[tokio::test(start_paused = true)]
async fn test_explicit_lock_before_expiry() {
    let door = Door::start(RelockPolicy::WhenClosed).await;

    door.commands.submit(LockCommand::Unlock).unwrap();
    door.commands.submit(LockCommand::Lock).unwrap();
    advance(10).await;

    assert_eq!(door.state(), LockState::Locked);
    assert_eq!(door.timers.armed_count(), 0);

    advance(RELOCK_MS * 2).await;
    // Seed reading, unlock, lock. No relock after the explicit lock.
    assert_eq!(
        door.journal.locks(),
        vec![LockState::Locked, LockState::Unlocked, LockState::Locked]
    );
    assert_eq!(door.journal.relocks.load(Ordering::SeqCst), 0);
}
