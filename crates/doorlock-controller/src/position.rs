//! Door-position event pipeline.
//!
//! The sensor line raises an interrupt on every edge, including contact
//! bounce. The interrupt side only tags the edge and pushes it onto a bounded
//! queue; everything else happens on the worker task.
//!
//! ```text
//!  edge (interrupt) ──try_send──► [ bounded queue ] ──► PositionWorker
//!                       │                                    │
//!                       └─ full: count + drop                ├─ sleep(guard interval)
//!                                                            ├─ drain queued edges
//!  poll timer (optional) ──► SensorEvent::Poll               ├─ read current level
//!                                                            └─ publish if changed
//! ```
//!
//! A burst of bounces inside one guard window therefore produces at most one
//! update, reflecting the settled level at the end of the window.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use doorlock_core::{DoorPosition, DoorSensorConfig};
use doorlock_hardware::{DoorSensor, PinId};
use doorlock_timer::{Timer, TimerService};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::controller::DoorLockController;
use crate::error::Result;

const POLL_TIMER_NAME: &str = "door_poll";

/// Event delivered to the position worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    /// An edge was seen on the sensor line.
    Edge { pin: PinId },

    /// Periodic re-sample.
    Poll,
}

/// Interrupt-side producer.
///
/// [`on_edge`](Self::on_edge) never blocks or logs, so it is safe to call
/// from the pin's interrupt handler.
#[derive(Debug, Clone)]
pub struct PositionInterrupt {
    tx: mpsc::Sender<SensorEvent>,
    dropped: Arc<AtomicU64>,
}

impl PositionInterrupt {
    /// Queue an edge; dropped and counted if the queue is full.
    pub fn on_edge(&self, pin: PinId) {
        if self.tx.try_send(SensorEvent::Edge { pin }).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Queue a re-sample request. Returns `false` if it was dropped.
    pub fn poll(&self) -> bool {
        self.tx.try_send(SensorEvent::Poll).is_ok()
    }

    /// Edges dropped because the queue was full.
    pub fn dropped_edges(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer of sensor events.
pub struct PositionWorker {
    sensor: DoorSensor,
    controller: DoorLockController,
    guard_interval: Duration,
    rx: mpsc::Receiver<SensorEvent>,
    interrupt: PositionInterrupt,
    poll_timer: Option<Timer>,
    last: Option<DoorPosition>,
}

impl PositionWorker {
    /// Create the worker and install its interrupt handler on the sensor.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor line does not accept an edge handler.
    pub fn new(
        sensor: DoorSensor,
        controller: DoorLockController,
        config: &DoorSensorConfig,
        timers: &TimerService,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let interrupt = PositionInterrupt {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };

        let edges = interrupt.clone();
        sensor.on_edge(Box::new(move |pin: PinId| edges.on_edge(pin)))?;

        let poll_timer = config.poll_interval().map(|period| {
            let poller = interrupt.clone();
            timers.periodic(POLL_TIMER_NAME, period, move || {
                poller.poll();
            })
        });

        Ok(Self {
            sensor,
            controller,
            guard_interval: config.guard_interval(),
            rx,
            interrupt,
            poll_timer,
            last: None,
        })
    }

    pub fn interrupt(&self) -> PositionInterrupt {
        self.interrupt.clone()
    }

    /// Spawn the worker on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(self) -> PositionHandle {
        let interrupt = self.interrupt.clone();
        let task = tokio::spawn(self.run());
        PositionHandle { task, interrupt }
    }

    async fn run(mut self) {
        info!(
            "Door position worker started on {} (guard {}ms)",
            self.sensor.pin(),
            self.guard_interval.as_millis()
        );
        self.sample();

        if let Some(timer) = &self.poll_timer {
            if let Err(e) = timer.arm() {
                warn!("Door sensor polling disabled: {}", e);
            }
        }

        while let Some(event) = self.rx.recv().await {
            trace!("Sensor event {:?}", event);
            tokio::time::sleep(self.guard_interval).await;

            let mut coalesced = 0usize;
            while self.rx.try_recv().is_ok() {
                coalesced += 1;
            }
            if coalesced > 0 {
                trace!("Coalesced {} sensor events", coalesced);
            }

            self.sample();
        }
    }

    fn sample(&mut self) {
        match self.sensor.read() {
            Ok(position) if self.last != Some(position) => {
                debug!("Door position settled: {}", position);
                self.last = Some(position);
                self.controller.update_door_position(position);
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to read door sensor: {}", e),
        }
    }
}

/// Handle to a running position worker.
#[derive(Debug)]
pub struct PositionHandle {
    task: JoinHandle<()>,
    interrupt: PositionInterrupt,
}

impl PositionHandle {
    pub fn interrupt(&self) -> &PositionInterrupt {
        &self.interrupt
    }

    pub fn dropped_edges(&self) -> u64 {
        self.interrupt.dropped_edges()
    }

    /// Stop the worker and its poll timer.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}
