//! Matrix scanning with debounce.
//!
//! The poller samples a [`MatrixScanner`] on a fixed interval. A key has to
//! read the same way for `debounce_ticks` consecutive scans before a change
//! is reported, so contact chatter shorter than that never reaches the
//! decoder.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use doorlock_core::KeypadConfig;
use doorlock_hardware::{KeyCoord, MatrixScanner, ScanReport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
struct Debounce {
    down: bool,
    streak: u8,
}

/// Debounced matrix poller.
pub struct MatrixPoller {
    scanner: Box<dyn MatrixScanner>,
    interval: Duration,
    debounce_ticks: u8,
    keys: BTreeMap<KeyCoord, Debounce>,
}

impl MatrixPoller {
    pub fn new(scanner: Box<dyn MatrixScanner>, config: &KeypadConfig) -> Self {
        Self {
            scanner,
            interval: config.scan_interval(),
            debounce_ticks: config.debounce_ticks.max(1),
            keys: BTreeMap::new(),
        }
    }

    /// Scan once and report keys whose debounced state changed.
    ///
    /// # Errors
    ///
    /// Returns the scanner's error; debounce state is left untouched.
    pub fn poll(&mut self) -> Result<ScanReport> {
        let held: BTreeSet<KeyCoord> = self.scanner.scan()?.into_iter().collect();
        let mut report = ScanReport::default();

        for &coord in &held {
            self.keys.entry(coord).or_default();
        }

        let threshold = self.debounce_ticks;
        self.keys.retain(|&coord, key| {
            let raw = held.contains(&coord);
            if raw == key.down {
                key.streak = 0;
            } else {
                key.streak += 1;
                if key.streak >= threshold {
                    key.down = raw;
                    key.streak = 0;
                    if raw {
                        report.pressed.push(coord);
                    } else {
                        report.released.push(coord);
                    }
                }
            }
            key.down || key.streak > 0
        });

        Ok(report)
    }

    /// Spawn the scan loop, sending non-empty reports to `tx`.
    ///
    /// The loop ends when the receiver is dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(self, tx: mpsc::Sender<ScanReport>) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }

    async fn run(mut self, tx: mpsc::Sender<ScanReport>) {
        let size = self.scanner.size();
        info!(
            "Key matrix poller started ({}, every {}ms, {} ticks debounce)",
            size,
            self.interval.as_millis(),
            self.debounce_ticks
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failing = false;

        loop {
            ticker.tick().await;
            match self.poll() {
                Ok(report) => {
                    if failing {
                        info!("Key matrix scanning recovered");
                        failing = false;
                    }
                    if report.is_empty() {
                        continue;
                    }
                    if tx.send(report).await.is_err() {
                        debug!("Keypad consumer gone, stopping poller");
                        return;
                    }
                }
                Err(e) => {
                    if !failing {
                        warn!("Key matrix scan failed: {}", e);
                        failing = true;
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for MatrixPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixPoller")
            .field("size", &self.scanner.size())
            .field("interval", &self.interval)
            .field("debounce_ticks", &self.debounce_ticks)
            .finish()
    }
}
