//! Fixed-rate driver that ticks every room and broadcasts its state

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::util::time::tick_interval;
use crate::ws::hub::ConnectionHub;
use crate::ws::protocol::ServerMsg;

use super::registry::RoomRegistry;

/// Drives all rooms at the simulation rate
pub struct Scheduler {
    registry: Arc<RoomRegistry>,
    hub: Arc<ConnectionHub>,
    period: Duration,
}

impl Scheduler {
    pub fn new(registry: Arc<RoomRegistry>, hub: Arc<ConnectionHub>) -> Self {
        Self {
            registry,
            hub,
            period: tick_interval(),
        }
    }

    /// Tick every registered room once; returns how many ticked cleanly
    ///
    /// A panic inside one room is logged and the cycle moves on.
    pub fn run_once(&self) -> usize {
        let mut ticked = 0;

        for room in self.registry.rooms() {
            match panic::catch_unwind(AssertUnwindSafe(|| room.tick_for_broadcast())) {
                Ok((snapshot, recipients)) => {
                    self.hub.broadcast(&recipients, &ServerMsg::State(snapshot));
                    ticked += 1;
                }
                Err(_) => {
                    error!(room_id = %room.id(), "Room tick panicked, skipping this cycle");
                }
            }
        }

        ticked
    }

    /// Run the tick loop forever
    pub async fn run(self) {
        info!(period_ms = self.period.as_millis() as u64, "Room scheduler started");

        let mut tick_interval = interval(self.period);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;
            self.run_once();
        }
    }

    /// Spawn the tick loop as a tokio task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
