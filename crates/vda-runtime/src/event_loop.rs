//! Single-consumer event loop around a `VehicleController`.
//!
//! Inbound messages arrive on a bounded `mpsc` queue, so the controller is
//! only ever touched by this one task. A stamped state message is broadcast
//! after every event and on every publish tick.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use vda_order::ProtocolError;
use vda_schemas::{InstantActionsMessage, OrderMessage, StateMessage};

use crate::controller::VehicleController;

/// Capacity of the outbound state broadcast. Slow subscribers lag, they never block the loop.
const STATE_BUS_CAPACITY: usize = 64;

/// One inbound message. Serialized externally tagged:
/// `{"order": {..}}`, `{"instantActions": {..}}`, `{"progress": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectorEvent {
    Order(OrderMessage),
    InstantActions(InstantActionsMessage),
    Progress(StateMessage),
}

impl ConnectorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectorEvent::Order(_) => "order",
            ConnectorEvent::InstantActions(_) => "instantActions",
            ConnectorEvent::Progress(_) => "progress",
        }
    }
}

impl VehicleController {
    /// Route one event to the matching handler.
    pub fn apply(&mut self, event: &ConnectorEvent) -> Result<(), ProtocolError> {
        match event {
            ConnectorEvent::Order(msg) => self.handle_order(msg).map(|_| ()),
            ConnectorEvent::InstantActions(msg) => self.handle_instant_actions(msg),
            ConnectorEvent::Progress(report) => self.handle_progress(report).map(|_| ()),
        }
    }
}

pub struct ConnectorHandle {
    events: mpsc::Sender<ConnectorEvent>,
    states: broadcast::Sender<StateMessage>,
    task: JoinHandle<VehicleController>,
}

impl ConnectorHandle {
    /// Sender for inbound events. Clones keep the loop alive.
    pub fn events(&self) -> mpsc::Sender<ConnectorEvent> {
        self.events.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateMessage> {
        self.states.subscribe()
    }

    /// Enqueue one event; waits while the queue is full.
    pub async fn send(&self, event: ConnectorEvent) -> Result<(), mpsc::error::SendError<ConnectorEvent>> {
        self.events.send(event).await
    }

    /// Drop this handle's sender and wait for the loop to drain and stop.
    ///
    /// Returns once every other sender obtained from [`Self::events`] is gone too.
    pub async fn shutdown(self) -> Result<VehicleController, JoinError> {
        let Self { events, task, .. } = self;
        drop(events);
        task.await
    }
}

/// Run `controller` on a tokio task.
pub fn spawn_connector(
    controller: VehicleController,
    queue_capacity: usize,
    publish_interval: Duration,
) -> ConnectorHandle {
    let (events, rx) = mpsc::channel(queue_capacity.max(1));
    let (states, _rx) = broadcast::channel(STATE_BUS_CAPACITY);
    let task = tokio::spawn(run_loop(controller, rx, states.clone(), publish_interval));
    ConnectorHandle {
        events,
        states,
        task,
    }
}

async fn run_loop(
    mut controller: VehicleController,
    mut rx: mpsc::Receiver<ConnectorEvent>,
    states: broadcast::Sender<StateMessage>,
    publish_interval: Duration,
) -> VehicleController {
    let mut ticker = tokio::time::interval(publish_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(event) = maybe else { break };
                debug!(kind = event.kind(), "connector event");
                // Rejections are already logged and recorded by the controller.
                let _ = controller.apply(&event);
                publish(&mut controller, &states);
            }
            _ = ticker.tick() => publish(&mut controller, &states),
        }
    }

    info!(order_id = controller.state().order_id(), "connector event loop stopped");
    controller
}

fn publish(controller: &mut VehicleController, states: &broadcast::Sender<StateMessage>) {
    // No subscribers is not an error.
    let _ = states.send(controller.publish_state(Utc::now()));
}
