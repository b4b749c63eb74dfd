//! Alert queueing and display scheduling.
//!
//! This module provides the core of the overlay: alerts are queued, then displayed one at
//! a time. The system consists of four main components:
//!
//! - [`AlertRecord`]: One notification with its typed, possibly missing payload
//! - [`PriorityQueue`]: A two-band FIFO whose low band can be locked
//! - [`AlertScheduler`]: Runs single-flight display cycles over the queue
//! - [`DisplayLoop`]: The task owning the scheduler, fed through [`DisplayHandle`]s
//!
//! # Architecture
//!
//! Alert producers never touch the scheduler directly. They hold a [`DisplayHandle`]
//! and send commands to the [`DisplayLoop`], which arms one timer for the alert on screen
//! and one failsafe timer for a timed queue lock. Critical alerts, such as countdown
//! ticks, bypass the lock and cut the current wait short.
//!
//! # Example Usage
//!
//! ```ignore
//! let (display, handle) = DisplayLoop::new(AlertScheduler::new(renderer, LogPresenter::new()));
//! tokio::spawn(display.run());
//!
//! handle.lock_queue_for(Duration::from_secs(5));
//! handle.register_alert(AlertRecord::new("Karl", AlertPayload::Countdown(Some(3))), Priority::Critical);
//! ```

mod alert;
mod display;
mod queue;
mod scheduler;

pub use crate::alerts::alert::{
    AlertKind, AlertPayload, AlertRecord, ConnectionStatus, DeathDescriptor, HintDescriptor,
    HintItem, ItemDescriptor, PlayerDescriptor,
};
#[cfg(test)]
pub(crate) use crate::alerts::display::DisplayCommand;
pub use crate::alerts::display::{DisplayHandle, DisplayLoop};
pub use crate::alerts::queue::{Priority, PriorityQueue};
pub use crate::alerts::scheduler::AlertScheduler;
