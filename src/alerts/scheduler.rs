//! Single-flight alert scheduling.
//!
//! The [`AlertScheduler`] owns the alert queue, the renderer and the presenter. It runs
//! at most one display cycle at a time: a cycle pops a record, renders and shows it, then
//! hands a [`Wait`] back to its driver. The next cycle only starts once that wait has
//! elapsed, except for critical alerts which cut the wait short.
//!
//! The scheduler holds no timers itself. It is driven by [`crate::alerts::DisplayLoop`],
//! which arms a timer for every returned [`Wait`] and reports its expiry through
//! [`AlertScheduler::on_wait_elapsed`].

use std::{sync::Arc, time::Duration};

use log::{debug, info};
use tokio::sync::Notify;

use crate::{
    alerts::{AlertRecord, Priority, PriorityQueue},
    render::{AlertRenderer, Presenter},
};

/// The visible period of the alert currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    /// Identifies the display cycle the wait belongs to
    pub generation: u64,
    pub duration: Duration,
}

/// Drives display cycles over a [`PriorityQueue`] of alert records.
pub struct AlertScheduler<P: Presenter> {
    queue: PriorityQueue<AlertRecord>,
    renderer: AlertRenderer,
    presenter: P,
    /// Set from the start of a cycle until its wait elapses
    is_animating: bool,
    /// Bumped whenever the current wait becomes obsolete
    generation: u64,
    /// Bumped on every lock, identifies the lock a failsafe unlock belongs to
    lock_epoch: u64,
}

impl<P: Presenter> AlertScheduler<P> {
    pub fn new(renderer: AlertRenderer, presenter: P) -> Self {
        AlertScheduler {
            queue: PriorityQueue::new(),
            renderer,
            presenter,
            is_animating: false,
            generation: 0,
            lock_epoch: 0,
        }
    }

    /// Returns the notifier signalled when records become available.
    pub fn subscribe(&self) -> Arc<Notify> {
        self.queue.subscribe()
    }

    /// Queues a record for display.
    ///
    /// A critical record ends the wait of the alert on screen: the next call to
    /// [`AlertScheduler::attempt_cycle`] displays it right away. A critical record of an
    /// unrecognized kind displays nothing, so it leaves the wait untouched.
    pub fn register_alert(&mut self, record: AlertRecord, priority: Priority) {
        debug!("register alert {} ({:?})", record, priority);

        if priority == Priority::Critical
            && self.is_animating
            && record.payload.kind().is_some()
        {
            self.is_animating = false;
            self.generation += 1;
        }
        self.queue.push(record, priority);
    }

    /// Starts a display cycle if none is in progress and a record is eligible.
    ///
    /// Records of an unrecognized kind are dropped without touching the presenter and the
    /// next record is tried instead.
    ///
    /// Returns the [`Wait`] to arm, or `None` when no cycle was started.
    pub fn attempt_cycle(&mut self) -> Option<Wait> {
        if self.is_animating {
            return None;
        }

        loop {
            let record = self.queue.pop()?;
            let Some(frame) = self.renderer.render(&record) else {
                continue;
            };

            self.is_animating = true;
            self.generation += 1;

            info!("display {}", record);
            self.presenter.reset();
            self.presenter.show(&frame);

            return Some(Wait {
                generation: self.generation,
                duration: frame.duration,
            });
        }
    }

    /// Ends the wait of cycle `generation` and starts the next cycle.
    ///
    /// The expiry of a superseded wait is ignored.
    pub fn on_wait_elapsed(&mut self, generation: u64) -> Option<Wait> {
        if !self.is_animating || generation != self.generation {
            debug!("ignore stale wait {}", generation);
            return None;
        }

        self.is_animating = false;
        self.attempt_cycle()
    }

    /// Suppresses low priority records and returns the epoch of the new lock.
    pub fn lock_queue(&mut self) -> u64 {
        self.lock_epoch += 1;
        self.queue.lock();
        info!("queue locked (epoch {})", self.lock_epoch);
        self.lock_epoch
    }

    pub fn unlock_queue(&mut self) {
        if self.queue.is_locked() {
            info!("queue unlocked");
        }
        self.queue.unlock();
    }

    /// Unlocks the queue only if the lock `epoch` is still the current one.
    pub fn release_lock(&mut self, epoch: u64) {
        if epoch != self.lock_epoch {
            debug!("ignore failsafe unlock of epoch {}", epoch);
            return;
        }
        self.unlock_queue();
    }

    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    pub fn is_locked(&self) -> bool {
        self.queue.is_locked()
    }

    /// Number of queued records, eligible or not.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
