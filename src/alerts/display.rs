//! Task driving an [`AlertScheduler`] from commands and timers.
//!
//! The scheduler is owned by a single [`DisplayLoop`] task. Every other component talks to
//! it through a cloneable [`DisplayHandle`], which sends [`DisplayCommand`]s over an
//! unbounded channel. The loop keeps two timers: the wait of the alert on screen and the
//! failsafe unlock of a timed queue lock.

use std::{pin::Pin, sync::Arc, time::Duration};

use log::{debug, info, warn};
use tokio::{
    sync::{
        Notify,
        mpsc::{self, UnboundedReceiver, UnboundedSender},
    },
    time::{Sleep, sleep},
};

use crate::{
    alerts::{AlertRecord, AlertScheduler, Priority},
    render::Presenter,
};

/// A pending timer and the cycle generation or lock epoch it belongs to.
type Timer = Option<(u64, Pin<Box<Sleep>>)>;

#[derive(Debug, PartialEq)]
pub(crate) enum DisplayCommand {
    Register(AlertRecord, Priority),
    Lock,
    /// Lock with a failsafe unlock after the duration
    LockFor(Duration),
    Unlock,
}

/// Cloneable handle to a running [`DisplayLoop`].
#[derive(Debug, Clone)]
pub struct DisplayHandle {
    commands: UnboundedSender<DisplayCommand>,
}

impl DisplayHandle {
    /// Creates a handle and the receiving end of its command channel.
    pub(crate) fn channel() -> (Self, UnboundedReceiver<DisplayCommand>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        (DisplayHandle { commands }, receiver)
    }

    pub fn register_alert(&self, record: AlertRecord, priority: Priority) {
        self.send(DisplayCommand::Register(record, priority));
    }

    pub fn lock_queue(&self) {
        self.send(DisplayCommand::Lock);
    }

    /// Locks the queue and unlocks it after `duration` unless it is unlocked before.
    pub fn lock_queue_for(&self, duration: Duration) {
        self.send(DisplayCommand::LockFor(duration));
    }

    pub fn unlock_queue(&self) {
        self.send(DisplayCommand::Unlock);
    }

    fn send(&self, command: DisplayCommand) {
        if let Err(e) = self.commands.send(command) {
            warn!("display loop stopped, dropping {:?}", e.0);
        }
    }
}

/// The task owning the scheduler.
pub struct DisplayLoop<P: Presenter> {
    scheduler: AlertScheduler<P>,
    commands: UnboundedReceiver<DisplayCommand>,
    wake: Arc<Notify>,
}

impl<P: Presenter> DisplayLoop<P> {
    pub fn new(scheduler: AlertScheduler<P>) -> (Self, DisplayHandle) {
        let (handle, commands) = DisplayHandle::channel();
        let wake = scheduler.subscribe();
        let display = DisplayLoop {
            scheduler,
            commands,
            wake,
        };
        (display, handle)
    }

    /// Runs display cycles until every [`DisplayHandle`] is dropped.
    ///
    /// Once the handles are gone, the queue is unlocked and drained before returning.
    pub async fn run(mut self) {
        let mut wait: Timer = None;
        let mut failsafe: Timer = None;
        let mut closed = false;

        info!("display loop started");

        loop {
            if let Some(next) = self.scheduler.attempt_cycle() {
                // Replaces the wait of a cycle interrupted by a critical alert
                wait = Some((next.generation, Box::pin(sleep(next.duration))));
            }
            if closed && wait.is_none() {
                break;
            }

            tokio::select! {
                biased;

                command = self.commands.recv(), if !closed => match command {
                    Some(command) => self.handle(command, &mut failsafe),
                    None => {
                        debug!("all display handles dropped, draining {} alerts", self.scheduler.pending());
                        closed = true;
                        failsafe = None;
                        self.scheduler.unlock_queue();
                    }
                },
                generation = expire(&mut wait) => {
                    if let Some(next) = self.scheduler.on_wait_elapsed(generation) {
                        wait = Some((next.generation, Box::pin(sleep(next.duration))));
                    }
                }
                epoch = expire(&mut failsafe) => {
                    info!("failsafe unlock of lock {}", epoch);
                    self.scheduler.release_lock(epoch);
                }
                _ = self.wake.notified() => {}
            }
        }

        info!("display loop stopped");
    }

    fn handle(&mut self, command: DisplayCommand, failsafe: &mut Timer) {
        match command {
            DisplayCommand::Register(record, priority) => {
                self.scheduler.register_alert(record, priority)
            }
            DisplayCommand::Lock => {
                self.scheduler.lock_queue();
                *failsafe = None;
            }
            DisplayCommand::LockFor(duration) => {
                let epoch = self.scheduler.lock_queue();
                *failsafe = Some((epoch, Box::pin(sleep(duration))));
            }
            DisplayCommand::Unlock => {
                self.scheduler.unlock_queue();
                *failsafe = None;
            }
        }
    }
}

/// Resolves when the timer fires, disarming it. Never resolves for an unarmed timer.
async fn expire(timer: &mut Timer) -> u64 {
    match timer {
        Some((id, sleep)) => {
            sleep.as_mut().await;
            let id = *id;
            *timer = None;
            id
        }
        None => std::future::pending().await,
    }
}
