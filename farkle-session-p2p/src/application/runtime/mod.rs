use crate::application::{
    ClientCommand, ClientSessionLoop, HostCommand, HostSessionLoop, SessionEvent,
};
use crate::error::{P2PError, Result};
use crate::infrastructure::Transport;
use instant::Duration;
use tokio::sync::{broadcast, mpsc};

/// A session loop the runtime can pump
pub trait SessionDriver: Send + 'static {
    type Command: Send + 'static;

    fn apply(&mut self, command: Self::Command);
    fn poll(&mut self) -> usize;
    fn drain_events(&mut self) -> Vec<SessionEvent>;
}

impl<T: Transport + Send + 'static> SessionDriver for HostSessionLoop<T> {
    type Command = HostCommand;

    fn apply(&mut self, command: HostCommand) {
        self.apply_command(command);
    }

    fn poll(&mut self) -> usize {
        HostSessionLoop::poll(self)
    }

    fn drain_events(&mut self) -> Vec<SessionEvent> {
        HostSessionLoop::drain_events(self)
    }
}

impl<T: Transport + Send + 'static> SessionDriver for ClientSessionLoop<T> {
    type Command = ClientCommand;

    fn apply(&mut self, command: ClientCommand) {
        self.apply_command(command);
    }

    fn poll(&mut self) -> usize {
        ClientSessionLoop::poll(self)
    }

    fn drain_events(&mut self) -> Vec<SessionEvent> {
        ClientSessionLoop::drain_events(self)
    }
}

/// Tokio driver around a session loop
///
/// Owns the loop on a spawned task, pumps `poll()` on an interval, accepts
/// commands over an mpsc channel and republishes observer events on a
/// broadcast channel. UI layers subscribe instead of holding any reference
/// into session state.
pub struct SessionRuntime<C> {
    commands: mpsc::UnboundedSender<C>,
    events: broadcast::Sender<SessionEvent>,
    task: tokio::task::JoinHandle<()>,
}

impl<C: Send + 'static> SessionRuntime<C> {
    pub fn spawn<D: SessionDriver<Command = C>>(mut driver: D, poll_interval: Duration) -> Self {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<C>();
        let (event_tx, _) = broadcast::channel(256);
        let events = event_tx.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    command = command_rx.recv() => match command {
                        Some(command) => driver.apply(command),
                        // Every handle dropped: session teardown
                        None => break,
                    },
                    _ = ticker.tick() => {
                        driver.poll();
                        for event in driver.drain_events() {
                            // No subscribers is fine
                            let _ = event_tx.send(event);
                        }
                    }
                }
            }
        });

        Self {
            commands: command_tx,
            events,
            task,
        }
    }

    pub fn send(&self, command: C) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| P2PError::ChannelClosed)
    }

    /// Subscribe to observer events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Cancel the poll task (session teardown)
    pub fn shutdown(&self) {
        self.task.abort();
    }
}
