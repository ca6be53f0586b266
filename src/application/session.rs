use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::DownloadPhase;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub active: bool,
    pub paused: bool,
    pub phase: DownloadPhase,
}

/// Cloneable handle to the single session's flags.
#[derive(Debug, Clone)]
pub struct SessionControl {
    tx: Arc<watch::Sender<ControlState>>,
}

impl Default for SessionControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionControl {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ControlState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn state(&self) -> ControlState {
        *self.tx.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.tx.borrow().active
    }

    pub fn is_paused(&self) -> bool {
        self.tx.borrow().paused
    }

    /// Marks a session active and unpaused. Returns `false` if one already is.
    pub fn try_activate(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.active {
                return false;
            }
            *state = ControlState {
                active: true,
                paused: false,
                phase: DownloadPhase::Idle,
            };
            true
        })
    }

    pub fn deactivate(&self) {
        self.tx.send_modify(|state| *state = ControlState::default());
    }

    pub fn set_phase(&self, phase: DownloadPhase) {
        self.tx.send_if_modified(|state| {
            if state.phase == phase {
                return false;
            }
            state.phase = phase;
            true
        });
    }

    /// Flips the pause flag of the active session and returns the new value.
    /// Does nothing and returns `None` when no session is active.
    pub fn toggle_pause(&self) -> Option<bool> {
        let mut paused = None;
        self.tx.send_if_modified(|state| {
            if !state.active {
                return false;
            }
            state.paused = !state.paused;
            paused = Some(state.paused);
            true
        });
        paused
    }

    /// Blocks until the session is unpaused or deactivated.
    /// Returns whether the session is still active.
    pub async fn wait_until_resumed(&self) -> bool {
        let mut rx = self.tx.subscribe();
        let active = match rx.wait_for(|state| !state.active || !state.paused).await {
            Ok(state) => state.active,
            Err(_) => false,
        };
        active
    }
}
