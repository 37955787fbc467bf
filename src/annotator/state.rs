use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToolState {
    Inactive,
    Active,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAction {
    Activate,
    Pause,
    Resume,
    Deactivate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ToolStateError {
    #[error("cannot {action:?} while {from:?}")]
    InvalidTransition { from: ToolState, action: ToolAction },
}

#[derive(Debug)]
pub struct ToolStateMachine {
    state: ToolState,
}

impl Default for ToolStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolStateMachine {
    pub fn new() -> Self {
        Self {
            state: ToolState::Inactive,
        }
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    /// Active or Paused; what the control surface reports as `isActive`.
    pub fn is_engaged(&self) -> bool {
        self.state != ToolState::Inactive
    }

    /// Pointer handling only runs while Active.
    pub fn is_tracking(&self) -> bool {
        self.state == ToolState::Active
    }

    fn transition(
        &mut self,
        allowed: &[ToolState],
        to: ToolState,
        action: ToolAction,
    ) -> Result<(), ToolStateError> {
        if allowed.contains(&self.state) {
            self.state = to;
            Ok(())
        } else {
            Err(ToolStateError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    pub fn activate(&mut self) -> Result<(), ToolStateError> {
        self.transition(&[ToolState::Inactive], ToolState::Active, ToolAction::Activate)
    }

    pub fn pause(&mut self) -> Result<(), ToolStateError> {
        self.transition(&[ToolState::Active], ToolState::Paused, ToolAction::Pause)
    }

    pub fn resume(&mut self) -> Result<(), ToolStateError> {
        self.transition(&[ToolState::Paused], ToolState::Active, ToolAction::Resume)
    }

    pub fn deactivate(&mut self) -> Result<(), ToolStateError> {
        self.transition(
            &[ToolState::Active, ToolState::Paused],
            ToolState::Inactive,
            ToolAction::Deactivate,
        )
    }

    /// Pause when Active, resume when Paused.
    pub fn toggle_pause(&mut self) -> Result<ToolState, ToolStateError> {
        match self.state {
            ToolState::Paused => self.resume()?,
            _ => self.pause()?,
        }
        Ok(self.state)
    }
}
