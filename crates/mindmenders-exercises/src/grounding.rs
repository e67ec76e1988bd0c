//! 5-4-3-2-1 grounding: name things for each sense, one step at a time.

use mindmenders_core::{GroundingSession, UserId};

use crate::error::{ExerciseError, ExerciseResult};

/// One sense prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundingStep {
    pub count: u8,
    pub prompt: &'static str,
}

pub static GROUNDING_STEPS: [GroundingStep; 5] = [
    GroundingStep { count: 5, prompt: "Things you SEE" },
    GroundingStep { count: 4, prompt: "Things you can FEEL" },
    GroundingStep { count: 3, prompt: "Things you can HEAR" },
    GroundingStep { count: 2, prompt: "Things you can SMELL" },
    GroundingStep { count: 1, prompt: "Thing you can TASTE" },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundingState {
    /// Zero-based index into [`GROUNDING_STEPS`]
    InProgress { step: usize },
    Finished(GroundingSession),
}

#[derive(Debug, Clone)]
pub struct GroundingExercise {
    user_id: UserId,
    state: GroundingState,
}

impl GroundingExercise {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            state: GroundingState::InProgress { step: 0 },
        }
    }

    pub fn state(&self) -> &GroundingState {
        &self.state
    }

    pub fn current_step(&self) -> Option<&'static GroundingStep> {
        match self.state {
            GroundingState::InProgress { step } => GROUNDING_STEPS.get(step),
            GroundingState::Finished(_) => None,
        }
    }

    /// 1-based position for display, e.g. "Step 2 of 5"
    pub fn step_number(&self) -> usize {
        match self.state {
            GroundingState::InProgress { step } => step + 1,
            GroundingState::Finished(_) => GROUNDING_STEPS.len(),
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, GroundingState::Finished(_))
    }

    pub fn session(&self) -> Option<&GroundingSession> {
        match &self.state {
            GroundingState::Finished(session) => Some(session),
            GroundingState::InProgress { .. } => None,
        }
    }

    pub fn button_label(&self) -> &'static str {
        match self.state {
            GroundingState::InProgress { step } if step + 1 == GROUNDING_STEPS.len() => {
                "Complete Grounding"
            }
            _ => "Next Category",
        }
    }

    /// Move to the next sense; the fifth step finishes the session
    pub fn next(&mut self) -> ExerciseResult<&GroundingState> {
        let step = match self.state {
            GroundingState::InProgress { step } => step,
            GroundingState::Finished(_) => return Err(ExerciseError::GroundingFinished),
        };

        self.state = if step + 1 < GROUNDING_STEPS.len() {
            GroundingState::InProgress { step: step + 1 }
        } else {
            GroundingState::Finished(GroundingSession::completed_now(self.user_id.clone()))
        };
        Ok(&self.state)
    }

    pub fn restart(&mut self) {
        self.state = GroundingState::InProgress { step: 0 };
    }
}
