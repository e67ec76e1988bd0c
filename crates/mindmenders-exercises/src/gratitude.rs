//! Gratitude journal: up to three short entries, saved once.

use mindmenders_core::{GratitudeEntry, UserId};
use tracing::debug;

use crate::error::{ExerciseError, ExerciseResult};

pub const GRATITUDE_SLOTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GratitudeState {
    Drafting { items: [String; GRATITUDE_SLOTS] },
    Saved(GratitudeEntry),
}

#[derive(Debug, Clone)]
pub struct GratitudeJournal {
    user_id: UserId,
    state: GratitudeState,
}

impl GratitudeJournal {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            state: GratitudeState::Drafting {
                items: Default::default(),
            },
        }
    }

    pub fn state(&self) -> &GratitudeState {
        &self.state
    }

    /// Draft items, empty once saved
    pub fn items(&self) -> &[String] {
        match &self.state {
            GratitudeState::Drafting { items } => items.as_slice(),
            GratitudeState::Saved(_) => &[],
        }
    }

    pub fn set_item(&mut self, index: usize, text: impl Into<String>) -> ExerciseResult<()> {
        let GratitudeState::Drafting { items } = &mut self.state else {
            return Err(ExerciseError::GratitudeSaved);
        };
        let slot = items.get_mut(index).ok_or(ExerciseError::SlotOutOfRange {
            index,
            max: GRATITUDE_SLOTS,
        })?;
        *slot = text.into();
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        self.items().iter().any(|item| !item.trim().is_empty())
    }

    /// Save the non-blank items
    pub fn submit(&mut self) -> ExerciseResult<&GratitudeEntry> {
        let items = match &self.state {
            GratitudeState::Drafting { items } => items,
            GratitudeState::Saved(_) => return Err(ExerciseError::GratitudeSaved),
        };

        let kept: Vec<String> = items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        if kept.is_empty() {
            return Err(ExerciseError::NothingToSave);
        }

        debug!(count = kept.len(), "Gratitude entry saved");
        self.state = GratitudeState::Saved(GratitudeEntry::new(self.user_id.clone(), kept));
        self.saved().ok_or(ExerciseError::NothingToSave)
    }

    pub fn saved(&self) -> Option<&GratitudeEntry> {
        match &self.state {
            GratitudeState::Saved(entry) => Some(entry),
            GratitudeState::Drafting { .. } => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = GratitudeState::Drafting {
            items: Default::default(),
        };
    }
}
