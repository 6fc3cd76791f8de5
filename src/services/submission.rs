//! Lead form submission flow.
//!
//! Owns the editable form fields and a single-flight guard, hands a snapshot
//! of the fields to the dispatcher, and reports `(fields, outcome)` to the
//! caller. A delivered lead clears the form; a failed one leaves the fields so
//! the visitor can fix them and resubmit.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::dispatch::{DispatchOutcome, NotificationDispatcher};
use crate::lead::LeadFormData;

struct FormState {
    fields: LeadFormData,
    submitting: bool,
}

fn lock_form(state: &Mutex<FormState>) -> MutexGuard<'_, FormState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the `submitting` flag for one submit. Dropping it unsettled (the
/// submit future was abandoned mid-dispatch) releases the flag.
struct SubmitSlot<'a> {
    state: &'a Mutex<FormState>,
    settled: bool,
}

impl SubmitSlot<'_> {
    fn settle(mut self, outcome: &DispatchOutcome) {
        self.settled = true;
        let mut state = lock_form(self.state);
        state.submitting = false;
        if outcome.success {
            state.fields = LeadFormData::default();
        }
    }
}

impl Drop for SubmitSlot<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("submission: submit abandoned before completion");
            lock_form(self.state).submitting = false;
        }
    }
}

pub struct FormSubmissionFlow {
    dispatcher: NotificationDispatcher,
    state: Mutex<FormState>,
}

impl FormSubmissionFlow {
    #[must_use]
    pub fn new(dispatcher: NotificationDispatcher) -> Self {
        Self { dispatcher, state: Mutex::new(FormState { fields: LeadFormData::default(), submitting: false }) }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        lock_form(&self.state)
    }

    pub fn set_full_name(&self, value: impl Into<String>) {
        self.lock().fields.full_name = value.into();
    }

    pub fn set_email(&self, value: impl Into<String>) {
        self.lock().fields.email = value.into();
    }

    pub fn set_fitness_goal(&self, value: impl Into<String>) {
        self.lock().fields.fitness_goal = value.into();
    }

    pub fn set_days_per_week(&self, value: impl Into<String>) {
        self.lock().fields.days_per_week = value.into();
    }

    /// Replace every field at once.
    pub fn fill(&self, fields: LeadFormData) {
        self.lock().fields = fields;
    }

    #[must_use]
    pub fn fields(&self) -> LeadFormData {
        self.lock().fields.clone()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.lock().submitting
    }

    /// Submit the current fields.
    ///
    /// Returns `None` and does nothing while an earlier submit is in flight.
    /// Otherwise `on_result` receives the submitted fields and the outcome
    /// before this returns it. Dropping the returned future mid-dispatch
    /// leaves the fields untouched and the flow ready for another submit.
    pub async fn submit<F>(&self, on_result: F) -> Option<DispatchOutcome>
    where
        F: FnOnce(&LeadFormData, &DispatchOutcome),
    {
        let snapshot = {
            let mut state = self.lock();
            if state.submitting {
                debug!("submission: ignored re-entrant submit");
                return None;
            }
            state.submitting = true;
            state.fields.clone()
        };
        let slot = SubmitSlot { state: &self.state, settled: false };

        let outcome = self.dispatcher.send(&snapshot).await;
        slot.settle(&outcome);

        on_result(&snapshot, &outcome);
        Some(outcome)
    }
}

#[cfg(test)]
#[path = "submission_test.rs"]
mod tests;
