//! The single active echo configuration
//!
//! [`FractalEcho`] owns the parameter set and the published [`EchoPattern`].
//! Parameter writes regenerate to completion first and then swap the shared
//! snapshot, so a reader holding an `Arc<EchoPattern>` never observes a
//! half-built pattern. Setting the note while a velocity is stored fires the
//! echo scheduler, exactly like a note-on arriving at the note inlet.

use crate::error::ParamError;
use crate::expander::EchoPattern;
use crate::scheduler::EchoScheduler;
use crate::types::{EchoParams, ParamSlot, PatternSummary};
use std::sync::{Arc, RwLock};

/// What a single parameter write caused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamChange {
    /// New summary when the write reshaped the pattern
    pub regenerated: Option<PatternSummary>,
    /// Emissions scheduled by an implied note trigger
    pub scheduled: usize,
}

pub struct FractalEcho {
    params: RwLock<EchoParams>,
    pattern: RwLock<Arc<EchoPattern>>,
    scheduler: EchoScheduler,
}

impl FractalEcho {
    pub fn new(scheduler: EchoScheduler) -> Self {
        Self::with_params(EchoParams::default(), scheduler)
    }

    pub fn with_params(params: EchoParams, scheduler: EchoScheduler) -> Self {
        let pattern = Arc::new(EchoPattern::generate(&params, 0));
        Self {
            params: RwLock::new(params),
            pattern: RwLock::new(pattern),
            scheduler,
        }
    }

    /// Snapshot of the current parameters
    pub fn params(&self) -> EchoParams {
        self.params
            .read()
            .map(|p| p.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// The currently published pattern
    pub fn pattern(&self) -> Arc<EchoPattern> {
        self.pattern
            .read()
            .map(|p| p.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn scheduler(&self) -> &EchoScheduler {
        &self.scheduler
    }

    /// Write `value` to the slot at inlet position `index`
    pub fn set_parameter(&self, index: usize, value: f64) -> Result<ParamChange, ParamError> {
        let slot = ParamSlot::from_index(index)?;
        self.set(slot, value)
    }

    /// Write `value` to `slot`, regenerating and/or triggering as the slot demands
    pub fn set(&self, slot: ParamSlot, value: f64) -> Result<ParamChange, ParamError> {
        let mut change = ParamChange::default();
        let params = {
            let mut params = self.params.write().unwrap_or_else(|e| e.into_inner());
            params.set(slot, value)?;
            // Publish under the params lock so concurrent writers publish in write order
            if slot.regenerates() {
                change.regenerated = Some(self.regenerate(&params));
            }
            params.clone()
        };

        if slot == ParamSlot::Note && params.velocity > 0 {
            change.scheduled = self.trigger(params.note, params.velocity);
        }
        Ok(change)
    }

    /// Trigger the echo with the stored note and velocity
    pub fn trigger_note(&self) -> usize {
        let params = self.params();
        self.trigger(params.note, params.velocity)
    }

    /// Trigger the echo with an explicit note and velocity
    pub fn trigger(&self, note: i32, velocity: i32) -> usize {
        let pattern = self.pattern();
        self.scheduler.trigger_pattern(&pattern, note, velocity)
    }

    fn regenerate(&self, params: &EchoParams) -> PatternSummary {
        let mut published = self.pattern.write().unwrap_or_else(|e| e.into_inner());
        let next = EchoPattern::generate(params, published.generation + 1);
        let summary = next.summary;
        *published = Arc::new(next);
        summary
    }
}
