//! # Generic Specialization
//!
//! Turns an open implementation into one closed registration per legal
//! assignment of concrete types to its slots.
//!
//! For every slot the candidate types are the concrete, non-abstract types
//! of all scanned units whose capabilities include each of the slot's
//! constraints. Resource guards are checked before anything is generated;
//! generation itself is a recursive Cartesian product that checks the
//! [`BuildBudget`] at every step so an expiring timeout stops it promptly.

use crate::catalog::{Catalog, Implementation};
use courier_core::{
    CancellationToken, MessageSignature, RegistrationError, ShapeInstance, ShapeKind, TypeKey,
};
use std::time::{Duration, Instant};
use tracing::debug;

/// Upper bounds on specialization. `0` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of slots an open implementation may have.
    pub max_generic_slots: usize,
    /// Maximum number of candidate types for any one slot.
    pub max_candidates_per_slot: usize,
    /// Maximum number of specializations of one open implementation.
    pub max_specialization_product: usize,
}

fn exceeds(value: usize, limit: usize) -> bool {
    limit > 0 && value > limit
}

/// Time and cancellation bound of a registry build.
#[derive(Debug, Clone)]
pub struct BuildBudget {
    deadline: Option<Instant>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl BuildBudget {
    /// A budget expiring `timeout` from now or when `cancel` fires.
    ///
    /// `None`, or a timeout too large to represent as a deadline, never
    /// expires.
    pub fn new(timeout: Option<Duration>, cancel: CancellationToken) -> Self {
        Self {
            deadline: timeout.and_then(|timeout| Instant::now().checked_add(timeout)),
            timeout: timeout.unwrap_or_default(),
            cancel,
        }
    }

    /// A budget that never runs out.
    pub fn unbounded() -> Self {
        Self::new(None, CancellationToken::new())
    }

    /// Fails once the deadline has passed or the token fired.
    pub fn check(&self) -> Result<(), RegistrationError> {
        if self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Err(RegistrationError::TimedOut(self.timeout));
        }
        if self.cancel.is_cancelled() {
            return Err(RegistrationError::Cancelled);
        }
        Ok(())
    }
}

/// One closed registration produced from an open implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specialization {
    /// The open implementation's key with the binding substituted.
    pub implementation: TypeKey,
    /// The closed shape instance.
    pub shape: ShapeInstance,
    /// The signature it serves.
    pub signature: MessageSignature,
}

/// Specializes open implementations against a catalog.
pub struct Specializer<'a> {
    catalog: &'a Catalog,
    limits: Limits,
    budget: &'a BuildBudget,
}

impl<'a> Specializer<'a> {
    /// Creates a specializer.
    pub fn new(catalog: &'a Catalog, limits: Limits, budget: &'a BuildBudget) -> Self {
        Self {
            catalog,
            limits,
            budget,
        }
    }

    /// Every closed registration of `open`.
    ///
    /// Implementations whose message argument is a bare slot are skipped.
    pub fn specialize(
        &self,
        open: &Implementation,
    ) -> Result<Vec<Specialization>, RegistrationError> {
        self.budget.check()?;

        let shape = open.shape();
        if shape.message().is_slot() {
            debug!(
                implementation = %open.key(),
                shape = %shape,
                "skipping open handler whose message is a bare slot"
            );
            return Ok(Vec::new());
        }

        let candidates = self.candidates(open)?;
        let bindings = self.combinations(&candidates, 0)?;

        let mut specializations = Vec::with_capacity(bindings.len());
        for binding in bindings {
            if let Some(specialization) = self.close(open, &binding) {
                specializations.push(specialization);
            }
        }
        debug!(
            implementation = %open.key(),
            count = specializations.len(),
            "specialized open implementation"
        );
        Ok(specializations)
    }

    /// Candidate lists per slot, after every resource guard.
    fn candidates(&self, open: &Implementation) -> Result<Vec<Vec<TypeKey>>, RegistrationError> {
        let slots = open.slot_count();
        let message = open.shape().message();
        if exceeds(slots, self.limits.max_generic_slots) {
            return Err(RegistrationError::TooManySlots {
                implementation: open.key().clone(),
                message: message.clone(),
                slots,
                max: self.limits.max_generic_slots,
            });
        }

        let mut lists = Vec::with_capacity(slots);
        for slot in 0..slots {
            let list = self.catalog.candidates(open.slot_constraints(slot));
            if exceeds(list.len(), self.limits.max_candidates_per_slot) {
                return Err(RegistrationError::TooManyCandidates {
                    implementation: open.key().clone(),
                    message: message.clone(),
                    slot,
                    candidates: list.len(),
                    max: self.limits.max_candidates_per_slot,
                });
            }
            lists.push(list);
        }

        let mut product: usize = 1;
        for list in &lists {
            product = product.saturating_mul(list.len());
            if exceeds(product, self.limits.max_specialization_product) {
                return Err(RegistrationError::ProductTooLarge {
                    implementation: open.key().clone(),
                    message: message.clone(),
                    max: self.limits.max_specialization_product,
                });
            }
        }
        Ok(lists)
    }

    /// Every combination of candidates from `slot` onwards.
    fn combinations(
        &self,
        candidates: &[Vec<TypeKey>],
        slot: usize,
    ) -> Result<Vec<Vec<TypeKey>>, RegistrationError> {
        self.budget.check()?;
        let Some(choices) = candidates.get(slot) else {
            return Ok(vec![Vec::new()]);
        };
        let tails = self.combinations(candidates, slot + 1)?;
        let mut out = Vec::with_capacity(choices.len() * tails.len());
        for choice in choices {
            for tail in &tails {
                let mut combination = Vec::with_capacity(tail.len() + 1);
                combination.push(choice.clone());
                combination.extend(tail.iter().cloned());
                out.push(combination);
            }
        }
        Ok(out)
    }

    fn close(&self, open: &Implementation, binding: &[TypeKey]) -> Option<Specialization> {
        let shape = open.shape();
        let message = shape.message().substitute(binding)?;
        let args = match shape.kind() {
            ShapeKind::RequestHandler | ShapeKind::PipelineBehavior => {
                let response = match self.catalog.infer_response(&message) {
                    Some(response) => response,
                    None => shape.response()?.substitute(binding)?,
                };
                vec![message, response]
            }
            ShapeKind::CommandHandler | ShapeKind::NotificationHandler => vec![message],
        };
        let shape = ShapeInstance::new(shape.kind(), args);
        Some(Specialization {
            implementation: open.key().substitute(binding)?,
            signature: shape.signature()?,
            shape,
        })
    }
}
