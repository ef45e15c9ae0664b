//! Seeding
//!
//! Populates the chain top-down from caller-supplied initial values. Each
//! step runs only after the previous step's completion has set the value it
//! reads as parent.

use crate::control::Control;
use crate::error::SeedError;
use crate::populate::{PopulateOutcome, Populator};
use crate::types::OptionValue;
use std::sync::Arc;

/// Summary of a seeding run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Links whose options were written by a capability
    pub links_populated: usize,
    /// Initial values the controls accepted
    pub values_applied: usize,
    /// Steps whose completion lost to a newer change
    pub superseded: usize,
    /// Input error, if the values did not fit the chain
    pub input_error: Option<SeedError>,
}

impl SeedReport {
    /// Check if seeding ran without input errors or superseded steps
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.input_error.is_none() && self.superseded == 0
    }

    fn record(&mut self, outcome: PopulateOutcome) {
        match outcome {
            PopulateOutcome::Applied { .. } => self.links_populated += 1,
            PopulateOutcome::Superseded => self.superseded += 1,
            PopulateOutcome::Cleared => {}
        }
    }

    fn apply(&mut self, control: &dyn Control, value: &OptionValue) {
        control.set_value(value);
        if control.value() == *value {
            self.values_applied += 1;
        } else {
            tracing::debug!(
                "`{}` does not offer initial value {:?}",
                control.id(),
                value.as_str()
            );
        }
    }
}

/// Context of one seeding step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedStep {
    /// Link being populated
    pub index: usize,
    /// Link whose value is the parent value
    pub parent: usize,
}

impl SeedStep {
    fn child_of(parent: usize) -> Self {
        Self {
            index: parent + 1,
            parent,
        }
    }
}

/// Plan the child steps for `values` supplied to a chain of `chain_len` links
///
/// One step per supplied value after the root, plus one trailing step that
/// populates (without selecting) the first link beyond the values.
#[must_use]
pub fn plan(values: usize, chain_len: usize) -> Vec<SeedStep> {
    if values == 0 {
        return Vec::new();
    }
    let values = values.min(chain_len);
    let last = if values < chain_len { values } else { values - 1 };
    (0..last).map(SeedStep::child_of).collect()
}

/// Drives the initial population of a chain
#[derive(Debug)]
pub struct Seeder {
    populator: Arc<Populator>,
}

impl Seeder {
    /// Create a seeder
    #[inline]
    #[must_use]
    pub fn new(populator: Arc<Populator>) -> Self {
        Self { populator }
    }

    /// Seed the chain from `initial_values`
    ///
    /// Values beyond the chain length are reported as an input error and
    /// ignored; seeding continues with the values that fit.
    pub async fn seed(&self, initial_values: &[OptionValue]) -> SeedReport {
        let chain = self.populator.chain();
        let mut report = SeedReport::default();

        let values = if initial_values.len() > chain.len() {
            let err = SeedError::TooManyValues {
                supplied: initial_values.len(),
                chain_len: chain.len(),
            };
            tracing::warn!("{}; seeding the first {}", err, chain.len());
            report.input_error = Some(err);
            &initial_values[..chain.len()]
        } else {
            initial_values
        };

        let outcome = self.populator.populate_root().await;
        report.record(outcome);
        if let Some(value) = values.first() {
            if outcome.is_applied() {
                report.apply(chain.root().control().as_ref(), value);
            }
        }

        for step in plan(values.len(), chain.len()) {
            let Some(parent) = chain.link(step.parent) else {
                break;
            };
            let outcome = self
                .populator
                .populate_child(step.index, parent.control().value())
                .await;
            report.record(outcome);

            if let (Some(value), true) = (values.get(step.index), outcome.is_applied()) {
                if let Some(link) = chain.link(step.index) {
                    report.apply(link.control().as_ref(), value);
                }
            }
        }

        tracing::info!(
            "Seeded chain from `{}`: {} populated, {} values applied",
            chain.root().id(),
            report.links_populated,
            report.values_applied
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(steps: &[SeedStep]) -> Vec<(usize, usize)> {
        steps.iter().map(|s| (s.index, s.parent)).collect()
    }

    #[test]
    fn plan_no_values() {
        assert!(plan(0, 3).is_empty());
    }

    #[test]
    fn plan_full_chain() {
        assert_eq!(indices(&plan(3, 3)), vec![(1, 0), (2, 1)]);
    }

    #[test]
    fn plan_partial_adds_trailing_step() {
        assert_eq!(indices(&plan(1, 3)), vec![(1, 0)]);
        assert_eq!(indices(&plan(2, 4)), vec![(1, 0), (2, 1)]);
    }

    #[test]
    fn plan_never_exceeds_chain() {
        assert_eq!(indices(&plan(5, 2)), vec![(1, 0)]);
        assert!(plan(1, 1).is_empty());
    }

    #[test]
    fn report_counts_only_accepted_values() {
        use crate::control::MemoryControl;
        use crate::types::OptionEntry;

        let control = MemoryControl::new("author");
        control.replace_options(vec![
            OptionEntry::placeholder("Select One"),
            OptionEntry::new("Hemmingway", "h"),
        ]);

        let mut report = SeedReport::default();
        report.apply(&control, &OptionValue::from("x"));
        assert_eq!(report.values_applied, 0);
        assert!(control.value().is_none());

        report.apply(&control, &OptionValue::from("h"));
        assert_eq!(report.values_applied, 1);
    }

    #[test]
    fn report_is_clean() {
        let mut report = SeedReport::default();
        assert!(report.is_clean());
        report.record(PopulateOutcome::Superseded);
        assert!(!report.is_clean());
    }
}
