//! Control adapter seam
//!
//! The engine never renders anything itself. It talks to selection controls
//! through [`Control`] and finds them by id through [`ControlResolver`].

mod memory;

pub use memory::{ControlSet, MemoryControl};

use crate::types::{ControlId, OptionEntry, OptionValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked when the user changes a control's value
pub type ValueChangedHandler = Arc<dyn Fn(&OptionValue) + Send + Sync>;

/// Token identifying one value-changed subscription on a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A single-value selection control
///
/// `set_value` and `replace_options` are programmatic and must not fire
/// value-changed handlers; only user-driven changes do.
pub trait Control: Send + Sync {
    /// Control identifier
    fn id(&self) -> &ControlId;

    /// Currently selected value (`""` when nothing is selected)
    fn value(&self) -> OptionValue;

    /// Select a value without notifying handlers
    fn set_value(&self, value: &OptionValue);

    /// Replace the whole option list
    fn replace_options(&self, options: Vec<OptionEntry>);

    /// Register a value-changed handler
    fn on_value_changed(&self, handler: ValueChangedHandler) -> SubscriptionId;

    /// Remove a handler; returns false if it was not registered
    fn remove_value_changed(&self, id: SubscriptionId) -> bool;
}

/// Lookup of controls by identifier
pub trait ControlResolver: Send + Sync {
    /// Resolve a control, if it exists
    fn resolve(&self, id: &ControlId) -> Option<Arc<dyn Control>>;
}

impl<S: std::hash::BuildHasher + Send + Sync> ControlResolver
    for HashMap<ControlId, Arc<dyn Control>, S>
{
    fn resolve(&self, id: &ControlId) -> Option<Arc<dyn Control>> {
        self.get(id).cloned()
    }
}

/// Active subscription held by an attached chain
pub(crate) struct Subscription {
    control: Arc<dyn Control>,
    id: SubscriptionId,
}

impl Subscription {
    pub(crate) fn new(control: Arc<dyn Control>, id: SubscriptionId) -> Self {
        Self { control, id }
    }

    pub(crate) fn cancel(self) -> bool {
        self.control.remove_value_changed(self.id)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("control", self.control.id())
            .field("id", &self.id)
            .finish()
    }
}
