//! Headless in-memory control
//!
//! Behaves like an HTML `<select>`: replacing the options selects the first
//! entry, and selecting a value that is not offered leaves nothing selected.

use super::{Control, ControlResolver, SubscriptionId, ValueChangedHandler};
use crate::types::{ControlId, OptionEntry, OptionValue};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ControlState {
    options: Vec<OptionEntry>,
    value: OptionValue,
}

/// In-memory selection control
pub struct MemoryControl {
    id: ControlId,
    state: Mutex<ControlState>,
    listeners: Mutex<Vec<(SubscriptionId, ValueChangedHandler)>>,
    next_subscription: AtomicU64,
}

impl MemoryControl {
    /// Create an empty control
    #[must_use]
    pub fn new(id: impl Into<ControlId>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(ControlState::default()),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Current option list
    #[must_use]
    pub fn options(&self) -> Vec<OptionEntry> {
        self.state.lock().options.clone()
    }

    /// Number of options, placeholder included
    #[must_use]
    pub fn option_count(&self) -> usize {
        self.state.lock().options.len()
    }

    /// Check whether a value is currently offered
    #[must_use]
    pub fn offers(&self, value: &OptionValue) -> bool {
        self.state.lock().options.iter().any(|o| &o.value == value)
    }

    /// Number of registered value-changed handlers
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Simulate a user selecting `value`
    ///
    /// Updates the value like [`Control::set_value`] and then notifies every
    /// handler with the resulting value.
    pub fn select(&self, value: impl Into<OptionValue>) {
        let value = value.into();
        self.set_value(&value);
        let current = self.value();

        // Handlers may touch other controls; never call them under our locks.
        let handlers: Vec<ValueChangedHandler> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        tracing::trace!(control = %self.id, value = %current, "user change");
        for handler in handlers {
            handler(&current);
        }
    }
}

impl Control for MemoryControl {
    fn id(&self) -> &ControlId {
        &self.id
    }

    fn value(&self) -> OptionValue {
        self.state.lock().value.clone()
    }

    fn set_value(&self, value: &OptionValue) {
        let mut state = self.state.lock();
        state.value = if state.options.iter().any(|o| &o.value == value) {
            value.clone()
        } else {
            OptionValue::none()
        };
    }

    fn replace_options(&self, options: Vec<OptionEntry>) {
        let mut state = self.state.lock();
        state.value = options
            .first()
            .map(|o| o.value.clone())
            .unwrap_or_default();
        state.options = options;
    }

    fn on_value_changed(&self, handler: ValueChangedHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, handler));
        id
    }

    fn remove_value_changed(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

impl std::fmt::Debug for MemoryControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryControl")
            .field("id", &self.id)
            .field("value", &state.value)
            .field("options", &state.options.len())
            .finish_non_exhaustive()
    }
}

/// Set of in-memory controls addressable by id
#[derive(Debug, Default)]
pub struct ControlSet {
    controls: DashMap<ControlId, Arc<MemoryControl>>,
}

impl ControlSet {
    /// Create an empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set with one empty control per id
    #[must_use]
    pub fn with_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ControlId>,
    {
        let set = Self::new();
        for id in ids {
            set.insert(MemoryControl::new(id));
        }
        set
    }

    /// Insert a control, replacing any previous control with the same id
    pub fn insert(&self, control: MemoryControl) -> Arc<MemoryControl> {
        let control = Arc::new(control);
        self.controls
            .insert(control.id().clone(), Arc::clone(&control));
        control
    }

    /// Get a control by id
    #[must_use]
    pub fn get(&self, id: &ControlId) -> Option<Arc<MemoryControl>> {
        self.controls.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of controls
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Check if set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

impl ControlResolver for ControlSet {
    fn resolve(&self, id: &ControlId) -> Option<Arc<dyn Control>> {
        self.get(id).map(|control| control as Arc<dyn Control>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn books() -> Vec<OptionEntry> {
        vec![
            OptionEntry::placeholder("Select One"),
            OptionEntry::new("death in the afternoon", 1),
            OptionEntry::new("the sun also rises", 2),
        ]
    }

    #[test]
    fn replace_selects_first_option() {
        let control = MemoryControl::new("books");
        control.replace_options(books());
        assert!(control.value().is_none());
        assert_eq!(control.option_count(), 3);

        control.replace_options(vec![OptionEntry::new("only", "x")]);
        assert_eq!(control.value().as_str(), "x");
    }

    #[test]
    fn set_value_requires_offered_option() {
        let control = MemoryControl::new("books");
        control.replace_options(books());

        control.set_value(&OptionValue::from(2));
        assert_eq!(control.value().as_str(), "2");

        control.set_value(&OptionValue::from(9));
        assert!(control.value().is_none());
    }

    #[test]
    fn set_value_is_silent() {
        let control = MemoryControl::new("books");
        control.replace_options(books());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        control.on_value_changed(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        control.set_value(&OptionValue::from(1));
        control.replace_options(Vec::new());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        control.replace_options(books());
        control.select(1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_handler() {
        let control = MemoryControl::new("author");
        let id = control.on_value_changed(Arc::new(|_| {}));
        assert_eq!(control.listener_count(), 1);
        assert!(control.remove_value_changed(id));
        assert!(!control.remove_value_changed(id));
        assert_eq!(control.listener_count(), 0);
    }

    #[test]
    fn control_set_resolves() {
        let set = ControlSet::with_ids(["author", "books"]);
        assert_eq!(set.len(), 2);
        assert!(set.resolve(&ControlId::new("books")).is_some());
        assert!(set.resolve(&ControlId::new("chapters")).is_none());
    }
}
