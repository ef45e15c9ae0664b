//! Cascade controller
//!
//! Keeps the chain consistent when the user changes a control: the child is
//! repopulated (or cleared on "no selection") and everything beyond the child
//! is cleared before the handler returns.

use crate::control::{Subscription, ValueChangedHandler};
use crate::populate::Populator;
use crate::types::OptionValue;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Subscribes change handlers on every non-terminal link
#[derive(Debug)]
pub struct CascadeController {
    populator: Arc<Populator>,
    runtime: Handle,
}

impl CascadeController {
    /// Create a controller that spawns populations on `runtime`
    #[inline]
    #[must_use]
    pub fn new(populator: Arc<Populator>, runtime: Handle) -> Self {
        Self { populator, runtime }
    }

    /// Register one handler per non-terminal link
    pub(crate) fn subscribe(&self) -> Vec<Subscription> {
        let chain = self.populator.chain();
        chain
            .iter()
            .filter(|link| !link.is_terminal())
            .map(|link| {
                let index = link.index();
                let populator = Arc::clone(&self.populator);
                let runtime = self.runtime.clone();
                let handler: ValueChangedHandler = Arc::new(move |value: &OptionValue| {
                    cascade(&populator, &runtime, index, value);
                });
                let id = link.control().on_value_changed(handler);
                tracing::trace!("Subscribed to changes of `{}`", link.id());
                Subscription::new(Arc::clone(link.control()), id)
            })
            .collect()
    }
}

/// React to a change of link `index` to `value`
///
/// Everything here runs synchronously except the child's capability call,
/// which is spawned after its generation has been claimed.
fn cascade(populator: &Arc<Populator>, runtime: &Handle, index: usize, value: &OptionValue) {
    let chain = populator.chain();
    let Some(link) = chain.link(index) else {
        return;
    };
    let Some(child) = link.child_index() else {
        return;
    };

    tracing::debug!(
        "`{}` changed to {:?}, repopulating link {}",
        link.id(),
        value.as_str(),
        child
    );

    if value.is_none() {
        populator.clear(child);
    } else if let Some(population) = populator.issue_child(child, value.clone()) {
        let populator = Arc::clone(populator);
        runtime.spawn(async move {
            populator.complete(population).await;
        });
    }

    for beyond in chain.beyond(child) {
        populator.clear(beyond.index());
    }
}
