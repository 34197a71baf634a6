//! Block lifecycle events.
//!
//! Listeners are registered on a block's configuration through an
//! [`EventDispatcher`] and run whenever the block's data is set. A
//! [`BlockEvents::PreSetData`] listener may replace the data before it is
//! transformed; listeners must not call [`Block::set_data`] on the block
//! they observe.

use std::{fmt, rc::Rc};

use indexmap::IndexMap;

use tessera_core::Value;

use crate::{block::Block, error::Result};

/// The events dispatched by a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockEvents {
    /// Dispatched at the start of `set_data`, before any transformation.
    PreSetData,
    /// Dispatched at the end of `set_data`, after children were mapped.
    PostSetData,
}

/// The payload handed to listeners.
pub struct BlockEvent<'a> {
    block: &'a Block,
    data: Value,
}

impl<'a> BlockEvent<'a> {
    pub fn new(block: &'a Block, data: Value) -> Self {
        Self { block, data }
    }

    pub fn block(&self) -> &'a Block {
        self.block
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Replaces the data carried by the event.
    pub fn set_data(&mut self, data: impl Into<Value>) {
        self.data = data.into();
    }

    pub fn into_data(self) -> Value {
        self.data
    }
}

/// A block event listener.
pub type Listener = Rc<dyn Fn(&mut BlockEvent<'_>) -> Result<()>>;

/// A bundle of listeners registered together.
pub trait EventSubscriber {
    /// Returns the listeners of this subscriber with their priorities.
    fn listeners(&self) -> Vec<(BlockEvents, i32, Listener)>;
}

/// Dispatches block events to prioritized listeners.
///
/// Listeners with a higher priority run first. Listeners with equal
/// priority run in registration order.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: IndexMap<BlockEvents, Vec<(i32, Listener)>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<F>(&mut self, event: BlockEvents, priority: i32, listener: F) -> &mut Self
    where
        F: Fn(&mut BlockEvent<'_>) -> Result<()> + 'static,
    {
        self.add_rc_listener(event, priority, Rc::new(listener))
    }

    fn add_rc_listener(&mut self, event: BlockEvents, priority: i32, listener: Listener) -> &mut Self {
        let listeners = self.listeners.entry(event).or_default();
        let idx = listeners.partition_point(|(existing, _)| *existing >= priority);
        listeners.insert(idx, (priority, listener));
        self
    }

    /// Registers every listener of `subscriber`.
    pub fn add_subscriber(&mut self, subscriber: &dyn EventSubscriber) -> &mut Self {
        for (event, priority, listener) in subscriber.listeners() {
            self.add_rc_listener(event, priority, listener);
        }
        self
    }

    pub fn has_listeners(&self, event: BlockEvents) -> bool {
        self.listeners
            .get(&event)
            .is_some_and(|listeners| !listeners.is_empty())
    }

    /// Runs the listeners of `event` in priority order.
    ///
    /// Stops at the first listener that fails.
    pub fn dispatch(&self, event: BlockEvents, payload: &mut BlockEvent<'_>) -> Result<()> {
        let Some(listeners) = self.listeners.get(&event) else {
            return Ok(());
        };
        listeners
            .iter()
            .try_for_each(|(_, listener)| listener(&mut *payload))
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.listeners
                    .iter()
                    .map(|(event, listeners)| (event, listeners.len())),
            )
            .finish()
    }
}

/// Dispatchers are equal when they hold the same listeners with the same
/// priorities.
impl PartialEq for EventDispatcher {
    fn eq(&self, other: &Self) -> bool {
        self.listeners.len() == other.listeners.len()
            && self.listeners.iter().all(|(event, listeners)| {
                other.listeners.get(event).is_some_and(|others| {
                    listeners.len() == others.len()
                        && listeners
                            .iter()
                            .zip(others)
                            .all(|((priority, listener), (other_priority, other_listener))| {
                                priority == other_priority && Rc::ptr_eq(listener, other_listener)
                            })
                })
            })
    }
}
