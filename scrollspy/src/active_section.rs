//! The single authoritative "active section" value of a page
//!
//! [`ActiveSection`] is owned by the visibility tracker and is the only way
//! to change the value. Navigation views hold an [`ActiveSectionHandle`],
//! which can read the value and subscribe to changes but never write it.

use crate::section_registry::SectionId;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// What caused the active section to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// An intersection batch reported the section as visible
    Observed,
    /// The user selected the section in a navigation view
    Navigated,
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observed => write!(f, "observed"),
            Self::Navigated => write!(f, "navigated"),
        }
    }
}

/// Token returned by [`ActiveSectionHandle::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<RefCell<dyn FnMut(&SectionId, ChangeSource)>>;

struct Shared {
    current: RefCell<SectionId>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_subscription: Cell<u64>,
    /// Changes not yet delivered, in the order they happened
    pending: RefCell<VecDeque<(SectionId, ChangeSource)>>,
    notifying: Cell<bool>,
}

impl Shared {
    fn is_subscribed(&self, subscription: SubscriptionId) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|(id, _)| *id == subscription)
    }

    /// Deliver queued changes until none are left
    ///
    /// A `set` made by a listener is queued behind the change being
    /// delivered, so listeners are never re-entered and see every value.
    fn notify(&self) {
        if self.notifying.replace(true) {
            return;
        }
        loop {
            let Some((id, source)) = self.pending.borrow_mut().pop_front() else {
                break;
            };
            let snapshot: Vec<(SubscriptionId, Listener)> = self.listeners.borrow().clone();
            for (subscription, listener) in snapshot {
                // Skip listeners removed by an earlier listener of this round
                if self.is_subscribed(subscription) {
                    (&mut *listener.borrow_mut())(&id, source);
                }
            }
        }
        self.notifying.set(false);
    }
}

/// Owning side of the active section state
pub struct ActiveSection {
    shared: Rc<Shared>,
}

impl ActiveSection {
    pub fn new(initial: SectionId) -> Self {
        Self {
            shared: Rc::new(Shared {
                current: RefCell::new(initial),
                listeners: RefCell::new(Vec::new()),
                next_subscription: Cell::new(0),
                pending: RefCell::new(VecDeque::new()),
                notifying: Cell::new(false),
            }),
        }
    }

    /// Read-only handle sharing this state
    pub fn handle(&self) -> ActiveSectionHandle {
        ActiveSectionHandle {
            shared: Rc::clone(&self.shared),
        }
    }

    pub fn get(&self) -> SectionId {
        self.shared.current.borrow().clone()
    }

    /// Set the active section, notifying subscribers if the value changed
    ///
    /// Returns `true` when the value changed.
    pub fn set(&self, id: SectionId, source: ChangeSource) -> bool {
        {
            let mut current = self.shared.current.borrow_mut();
            if *current == id {
                return false;
            }
            log::debug!("Active section {} -> {} ({})", current, id, source);
            *current = id.clone();
        }

        self.shared.pending.borrow_mut().push_back((id, source));
        self.shared.notify();

        true
    }
}

impl fmt::Debug for ActiveSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSection")
            .field("current", &*self.shared.current.borrow())
            .field("subscribers", &self.shared.listeners.borrow().len())
            .finish()
    }
}

/// Shared read access to the active section
#[derive(Clone)]
pub struct ActiveSectionHandle {
    shared: Rc<Shared>,
}

impl ActiveSectionHandle {
    pub fn get(&self) -> SectionId {
        self.shared.current.borrow().clone()
    }

    pub fn is_active(&self, id: &str) -> bool {
        *self.shared.current.borrow() == id
    }

    /// Register a listener called after every change of the active section
    ///
    /// A listener registered during a notification sees the next change.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SectionId, ChangeSource) + 'static,
    {
        let id = SubscriptionId(self.shared.next_subscription.get());
        self.shared.next_subscription.set(id.0 + 1);
        let listener: Listener = Rc::new(RefCell::new(listener));
        self.shared.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Remove a listener; returns `false` if it was already gone
    ///
    /// Takes effect at once, including from inside a listener.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        let mut listeners = self.shared.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != before
    }
}

impl fmt::Debug for ActiveSectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActiveSectionHandle")
            .field(&*self.shared.current.borrow())
            .finish()
    }
}
