use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::SlotMap;

use crate::dispose::Dispose;

slotmap::new_key_type! {
    /// Handle for one subscriber of a [`Signal`].
    pub struct SubId;
}

/// Observable value. Clones share the same value and subscribers.
///
/// Subscribers run synchronously after each write and see the new value;
/// they may read the signal but must not write it back from inside the
/// callback.
pub struct Signal<T: 'static>(Rc<RefCell<Inner<T>>>);

struct Inner<T: 'static> {
    value: T,
    subs: SlotMap<SubId, Rc<dyn Fn(&T)>>,
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("subscribers", &inner.subs.len())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            value,
            subs: SlotMap::with_key(),
        })))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().value.clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow().value)
    }

    pub fn set(&self, v: T) {
        self.0.borrow_mut().value = v;
        self.notify();
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        f(&mut self.0.borrow_mut().value);
        self.notify();
    }

    fn notify(&self) {
        let subs: Vec<Rc<dyn Fn(&T)>> = self.0.borrow().subs.values().cloned().collect();
        if subs.is_empty() {
            return;
        }
        let inner = self.0.borrow();
        for s in subs {
            s(&inner.value);
        }
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        self.0.borrow_mut().subs.insert(Rc::new(f))
    }

    pub fn unsubscribe(&self, id: SubId) -> bool {
        self.0.borrow_mut().subs.remove(id).is_some()
    }

    /// Like [`subscribe`](Self::subscribe), returning a handle that removes
    /// the subscriber when run. The handle does not keep the signal alive.
    pub fn subscribe_disposable(&self, f: impl Fn(&T) + 'static) -> Dispose {
        let id = self.subscribe(f);
        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.0);
        Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subs.remove(id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.borrow().subs.len()
    }
}

pub fn signal<T: 'static>(t: T) -> Signal<T> {
    Signal::new(t)
}
