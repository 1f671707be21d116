use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Teardown handle for schedulers and subscriptions.
///
/// Cloning shares the same cleanup; whichever clone runs first wins.
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// A handle with nothing to clean up.
    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.0.borrow().is_none()
    }
}

impl fmt::Debug for Dispose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispose")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Collects disposers and runs them together, e.g. when a list unmounts.
#[derive(Default)]
pub struct DisposeBag {
    disposers: RefCell<Vec<Dispose>>,
}

impl DisposeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, d: Dispose) {
        self.disposers.borrow_mut().push(d);
    }

    pub fn len(&self) -> usize {
        self.disposers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.disposers.borrow().is_empty()
    }

    pub fn dispose(&self) {
        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        for d in disposers {
            d.run();
        }
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for DisposeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeBag")
            .field("pending", &self.len())
            .finish()
    }
}
