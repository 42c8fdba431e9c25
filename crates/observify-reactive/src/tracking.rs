#![forbid(unsafe_code)]

//! Implicit dependency capture.
//!
//! While a capture frame is open, every tracked read ([`Observable::get`],
//! [`Observable::with`], [`Computed::get`]) records its source in the
//! innermost frame. Untracked reads (`peek()`) are never recorded.
//! [`Computed::tracked`] uses this to discover its dependencies on every
//! recomputation.
//!
//! Frames are thread-local and nest: a computed value evaluated inside
//! another computed's compute function opens its own frame, so its sources
//! do not leak into the outer one. The outer frame only sees the inner
//! computed itself.
//!
//! [`Observable::get`]: crate::Observable::get
//! [`Observable::with`]: crate::Observable::with
//! [`Computed::get`]: crate::Computed::get
//! [`Computed::tracked`]: crate::Computed::tracked

use std::cell::RefCell;
use std::rc::Rc;

use crate::observable::Subscription;

/// A source a derived value can depend on.
pub trait Dependency {
    /// Identity used to de-duplicate repeated reads within one frame.
    fn dependency_id(&self) -> usize;

    /// Run `on_change` whenever this source changes, for as long as the
    /// returned guard lives.
    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription;
}

thread_local! {
    static FRAMES: RefCell<Vec<Vec<Rc<dyn Dependency>>>> = const { RefCell::new(Vec::new()) };
}

/// Pops the frame even if the captured closure panics.
struct FrameGuard;

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

/// Run `f` inside a fresh frame, returning its result and the de-duplicated
/// dependencies it read, in first-read order.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Rc<dyn Dependency>>) {
    FRAMES.with(|frames| frames.borrow_mut().push(Vec::new()));
    let guard = FrameGuard;
    let result = f();
    let deps = FRAMES.with(|frames| {
        frames
            .borrow_mut()
            .last_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    });
    drop(guard);
    (result, deps)
}

/// Run `f` without letting its reads reach any enclosing frame.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    capture(f).0
}

/// Whether a capture frame is currently open on this thread.
#[must_use]
pub fn is_tracking() -> bool {
    FRAMES.with(|frames| !frames.borrow().is_empty())
}

/// Record a read in the innermost frame. `make` is only called when a frame
/// is open and `id` was not already recorded there.
pub fn record(id: usize, make: impl FnOnce() -> Rc<dyn Dependency>) {
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        if let Some(frame) = frames.last_mut() {
            if !frame.iter().any(|dep| dep.dependency_id() == id) {
                frame.push(make());
            }
        }
    });
}
