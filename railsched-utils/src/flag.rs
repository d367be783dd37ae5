//! Boolean shared between tasks.
//!
//! A tick can land between the load and the store of a plain read/modify/write, in which case
//! the update made by the task that ran in between is lost. [`SharedFlag::toggle`] flips the flag
//! in a single atomic operation so it cannot be split.

use railsched::portable_atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SharedFlag(AtomicBool);

impl SharedFlag {
    pub const fn new(value: bool) -> Self {
        Self(AtomicBool::new(value))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::SeqCst);
    }

    /// Flips the flag and returns its previous value.
    pub fn toggle(&self) -> bool {
        self.0.fetch_xor(true, Ordering::SeqCst)
    }
}
