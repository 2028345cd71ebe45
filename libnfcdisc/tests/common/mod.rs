// Shared helpers for the integration tests.
#![allow(dead_code)]

pub mod fixtures;

use std::cell::RefCell;
use std::rc::Rc;

use libnfcdisc::prelude::*;

/// Route engine logs to the test output. Safe to call from every test.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Collects every state the engine reports through the notification
/// callback
#[derive(Clone, Default)]
pub struct Notifications(Rc<RefCell<Vec<State>>>);

impl Notifications {
    pub fn callback(&self) -> impl FnMut(State) + 'static {
        let seen = self.0.clone();
        move |st| seen.borrow_mut().push(st)
    }

    pub fn states(&self) -> Vec<State> {
        self.0.borrow().clone()
    }

    pub fn count(&self, state: State) -> usize {
        self.0.borrow().iter().filter(|s| **s == state).count()
    }
}
