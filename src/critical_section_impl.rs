//! `critical-section` 1.x provider for ESP-IDF builds.
//!
//! The button mailbox sits behind an `embassy-sync` critical-section
//! mutex. Today the control loop on the main task both polls the buttons
//! into the mailbox and drains it, and no ISR touches it, so a re-entrant
//! process-wide mutex is sufficient.

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

static CS_MUTEX: Mutex<()> = Mutex::new(());

thread_local! {
    static CS_DEPTH: Cell<u8> = const { Cell::new(0) };
    static CS_GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    CS_DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            let lock = CS_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
            CS_GUARD.with(|guard| *guard.borrow_mut() = Some(lock));
        }
        let next = d.saturating_add(1);
        depth.set(next);
        next
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    CS_DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            return;
        }
        depth.set(d - 1);
        if d == 1 {
            CS_GUARD.with(|guard| *guard.borrow_mut() = None);
        }
    });
}
