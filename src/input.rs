//! Button mailbox between the edge-detection context and the control loop.
//!
//! ```text
//! ┌──────────────┐  ButtonEvent  ┌──────────────┐
//! │ Debouncer    │──────────────▶│ Control loop │
//! │ (ISR / poll) │   (bounded)   │ (1 per tick) │
//! └──────────────┘               └──────────────┘
//! ```
//!
//! Backed by an `embassy-sync` bounded channel behind a critical-section
//! mutex, so the producer may run in interrupt context. Neither side
//! ever blocks: a full mailbox drops the newest press.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::ui::ButtonEvent;

/// Pending presses held between ticks.
pub const MAILBOX_DEPTH: usize = 4;

pub struct ButtonMailbox {
    channel: Channel<CriticalSectionRawMutex, ButtonEvent, MAILBOX_DEPTH>,
}

impl Default for ButtonMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonMailbox {
    pub const fn new() -> Self {
        Self { channel: Channel::new() }
    }

    /// Queue a press. `None` events are ignored. Returns `false` if the
    /// press was dropped.
    pub fn post(&self, event: ButtonEvent) -> bool {
        if event == ButtonEvent::None {
            return true;
        }
        self.channel.try_send(event).is_ok()
    }

    /// Pop the oldest press, or `ButtonEvent::None`.
    pub fn take(&self) -> ButtonEvent {
        self.channel.try_receive().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn clear(&self) {
        self.channel.clear();
    }
}

/// Process-wide mailbox shared by the button ISR and the main loop.
pub static BUTTONS: ButtonMailbox = ButtonMailbox::new();
