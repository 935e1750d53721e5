//! Polled button debouncer with short / long press classification.
//!
//! ## Hardware
//!
//! Two active-low momentary switches with pull-ups (BOOT = button 1, side
//! = button 2). The main loop samples both pins every control tick;
//! classified presses are posted into the [`ButtonMailbox`].
//!
//! ## Gestures
//!
//! | Gesture     | Condition                                   | Event          |
//! |-------------|---------------------------------------------|----------------|
//! | Short press | Stable release before `long_press_ms`       | `ButtonNShort` |
//! | Long press  | Held for `long_press_ms` (fires while held) | `ButtonNLong`  |
//!
//! A level change must stay stable for `debounce_ms` before it counts.
//! The release that ends a long press produces nothing.

use log::{debug, warn};

use crate::config::SystemConfig;
use crate::drivers::hw_init;
use crate::input::ButtonMailbox;
use crate::pins;
use crate::ui::ButtonEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    One,
    Two,
}

impl ButtonId {
    const fn short(self) -> ButtonEvent {
        match self {
            Self::One => ButtonEvent::Button1Short,
            Self::Two => ButtonEvent::Button2Short,
        }
    }

    const fn long(self) -> ButtonEvent {
        match self {
            Self::One => ButtonEvent::Button1Long,
            Self::Two => ButtonEvent::Button2Long,
        }
    }
}

pub struct ButtonDriver {
    id: ButtonId,
    gpio: i32,
    debounce_ms: u64,
    long_press_ms: u64,
    /// Debounced level.
    pressed: bool,
    /// Raw level and when it last changed.
    raw: bool,
    raw_since_ms: u64,
    pressed_at_ms: u64,
    long_fired: bool,
}

impl ButtonDriver {
    pub fn new(id: ButtonId, gpio: i32, debounce_ms: u32, long_press_ms: u32) -> Self {
        Self {
            id,
            gpio,
            debounce_ms: u64::from(debounce_ms),
            long_press_ms: u64::from(long_press_ms),
            pressed: false,
            raw: false,
            raw_since_ms: 0,
            pressed_at_ms: 0,
            long_fired: false,
        }
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    /// Sample the pin (active-low) and classify.
    pub fn poll(&mut self, now_ms: u64) -> ButtonEvent {
        let pressed = !hw_init::gpio_read(self.gpio);
        self.update(now_ms, pressed)
    }

    /// Feed one raw sample. Returns at most one classified event.
    pub fn update(&mut self, now_ms: u64, raw_pressed: bool) -> ButtonEvent {
        if raw_pressed != self.raw {
            self.raw = raw_pressed;
            self.raw_since_ms = now_ms;
        }

        let stable = now_ms.saturating_sub(self.raw_since_ms) >= self.debounce_ms;
        if stable && self.raw != self.pressed {
            self.pressed = self.raw;
            if self.pressed {
                self.pressed_at_ms = now_ms;
                self.long_fired = false;
                return ButtonEvent::None;
            }
            if self.long_fired {
                return ButtonEvent::None;
            }
            debug!("Button {:?}: short", self.id);
            return self.id.short();
        }

        if self.pressed
            && !self.long_fired
            && now_ms.saturating_sub(self.pressed_at_ms) >= self.long_press_ms
        {
            self.long_fired = true;
            debug!("Button {:?}: long", self.id);
            return self.id.long();
        }

        ButtonEvent::None
    }
}

/// Both board buttons, feeding one mailbox.
pub struct ButtonPad {
    buttons: [ButtonDriver; 2],
}

impl ButtonPad {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            buttons: [
                ButtonDriver::new(ButtonId::One, pins::BUTTON1_GPIO, config.debounce_ms, config.long_press_ms),
                ButtonDriver::new(ButtonId::Two, pins::BUTTON2_GPIO, config.debounce_ms, config.long_press_ms),
            ],
        }
    }

    /// Sample both pins and post any classified presses.
    pub fn poll_into(&mut self, now_ms: u64, mailbox: &ButtonMailbox) {
        for button in &mut self.buttons {
            let event = button.poll(now_ms);
            if !mailbox.post(event) {
                warn!("Button {:?}: mailbox full, press dropped", button.id());
            }
        }
    }
}
