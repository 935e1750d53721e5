//! UI navigation state machine.
//!
//! Translates debounced button events into [`UiAction`]s and tracks which
//! screen is showing. Pure state: nothing in here touches hardware, and
//! the controller decides what each action means for the session.
//!
//! ```text
//!   Home ⇄ Session ⇄ Stats ⇄ Settings ⇄ Battery ⇄ Safety ⇄ (Home)
//!          (button 2 short advances, wraps both ways)
//! ```
//!
//! An overlay (emergency or timed alert) sits on top of whatever screen is
//! current; the first button press only dismisses it.

pub mod views;

use crate::error::SafetyError;
use crate::mode::TreatmentMode;

// ── Screens ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    Session,
    Stats,
    Settings,
    Battery,
    Safety,
}

impl Screen {
    pub const COUNT: usize = 6;
    pub const ALL: [Self; Self::COUNT] = [
        Self::Home,
        Self::Session,
        Self::Stats,
        Self::Settings,
        Self::Battery,
        Self::Safety,
    ];

    pub const fn next(self) -> Self {
        match self {
            Self::Home => Self::Session,
            Self::Session => Self::Stats,
            Self::Stats => Self::Settings,
            Self::Settings => Self::Battery,
            Self::Battery => Self::Safety,
            Self::Safety => Self::Home,
        }
    }

    pub const fn prev(self) -> Self {
        match self {
            Self::Home => Self::Safety,
            Self::Session => Self::Home,
            Self::Stats => Self::Session,
            Self::Settings => Self::Stats,
            Self::Battery => Self::Settings,
            Self::Safety => Self::Battery,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Session => "Session",
            Self::Stats => "Stats",
            Self::Settings => "Settings",
            Self::Battery => "Battery",
            Self::Safety => "Safety",
        }
    }
}

// ── Input / output vocabulary ─────────────────────────────────

/// One debounced, classified press. Consumed exactly once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonEvent {
    #[default]
    None,
    Button1Short,
    Button1Long,
    Button2Short,
    /// Reserved; maps to no action.
    Button2Long,
}

/// What the controller should do in response to a button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiAction {
    #[default]
    None,
    StartSession,
    StopSession,
    ChangeMode,
    NavigateNext,
    NavigatePrev,
    SelectSetting,
    ConfirmSetting,
}

// ── Overlays ──────────────────────────────────────────────────

/// Non-emergency notices shown for a fixed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    SessionComplete,
    SessionCeiling,
}

impl AlertKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::SessionComplete => "COMPLETE",
            Self::SessionCeiling => "SAFETY STOP",
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::SessionComplete => "Session Complete",
            Self::SessionCeiling => SafetyError::SessionTooLong.message(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Stays until a button press or Home navigation.
    Emergency(SafetyError),
    /// Drops at `until_ms`, or earlier on any button press.
    Alert { kind: AlertKind, until_ms: u64 },
}

// ── State ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub current_screen: Screen,
    /// One level of history.
    pub previous_screen: Screen,
    /// Mirrors the session controller; write through [`Self::set_session_active`].
    pub session_active: bool,
    pub current_mode: TreatmentMode,
    /// Pending choice on the settings screen.
    pub selected_mode: TreatmentMode,
    pub settings_index: u8,
    pub overlay: Option<Overlay>,
    screen_changed: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            current_screen: Screen::Home,
            previous_screen: Screen::Home,
            session_active: false,
            current_mode: TreatmentMode::Dual,
            selected_mode: TreatmentMode::Dual,
            settings_index: 0,
            overlay: None,
            // Forces the first render.
            screen_changed: true,
        }
    }

    // ── Navigation ────────────────────────────────────────────

    pub fn next_screen(&mut self) {
        self.goto_screen(self.current_screen.next());
    }

    pub fn prev_screen(&mut self) {
        self.goto_screen(self.current_screen.prev());
    }

    pub fn goto_screen(&mut self, screen: Screen) {
        self.previous_screen = self.current_screen;
        self.current_screen = screen;
        if screen == Screen::Home && matches!(self.overlay, Some(Overlay::Emergency(_))) {
            self.overlay = None;
        }
        self.screen_changed = true;
    }

    /// Read-and-clear the dirty flag.
    pub fn take_screen_changed(&mut self) -> bool {
        core::mem::take(&mut self.screen_changed)
    }

    /// A successful start always jumps to the session screen; a stop
    /// leaves the operator where they are.
    pub fn set_session_active(&mut self, active: bool) {
        self.session_active = active;
        if active {
            self.goto_screen(Screen::Session);
        } else {
            self.screen_changed = true;
        }
    }

    /// Adopt a mode chosen outside the UI (boot restore).
    pub fn sync_mode(&mut self, mode: TreatmentMode) {
        self.current_mode = mode;
        self.selected_mode = mode;
        self.screen_changed = true;
    }

    // ── Overlays ──────────────────────────────────────────────

    pub fn show_emergency(&mut self, err: SafetyError) {
        self.overlay = Some(Overlay::Emergency(err));
        self.screen_changed = true;
    }

    pub fn show_alert(&mut self, kind: AlertKind, until_ms: u64) {
        // An alert never hides an emergency.
        if matches!(self.overlay, Some(Overlay::Emergency(_))) {
            return;
        }
        self.overlay = Some(Overlay::Alert { kind, until_ms });
        self.screen_changed = true;
    }

    /// Drop a timed alert once its deadline passes.
    pub fn expire_overlay(&mut self, now_ms: u64) {
        if let Some(Overlay::Alert { until_ms, .. }) = self.overlay {
            if now_ms >= until_ms {
                self.overlay = None;
                self.screen_changed = true;
            }
        }
    }

    pub fn emergency_shown(&self) -> bool {
        matches!(self.overlay, Some(Overlay::Emergency(_)))
    }

    // ── Button handling ───────────────────────────────────────

    /// Apply one button event and return the resulting action.
    pub fn handle_button(&mut self, event: ButtonEvent) -> UiAction {
        if event == ButtonEvent::None {
            return UiAction::None;
        }

        if self.overlay.take().is_some() {
            self.screen_changed = true;
            return UiAction::None;
        }

        match (event, self.current_screen) {
            (ButtonEvent::Button2Short, Screen::Settings) => {
                self.selected_mode = self.selected_mode.next();
                self.screen_changed = true;
                UiAction::SelectSetting
            }
            (ButtonEvent::Button2Short, _) => {
                self.next_screen();
                UiAction::NavigateNext
            }

            (ButtonEvent::Button1Short, Screen::Home) if !self.session_active => {
                UiAction::StartSession
            }
            (ButtonEvent::Button1Short, Screen::Session) => {
                if self.session_active {
                    UiAction::StopSession
                } else {
                    UiAction::StartSession
                }
            }
            // Committing a mode returns to Home; Settings has no other exit.
            (ButtonEvent::Button1Short, Screen::Settings) => {
                self.current_mode = self.selected_mode;
                self.goto_screen(Screen::Home);
                UiAction::ConfirmSetting
            }

            (ButtonEvent::Button1Long, Screen::Home) if !self.session_active => {
                self.current_mode = self.current_mode.next();
                self.selected_mode = self.current_mode;
                self.screen_changed = true;
                UiAction::ChangeMode
            }

            _ => UiAction::None,
        }
    }
}
