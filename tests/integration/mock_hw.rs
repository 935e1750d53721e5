//! Mock adapters for integration tests.
//!
//! Each mock records what the controller asked of it so tests can assert on
//! the full command history without touching GPIO, LEDC or flash.

use redlight::app::events::AppEvent;
use redlight::app::ports::{
    DisplaySink, EventSink, FeedbackSink, LedDriver, PersistedState, PersistencePort,
    ReadingSource, StorageError,
};
use redlight::feedback::Tone;
use redlight::safety::{Temperature, V_NOMINAL};
use redlight::ui::views::View;

// ── Board call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HwCall {
    SetChannels { red: u8, nir: u8 },
    Tone(Tone),
    Blink(u8),
}

// ── MockBoard ─────────────────────────────────────────────────

/// Reading source, LED channels and feedback in one, like the real board.
pub struct MockBoard {
    pub voltage: f32,
    pub temperature: Temperature,
    pub calls: Vec<HwCall>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self { voltage: V_NOMINAL, temperature: Temperature::Absent, calls: Vec::new() }
    }

    /// Most recent channel write, `(0, 0)` if none yet.
    pub fn channels(&self) -> (u8, u8) {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                HwCall::SetChannels { red, nir } => Some((*red, *nir)),
                _ => None,
            })
            .unwrap_or((0, 0))
    }

    pub fn tones(&self) -> Vec<Tone> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Tone(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub fn count_tone(&self, tone: Tone) -> usize {
        self.tones().iter().filter(|t| **t == tone).count()
    }

    pub fn alarm_beeps(&self) -> usize {
        self.tones().iter().filter(|t| t.is_alarm()).count()
    }

    pub fn blinks(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Blink(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingSource for MockBoard {
    fn voltage(&mut self) -> f32 {
        self.voltage
    }

    fn temperature(&mut self) -> Temperature {
        self.temperature
    }
}

impl LedDriver for MockBoard {
    fn set_channels(&mut self, red: u8, nir: u8) {
        self.calls.push(HwCall::SetChannels { red, nir });
    }
}

impl FeedbackSink for MockBoard {
    fn tone(&mut self, tone: Tone) {
        self.calls.push(HwCall::Tone(tone));
    }

    fn blink(&mut self, count: u8) {
        self.calls.push(HwCall::Blink(count));
    }
}

// ── MockDisplay ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockDisplay {
    pub frames: Vec<View>,
}

#[allow(dead_code)]
impl MockDisplay {
    pub fn last(&self) -> Option<&View> {
        self.frames.last()
    }
}

impl DisplaySink for MockDisplay {
    fn render(&mut self, view: &View) {
        self.frames.push(*view);
    }
}

// ── MockStore ─────────────────────────────────────────────────

/// In-memory persistence with switchable failure modes.
#[derive(Default)]
pub struct MockStore {
    pub record: Option<PersistedState>,
    pub saves: usize,
    /// Every `save()` returns `IoError` while set.
    pub fail_saves: bool,
    /// `load()` returns `Corrupted` while set.
    pub corrupt: bool,
}

#[allow(dead_code)]
impl MockStore {
    pub fn with_record(record: PersistedState) -> Self {
        Self { record: Some(record), ..Self::default() }
    }
}

impl PersistencePort for MockStore {
    fn load(&self) -> Result<PersistedState, StorageError> {
        if self.corrupt {
            return Err(StorageError::Corrupted);
        }
        self.record.ok_or(StorageError::NotFound)
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::IoError);
        }
        self.record = Some(*state);
        self.saves += 1;
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
