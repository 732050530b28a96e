//! Presentation capabilities injected into the message view.
//!
//! Speech synthesis and text selection live behind these traits so the
//! message view never reaches into business state. The browser frontend
//! implements them on top of `speechSynthesis` and `getSelection()`.

use crate::composer::{Composer, Quote};

/// Voice parameters for reading a selection aloud
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            lang: "zh-CN".to_string(),
            rate: 0.9,
            pitch: 1.1,
            volume: 0.9,
        }
    }
}

/// A voice offered by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    pub lang: String,
}

/// Index of the preferred voice: a female Chinese voice, then any Chinese
/// voice, then whatever comes first.
pub fn pick_voice(voices: &[VoiceInfo]) -> Option<usize> {
    voices
        .iter()
        .position(|v| v.lang.contains("zh") && v.name.contains("Female"))
        .or_else(|| voices.iter().position(|v| v.lang.contains("zh")))
        .or_else(|| (!voices.is_empty()).then_some(0))
}

pub trait SpeechCapability {
    fn speak(&self, text: &str, settings: &SpeechSettings);

    fn cancel(&self);

    fn is_speaking(&self) -> bool;
}

/// Play/stop toggle behind the speech button
#[derive(Debug, Clone, Default)]
pub struct SpeechToggle {
    settings: SpeechSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechAction {
    Started,
    Stopped,
}

impl SpeechToggle {
    pub fn new(settings: SpeechSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SpeechSettings {
        &self.settings
    }

    /// Stop if something is playing, otherwise read `text`
    pub fn toggle<C: SpeechCapability + ?Sized>(&self, speech: &C, text: &str) -> SpeechAction {
        if speech.is_speaking() {
            speech.cancel();
            SpeechAction::Stopped
        } else {
            speech.speak(text, &self.settings);
            SpeechAction::Started
        }
    }
}

/// Text the user highlighted inside a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRange {
    pub message_id: String,
    pub text: String,
}

pub trait SelectionCapability {
    /// Turn a selection into a quote, if it should become one
    fn on_select(&self, range: &SelectionRange) -> Option<Quote>;
}

/// Any non-blank selection becomes a quote
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteSelection;

impl SelectionCapability for QuoteSelection {
    fn on_select(&self, range: &SelectionRange) -> Option<Quote> {
        Quote::new(range.text.clone())
    }
}

/// The speak/quote popover shown over a fresh selection.
///
/// Opening it leaves the composer alone; a quote is only committed when the
/// user picks it.
#[derive(Debug, Clone, Default)]
pub struct SelectionMenu {
    pending: Option<SelectionRange>,
}

impl SelectionMenu {
    /// Offer actions for `range`, replacing any earlier selection.
    /// Blank selections close the menu and return false.
    pub fn open(&mut self, range: SelectionRange) -> bool {
        if range.text.trim().is_empty() {
            self.pending = None;
            return false;
        }
        self.pending = Some(range);
        true
    }

    pub fn pending(&self) -> Option<&SelectionRange> {
        self.pending.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    pub fn dismiss(&mut self) {
        self.pending = None;
    }

    /// Read the selected text aloud, or stop playback. The menu stays open.
    pub fn speak<C: SpeechCapability + ?Sized>(
        &self,
        toggle: &SpeechToggle,
        speech: &C,
    ) -> Option<SpeechAction> {
        let range = self.pending.as_ref()?;
        Some(toggle.toggle(speech, &range.text))
    }

    /// Turn the selection into the composer's quote and close the menu
    pub fn quote<Q: SelectionCapability + ?Sized>(
        &mut self,
        selection: &Q,
        composer: &mut Composer,
    ) -> bool {
        let Some(range) = self.pending.take() else {
            return false;
        };
        match selection.on_select(&range) {
            Some(quote) => {
                composer.set_quote(Some(quote));
                true
            }
            None => false,
        }
    }
}
