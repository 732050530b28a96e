use sagechat_dispatch::{pick_voice, SpeechCapability, SpeechSettings, VoiceInfo};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{SpeechSynthesis, SpeechSynthesisUtterance, SpeechSynthesisVoice};

/// `window.speechSynthesis` behind the speech capability
pub struct BrowserSpeech {
    synth: SpeechSynthesis,
}

impl BrowserSpeech {
    /// None when the browser has no speech synthesis
    pub fn open() -> Option<Self> {
        let synth = crate::window().ok()?.speech_synthesis().ok()?;
        Some(Self { synth })
    }

    fn voices(&self) -> Vec<SpeechSynthesisVoice> {
        self.synth
            .get_voices()
            .iter()
            .filter_map(|v| v.dyn_into::<SpeechSynthesisVoice>().ok())
            .collect()
    }

    fn utterance(
        &self,
        text: &str,
        settings: &SpeechSettings,
    ) -> Result<SpeechSynthesisUtterance, JsValue> {
        let utterance = SpeechSynthesisUtterance::new_with_text(text)?;
        utterance.set_lang(&settings.lang);
        utterance.set_rate(settings.rate);
        utterance.set_pitch(settings.pitch);
        utterance.set_volume(settings.volume);

        let voices = self.voices();
        let infos: Vec<VoiceInfo> = voices
            .iter()
            .map(|v| VoiceInfo {
                name: v.name(),
                lang: v.lang(),
            })
            .collect();
        if let Some(index) = pick_voice(&infos) {
            utterance.set_voice(voices.get(index));
        }
        Ok(utterance)
    }
}

impl SpeechCapability for BrowserSpeech {
    fn speak(&self, text: &str, settings: &SpeechSettings) {
        self.synth.cancel();
        match self.utterance(text, settings) {
            Ok(utterance) => self.synth.speak(&utterance),
            Err(e) => log::error!("Failed to create utterance: {:?}", e),
        }
    }

    fn cancel(&self) {
        self.synth.cancel();
    }

    fn is_speaking(&self) -> bool {
        self.synth.speaking()
    }
}
