/// An excerpt of an earlier message, prepended to the next submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote(String);

impl Quote {
    /// Build a quote from selected text. Blank selections yield nothing.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The input box plus the active quote
#[derive(Debug, Clone, Default)]
pub struct Composer {
    input: String,
    quote: Option<Quote>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    pub fn set_quote(&mut self, quote: Option<Quote>) {
        self.quote = quote;
    }

    pub fn clear_quote(&mut self) {
        self.quote = None;
    }

    /// Whether a submit would be accepted (ignoring in-flight state)
    pub fn can_submit(&self) -> bool {
        !self.input.trim().is_empty() || self.quote.is_some()
    }

    /// The outgoing text: `"{quote}\n\n{input}"` trimmed, or the trimmed input
    pub fn compose(&self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }
        let content = match &self.quote {
            Some(quote) => format!("{}\n\n{}", quote.as_str(), self.input)
                .trim()
                .to_string(),
            None => self.input.trim().to_string(),
        };
        Some(content)
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.quote = None;
    }
}
