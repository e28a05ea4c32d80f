// ── Provider options ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Provider {
    Auto,
    Gemini,
    OpenAI,
    Replicate,
}

impl Provider {
    pub fn all() -> Vec<Provider> {
        vec![
            Provider::Auto,
            Provider::Gemini,
            Provider::OpenAI,
            Provider::Replicate,
        ]
    }

    /// Identifier sent to the backend (`auto` never leaves the client).
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Auto      => "auto",
            Provider::Gemini    => "gemini",
            Provider::OpenAI    => "openai",
            Provider::Replicate => "replicate",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Provider::Auto      => "Auto (Recommended)",
            Provider::Gemini    => "Google Gemini",
            Provider::OpenAI    => "OpenAI",
            Provider::Replicate => "Replicate",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Provider::Auto      => "Uses the template's recommended provider",
            Provider::Gemini    => "Get a key · https://aistudio.google.com/apikey",
            Provider::OpenAI    => "Get a key · https://platform.openai.com/api-keys",
            Provider::Replicate => "Get a key · https://replicate.com/account/api-tokens",
        }
    }

    pub fn from_id(id: &str) -> Option<Provider> {
        Provider::all().into_iter().find(|p| p.id() == id)
    }

    /// Position of `id` in [`Provider::all`]; `None` for ids outside the list,
    /// which are still sent as typed.
    pub fn index_of(id: &str) -> Option<usize> {
        Provider::all().iter().position(|p| p.id() == id)
    }

    /// Moves a list selection one step. A custom id sits below the last entry,
    /// so only moving up leaves it.
    pub fn step(index: Option<usize>, forward: bool) -> Option<usize> {
        let last = Provider::all().len() - 1;
        match (index, forward) {
            (Some(i), true) => Some((i + 1).min(last)),
            (Some(i), false) => Some(i.saturating_sub(1)),
            (None, true) => None,
            (None, false) => Some(last),
        }
    }
}
