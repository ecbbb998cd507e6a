use crate::{gateway::GatewayResult, image_utils::PngImage};

/// Prompt substituted when suggestion fails, so the user is never left with an
/// empty, unusable prompt.
pub const DEFAULT_PROMPT: &str = "\
Add a few people to the masked regions of this interior photo, naturally \
posed, with lighting, shadows and perspective matching the original. Keep \
everything outside the masked regions unchanged.";

/// One gateway call kind in flight at a time. Making this an enum settles the
/// trigger-exclusion question at the state level instead of relying on
/// disabled buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Busy {
    #[default]
    Idle,
    Suggesting,
    Processing,
    Analyzing,
}

/// The whole editing session. All mutation goes through [`Session::reduce`];
/// the UI layer only reads fields and dispatches events.
#[derive(Debug, Default)]
pub struct Session {
    pub original: Option<PngImage>,
    pub masked_composite: Option<PngImage>,
    pub result: Option<PngImage>,
    pub prompt: String,
    pub busy: Busy,
    pub error: Option<String>,
    generation: u64,
}

#[derive(Debug)]
pub enum SessionEvent {
    /// A new photo was chosen; the suggestion call is being issued.
    UploadStarted { image: PngImage },
    PromptSuggested {
        generation: u64,
        result: GatewayResult<String>,
    },
    PromptEdited(String),
    /// The canvas finished a stroke and emitted a fresh composite.
    MaskUpdated { composite: PngImage },
    ApplyStarted,
    InpaintFinished {
        generation: u64,
        result: GatewayResult<PngImage>,
    },
    SmartFixStarted,
    AnalysisFinished {
        generation: u64,
        result: GatewayResult<String>,
    },
    /// Discard the result and return to mask editing.
    BackToEdit,
    Reset,
}

impl Session {
    /// Generation at which in-flight calls were issued. Completion events
    /// carrying an older generation are discarded, which makes the
    /// reset-during-call race deterministic.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Input for an inpaint call: the latest composite, or the untouched
    /// original when no stroke was ever completed.
    pub fn apply_input(&self) -> Option<&PngImage> {
        self.masked_composite.as_ref().or(self.original.as_ref())
    }

    pub fn reduce(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::UploadStarted { image } => {
                *self = Session {
                    original: Some(image),
                    busy: Busy::Suggesting,
                    generation: self.generation + 1,
                    ..Default::default()
                };
            }
            SessionEvent::PromptSuggested { generation, result } => {
                if generation != self.generation {
                    return;
                }
                match result {
                    Ok(text) => self.prompt = text,
                    Err(e) => {
                        self.error = Some(e.to_string());
                        self.prompt = DEFAULT_PROMPT.to_owned();
                    }
                }
                self.busy = Busy::Idle;
            }
            SessionEvent::PromptEdited(text) => self.prompt = text,
            SessionEvent::MaskUpdated { composite } => {
                // Unconditional replacement, content never validated.
                self.masked_composite = Some(composite);
            }
            SessionEvent::ApplyStarted => {
                if self.original.is_none() || self.busy != Busy::Idle {
                    return;
                }
                self.busy = Busy::Processing;
            }
            SessionEvent::InpaintFinished { generation, result } => {
                if generation != self.generation || self.busy != Busy::Processing {
                    return;
                }
                match result {
                    Ok(image) => {
                        self.result = Some(image);
                        self.error = None;
                    }
                    Err(e) => self.error = Some(e.to_string()),
                }
                self.busy = Busy::Idle;
            }
            SessionEvent::SmartFixStarted => {
                if self.original.is_none() || self.result.is_none() || self.busy != Busy::Idle {
                    return;
                }
                self.busy = Busy::Analyzing;
            }
            SessionEvent::AnalysisFinished { generation, result } => {
                if generation != self.generation || self.busy != Busy::Analyzing {
                    return;
                }
                match result {
                    Ok(text) => {
                        // Corrective prompt returns the session to edit mode.
                        self.prompt = text;
                        self.result = None;
                        self.error = None;
                    }
                    Err(e) => self.error = Some(e.to_string()),
                }
                self.busy = Busy::Idle;
            }
            SessionEvent::BackToEdit => self.result = None,
            SessionEvent::Reset => {
                *self = Session {
                    generation: self.generation + 1,
                    ..Default::default()
                };
            }
        }
    }
}
