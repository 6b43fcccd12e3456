#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub generation: u64,
}

/// Transient status line. Every message carries a generation so a dismiss
/// timer started for an older message leaves a newer one alone.
#[derive(Clone, Debug, Default)]
pub struct StatusLine {
    current: Option<StatusMessage>,
    generation: u64,
}

impl StatusLine {
    pub fn show(&mut self, text: impl Into<String>, kind: StatusKind) -> u64 {
        self.generation += 1;
        self.current = Some(StatusMessage {
            text: text.into(),
            kind,
            generation: self.generation,
        });
        self.generation
    }

    pub fn dismiss(&mut self, generation: u64) -> bool {
        if self.current.as_ref().is_some_and(|msg| msg.generation == generation) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }
}
