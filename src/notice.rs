use std::time::{Duration, Instant};

/// How long a notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
    Info,
}

impl Tone {
    pub fn label(&self) -> &'static str {
        match self {
            Tone::Success => "success",
            Tone::Error => "error",
            Tone::Info => "info",
        }
    }
}

/// A transient status line.
///
/// Every call to [`Notice::show`] arms its own hide deadline and none of them
/// is ever cancelled: the first deadline to pass hides whatever text is shown
/// at that moment, including a newer message.
#[derive(Debug, Default)]
pub struct Notice {
    text: String,
    tone: Option<Tone>,
    visible: bool,
    deadlines: Vec<Instant>,
}

impl Notice {
    pub fn show(&mut self, text: impl Into<String>, tone: Tone, now: Instant) {
        // Timers that already fired must not hide the new message.
        self.tick(now);
        self.text = text.into();
        self.tone = Some(tone);
        self.visible = true;
        self.deadlines.push(now + NOTICE_DURATION);
    }

    pub fn tick(&mut self, now: Instant) {
        let armed = self.deadlines.len();
        self.deadlines.retain(|deadline| *deadline > now);
        if self.deadlines.len() < armed {
            self.visible = false;
        }
    }

    pub fn current(&self) -> Option<(&str, Tone)> {
        match (self.visible, self.tone) {
            (true, Some(tone)) => Some((self.text.as_str(), tone)),
            _ => None,
        }
    }
}
