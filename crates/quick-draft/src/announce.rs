//! Assistive announcements (fire-and-forget)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Politeness {
    Polite,
    Assertive,
}

impl Politeness {
    pub fn as_str(self) -> &'static str {
        match self {
            Politeness::Polite => "polite",
            Politeness::Assertive => "assertive",
        }
    }
}

/// Sink for screen-reader announcements. Nothing is returned or awaited.
pub trait Announcer {
    fn announce(&self, message: &str, priority: Politeness);
}
