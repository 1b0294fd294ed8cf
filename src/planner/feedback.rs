//! Utilities to report the outcome of planner operations to the user

use std::fmt::{Display, Error, Formatter};

/// A user-visible notice, typically displayed as a short-lived toast
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// Nothing happened yet
    Idle,
    Success(String),
    Info(String),
    /// Something was refused before anything changed (e.g. an incomplete form)
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Notice::Idle => write!(f, ""),
            Notice::Success(text) => write!(f, "✓ {}", text),
            Notice::Info(text) => write!(f, "{}", text),
            Notice::Warning(text) => write!(f, "⚠ {}", text),
            Notice::Error(text) => write!(f, "✗ {}", text),
        }
    }
}

impl Default for Notice {
    fn default() -> Self {
        Self::Idle
    }
}



/// See [`notice_channel`]
pub type NoticeSender = tokio::sync::watch::Sender<Notice>;
/// See [`notice_channel`]
pub type NoticeReceiver = tokio::sync::watch::Receiver<Notice>;

/// Create a notice channel, that can be used to retrieve the latest notice emitted by a planner
pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    tokio::sync::watch::channel(Notice::default())
}



/// Logs what happens to the planner, and forwards user-visible notices to a listener (if any)
pub struct Feedback {
    channel: Option<NoticeSender>,
}

impl Feedback {
    pub fn new() -> Self {
        Self { channel: None }
    }
    pub fn new_with_channel(channel: NoticeSender) -> Self {
        Self { channel: Some(channel) }
    }

    pub fn success(&self, text: &str) {
        log::info!("{}", text);
        self.send(Notice::Success(text.to_string()));
    }
    pub fn info(&self, text: &str) {
        log::info!("{}", text);
        self.send(Notice::Info(text.to_string()));
    }
    pub fn warn(&self, text: &str) {
        log::warn!("{}", text);
        self.send(Notice::Warning(text.to_string()));
    }
    /// Report a failure. `details` is only logged, the user only sees `text`
    pub fn error(&self, text: &str, details: &dyn Display) {
        log::error!("{}: {}", text, details);
        self.send(Notice::Error(text.to_string()));
    }
    /// Log a debug message
    pub fn debug(&self, text: &str) {
        log::debug!("{}", text);
    }

    fn send(&self, notice: Notice) {
        if let Some(sender) = &self.channel {
            // Nobody listening is fine
            let _ = sender.send(notice);
        }
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_reach_the_listener() {
        let (sender, receiver) = notice_channel();
        let feedback = Feedback::new_with_channel(sender);
        assert_eq!(*receiver.borrow(), Notice::Idle);

        feedback.success("Task added");
        assert_eq!(*receiver.borrow(), Notice::Success("Task added".to_string()));

        feedback.error("Unable to delete the task", &"HTTP 500");
        assert!(receiver.borrow().is_error());
        assert_eq!(receiver.borrow().to_string(), "✗ Unable to delete the task");

        // No listener at all
        Feedback::new().info("nobody hears this");
    }
}
