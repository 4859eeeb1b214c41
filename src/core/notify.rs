//! User-facing notices ("toasts")
//!
//! Fire-and-forget: a notifier never fails and its output is not part of any
//! data contract.

use console::style;
use std::cell::RefCell;

/// Kind of notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// One recorded notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

/// Sink for success/error notices
pub trait Notifier {
    fn notify(&self, notice: Notice);

    fn success(&self, title: &str, description: Option<&str>) {
        self.notify(Notice {
            level: NoticeLevel::Success,
            title: title.to_string(),
            description: description.map(str::to_string),
        });
    }

    fn error(&self, title: &str, description: Option<&str>) {
        self.notify(Notice {
            level: NoticeLevel::Error,
            title: title.to_string(),
            description: description.map(str::to_string),
        });
    }
}

/// Discards every notice
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notice: Notice) {}
}

/// Prints notices to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier {
    /// Suppress success notices
    pub quiet: bool,
}

impl ConsoleNotifier {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let marker = match notice.level {
            NoticeLevel::Success if self.quiet => return,
            NoticeLevel::Success => style("✓").green(),
            NoticeLevel::Error => style("✗").red(),
        };
        match notice.description {
            Some(desc) => eprintln!("{} {}: {}", marker, style(&notice.title).bold(), desc),
            None => eprintln!("{} {}", marker, style(&notice.title).bold()),
        }
    }
}

/// Keeps notices in memory for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.notices.borrow().iter().map(|n| n.title.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }
}

impl<T: Notifier + ?Sized> Notifier for std::rc::Rc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}
