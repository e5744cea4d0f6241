//! User-facing feedback: notifications and the busy state of an action

use std::cell::{Cell, RefCell};

use crate::error::{Error, Result};

/// Where blocking errors and completion messages go
pub trait Feedback {
    /// A failure the user must acknowledge
    fn error(&self, message: &str);
    /// A tool finished and saved its result
    fn success(&self, message: &str);
    /// Informational message that is neither success nor failure
    fn notice(&self, message: &str);
}

/// Prints feedback to stderr
#[derive(Debug, Default)]
pub struct ConsoleFeedback;

impl Feedback for ConsoleFeedback {
    fn error(&self, message: &str) {
        eprintln!("Error: {message}");
    }

    fn success(&self, message: &str) {
        eprintln!("{message}");
    }

    fn notice(&self, message: &str) {
        eprintln!("Note: {message}");
    }
}

/// One recorded feedback message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEvent {
    Error(String),
    Success(String),
    Notice(String),
}

/// Keeps every message for later inspection
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    events: RefCell<Vec<FeedbackEvent>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.events.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                FeedbackEvent::Error(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                FeedbackEvent::Success(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Feedback for RecordingFeedback {
    fn error(&self, message: &str) {
        self.events.borrow_mut().push(FeedbackEvent::Error(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.events.borrow_mut().push(FeedbackEvent::Success(message.to_string()));
    }

    fn notice(&self, message: &str) {
        self.events.borrow_mut().push(FeedbackEvent::Notice(message.to_string()));
    }
}

/// Label shown while a tool is running
pub const PROCESSING_LABEL: &str = "Processing...";

/// The button that starts a tool
///
/// While a run is in progress the control is disabled and shows
/// [`PROCESSING_LABEL`]. A second start is rejected until the guard returned
/// by [`ActionControl::begin`] is dropped.
#[derive(Debug)]
pub struct ActionControl {
    label: String,
    busy: Cell<bool>,
}

impl ActionControl {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            busy: Cell::new(false),
        }
    }

    /// Text currently displayed
    pub fn label(&self) -> &str {
        if self.busy.get() {
            PROCESSING_LABEL
        } else {
            &self.label
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.busy.get()
    }

    /// Mark the control busy until the guard is dropped
    pub fn begin(&self) -> Result<BusyGuard<'_>> {
        if self.busy.replace(true) {
            return Err(Error::Busy(self.label.clone()));
        }
        Ok(BusyGuard { control: self })
    }
}

/// Restores the control's label and enabled state when dropped
#[derive(Debug)]
pub struct BusyGuard<'a> {
    control: &'a ActionControl,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.control.busy.set(false);
    }
}
