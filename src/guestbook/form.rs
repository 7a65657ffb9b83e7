//! Editable message draft.
//!
//! Holds the title/text fields a user is typing, either for a new message or
//! for an edit of an existing one. The draft survives a failed submission:
//! fields are snapshotted when the submission starts and restored if it
//! fails, so unsaved input is never lost.

use crate::config::schema::LimitsConfig;
use crate::guestbook::types::{GuestbookError, GuestbookResult, Message};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Draft {
    title: String,
    text: String,
}

/// Draft state for composing or editing a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageForm {
    title: String,
    text: String,
    target: Option<u64>,
    snapshot: Option<Draft>,
}

impl MessageForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the edit target.
    ///
    /// The target's fields are mirrored into the draft; `None` returns the
    /// form to compose mode with empty fields. Unsaved input is discarded
    /// either way.
    pub fn set_target(&mut self, target: Option<&Message>) {
        match target {
            Some(message) => {
                self.target = Some(message.id);
                self.title = message.title.clone();
                self.text = message.text.clone();
            }
            None => {
                self.target = None;
                self.title.clear();
                self.text.clear();
            }
        }
        self.snapshot = None;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Slot id being edited, or `None` when composing a new message.
    pub fn target(&self) -> Option<u64> {
        self.target
    }

    pub fn is_edit(&self) -> bool {
        self.target.is_some()
    }

    /// Start a submission: snapshot the fields, clear them, and hand the
    /// captured values to the caller.
    pub fn begin_submit(&mut self) -> (String, String) {
        let title = std::mem::take(&mut self.title);
        let text = std::mem::take(&mut self.text);
        self.snapshot = Some(Draft {
            title: title.clone(),
            text: text.clone(),
        });
        (title, text)
    }

    /// Finish the submission started by [`begin_submit`](Self::begin_submit).
    ///
    /// On success the form returns to compose mode. On failure the
    /// snapshotted fields come back so the user can retry or keep editing.
    pub fn finish_submit(&mut self, ok: bool) {
        let snapshot = self.snapshot.take();
        if ok {
            self.target = None;
            return;
        }
        if let Some(draft) = snapshot {
            self.title = draft.title;
            self.text = draft.text;
        }
    }
}

/// Reject empty or oversized fields before anything reaches the chain.
pub fn validate_fields(title: &str, text: &str, limits: &LimitsConfig) -> GuestbookResult<()> {
    if title.trim().is_empty() {
        return Err(GuestbookError::InvalidMessage("title is empty".into()));
    }
    if text.trim().is_empty() {
        return Err(GuestbookError::InvalidMessage("text is empty".into()));
    }
    if title.len() > limits.max_title_bytes {
        return Err(GuestbookError::InvalidMessage(format!(
            "title exceeds {} bytes",
            limits.max_title_bytes
        )));
    }
    if text.len() > limits.max_text_bytes {
        return Err(GuestbookError::InvalidMessage(format!(
            "text exceeds {} bytes",
            limits.max_text_bytes
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    fn sample_message() -> Message {
        Message {
            id: 7,
            author: Address::repeat_byte(0xaa),
            title: "hello".to_string(),
            text: "world".to_string(),
        }
    }

    #[test]
    fn target_change_mirrors_fields() {
        let mut form = MessageForm::new();
        form.set_title("draft title");
        form.set_text("draft text");

        let message = sample_message();
        form.set_target(Some(&message));

        assert_eq!(form.target(), Some(7));
        assert_eq!(form.title(), "hello");
        assert_eq!(form.text(), "world");
        assert!(form.is_edit());
    }

    #[test]
    fn clearing_target_returns_to_compose_mode() {
        let mut form = MessageForm::new();
        let message = sample_message();
        form.set_target(Some(&message));
        form.set_target(None);

        assert_eq!(form.target(), None);
        assert_eq!(form.title(), "");
        assert_eq!(form.text(), "");
        assert!(!form.is_edit());
    }

    #[test]
    fn failed_submit_restores_draft() {
        let mut form = MessageForm::new();
        form.set_title("my title");
        form.set_text("my text");

        let (title, text) = form.begin_submit();
        assert_eq!(title, "my title");
        assert_eq!(text, "my text");
        assert_eq!(form.title(), "");

        form.finish_submit(false);
        assert_eq!(form.title(), "my title");
        assert_eq!(form.text(), "my text");
    }

    #[test]
    fn successful_submit_clears_edit_target() {
        let mut form = MessageForm::new();
        let message = sample_message();
        form.set_target(Some(&message));
        form.set_text("revised");

        form.begin_submit();
        form.finish_submit(true);

        assert!(!form.is_edit());
        assert_eq!(form.title(), "");
        assert_eq!(form.text(), "");
    }

    #[test]
    fn validation_rejects_empty_and_oversized_fields() {
        let limits = LimitsConfig::default();
        assert!(validate_fields("title", "text", &limits).is_ok());
        assert!(validate_fields("", "text", &limits).is_err());
        assert!(validate_fields("   ", "text", &limits).is_err());
        assert!(validate_fields("title", "", &limits).is_err());

        let long_title = "t".repeat(limits.max_title_bytes + 1);
        assert!(validate_fields(&long_title, "text", &limits).is_err());
        let long_text = "x".repeat(limits.max_text_bytes + 1);
        assert!(validate_fields("title", &long_text, &limits).is_err());
    }
}
