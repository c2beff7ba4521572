//! Transient status messages

use std::time::{Duration, Instant};

/// How long a toast stays up.
pub const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    shown_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= TOAST_TTL
    }
}

/// Holds at most one toast; a new one replaces the old.
#[derive(Debug, Clone, Default)]
pub struct ToastSlot {
    current: Option<Toast>,
}

impl ToastSlot {
    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.current = Some(Toast::new(message, kind));
    }

    /// The visible toast at `now`, dropping it once expired.
    pub fn visible_at(&mut self, now: Instant) -> Option<&Toast> {
        if self.current.as_ref().is_some_and(|t| t.is_expired_at(now)) {
            self.current = None;
        }
        self.current.as_ref()
    }

    pub fn visible(&mut self) -> Option<&Toast> {
        self.visible_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_expires_after_ttl() {
        let mut slot = ToastSlot::default();
        slot.show("saved", ToastKind::Success);
        let shown = slot.current.as_ref().unwrap().shown_at;

        assert_eq!(slot.visible_at(shown).unwrap().message, "saved");
        assert!(slot.visible_at(shown + Duration::from_millis(2999)).is_some());
        assert!(slot.visible_at(shown + TOAST_TTL).is_none());
        assert!(slot.visible_at(shown).is_none());
    }

    #[test]
    fn newer_toast_replaces_older() {
        let mut slot = ToastSlot::default();
        slot.show("first", ToastKind::Info);
        slot.show("second", ToastKind::Error);
        let toast = slot.visible().unwrap();
        assert_eq!(toast.message, "second");
        assert_eq!(toast.kind, ToastKind::Error);
    }
}
