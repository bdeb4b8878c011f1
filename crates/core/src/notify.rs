//! Notification surface: where the controller reports to the user.
//!
//! Only [`NotificationSurface::present`] is required. The other hooks mirror what a form UI
//! does around an operation (busy indicator, input highlighting, request summary panel)
//! and default to doing nothing.

/// Severity of a presented notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Success,
    Warning,
}

/// User control that triggers an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Verify,
    Submit,
}

/// Side-effecting sink for user-visible feedback. Calls are fire-and-forget.
pub trait NotificationSurface {
    fn present(&mut self, title: &str, message: &str, kind: NoticeKind);

    /// Called with `true` when `control`'s operation starts and `false` when it ends,
    /// on every exit path.
    fn set_busy(&mut self, _control: Control, _busy: bool) {}

    /// Highlight the request id input as valid (`Some(true)`), invalid (`Some(false)`),
    /// or clear the highlight (`None`).
    fn mark_request_input(&mut self, _valid: Option<bool>) {}

    /// Show (`Some`) or clear (`None`) the verified request summary.
    fn show_request_summary(&mut self, _summary: Option<&str>) {}
}

impl<N: NotificationSurface + ?Sized> NotificationSurface for Box<N> {
    fn present(&mut self, title: &str, message: &str, kind: NoticeKind) {
        (**self).present(title, message, kind);
    }

    fn set_busy(&mut self, control: Control, busy: bool) {
        (**self).set_busy(control, busy);
    }

    fn mark_request_input(&mut self, valid: Option<bool>) {
        (**self).mark_request_input(valid);
    }

    fn show_request_summary(&mut self, summary: Option<&str>) {
        (**self).show_request_summary(summary);
    }
}

/// Surface that only logs. Useful for headless callers.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSurface;

impl NotificationSurface for TracingSurface {
    fn present(&mut self, title: &str, message: &str, kind: NoticeKind) {
        match kind {
            NoticeKind::Error => tracing::error!(title, message, "booking notice"),
            NoticeKind::Warning => tracing::warn!(title, message, "booking notice"),
            NoticeKind::Success => tracing::info!(title, message, "booking notice"),
        }
    }
}
