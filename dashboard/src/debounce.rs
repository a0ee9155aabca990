use tokio::time::{Duration, Instant};

/// Edit-settling filter for the search box. Every keystroke re-arms the
/// quiet-period timer; only a deadline that survives untouched produces a
/// commit. Purely a timer holder, never a network trigger.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Record an edit: the previous timer (if any) is superseded.
    pub fn touch(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet);
    }

    /// The pending deadline, if an edit is waiting to settle.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the pending deadline when the timer fires. Returns false if
    /// nothing was armed (spurious wakeup).
    pub fn take(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}
