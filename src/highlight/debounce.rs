//! Debounced search-as-you-type.
//!
//! Time is passed in as milliseconds so the same logic runs under a browser
//! event loop and in tests.

/// What a keystroke did to the pending query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystroke {
    /// The term is due at the given time, replacing any earlier one.
    Scheduled { due_ms: u64 },
    /// The term is too short: nothing is pending and results should be
    /// cleared.
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    term: String,
    due_ms: u64,
}

/// Holds at most one pending query; each keystroke restarts the delay.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: u64,
    min_term_chars: usize,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(delay_ms: u64, min_term_chars: usize) -> Self {
        Self {
            delay_ms,
            min_term_chars,
            pending: None,
        }
    }

    /// Record the input's current value at `now_ms`.
    pub fn keystroke(&mut self, term: &str, now_ms: u64) -> Keystroke {
        let term = term.trim();
        if term.chars().count() < self.min_term_chars {
            self.pending = None;
            return Keystroke::Cleared;
        }

        let due_ms = now_ms.saturating_add(self.delay_ms);
        self.pending = Some(Pending {
            term: term.to_string(),
            due_ms,
        });
        Keystroke::Scheduled { due_ms }
    }

    /// Take the pending term if its delay has elapsed at `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Option<String> {
        if self.pending.as_ref().is_some_and(|p| p.due_ms <= now_ms) {
            return self.pending.take().map(|p| p.term);
        }
        None
    }

    /// The term waiting to fire, if any.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.term.as_str())
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_query_fires() {
        let mut debouncer = Debouncer::new(300, 2);
        debouncer.keystroke("ca", 0);
        debouncer.keystroke("cat", 100);
        assert_eq!(debouncer.poll(350), None);
        assert_eq!(debouncer.poll(400), Some("cat".to_string()));
        assert_eq!(debouncer.poll(1000), None);
    }

    #[test]
    fn test_short_term_clears_pending() {
        let mut debouncer = Debouncer::new(300, 2);
        debouncer.keystroke("cat", 0);
        assert_eq!(debouncer.keystroke("c", 50), Keystroke::Cleared);
        assert_eq!(debouncer.pending(), None);
        assert_eq!(debouncer.poll(1000), None);
    }

    #[test]
    fn test_schedule_reports_due_time() {
        let mut debouncer = Debouncer::new(300, 2);
        assert_eq!(
            debouncer.keystroke("  dog ", 1_000),
            Keystroke::Scheduled { due_ms: 1_300 }
        );
        assert_eq!(debouncer.pending(), Some("dog"));
    }
}
