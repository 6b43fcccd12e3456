use std::time::Duration;

/// Identifies one scheduled save; only the most recent ticket may fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Debounced save scheduling. The host owns the actual timer and calls
/// [`Debouncer::fire`] with the ticket it was given when the delay elapses.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    pending: Option<u64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Supersedes any pending save with a new one.
    pub fn schedule(&mut self) -> Ticket {
        self.generation += 1;
        self.pending = Some(self.generation);
        Ticket(self.generation)
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns true when `ticket` is still the pending save, consuming it.
    pub fn fire(&mut self, ticket: Ticket) -> bool {
        if self.pending == Some(ticket.0) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_ticket_fires() {
        let mut debounce = Debouncer::new(Duration::from_millis(1000));
        let first = debounce.schedule();
        let second = debounce.schedule();
        let third = debounce.schedule();

        assert!(!debounce.fire(first));
        assert!(!debounce.fire(second));
        assert!(debounce.fire(third));
        assert!(!debounce.fire(third));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn cancel_drops_pending_save() {
        let mut debounce = Debouncer::new(Duration::from_millis(10));
        let ticket = debounce.schedule();
        assert!(debounce.cancel());
        assert!(!debounce.cancel());
        assert!(!debounce.fire(ticket));
    }
}
