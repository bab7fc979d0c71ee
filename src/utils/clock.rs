use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, Utc};

/// Represents an entity responsible for providing the current instant and the offset used to
/// turn it into a calendar day. Allows the store to be driven by a fake clock in tests.
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn offset(&self) -> FixedOffset;

    /// Current instant on the local calendar.
    fn local_time(&self) -> DateTime<FixedOffset> {
        self.time().with_timezone(&self.offset())
    }
}

impl<C: Clock> Clock for Arc<C> {
    fn time(&self) -> DateTime<Utc> {
        self.as_ref().time()
    }

    fn offset(&self) -> FixedOffset {
        self.as_ref().offset()
    }
}

/// System clock with an offset fixed at construction.
pub struct DefaultClock {
    offset: FixedOffset,
}

impl DefaultClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Uses the machine's current local offset.
    pub fn system() -> Self {
        Self::new(*Local::now().offset())
    }
}

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Clock that never moves unless told to.
#[cfg(test)]
pub struct FixedClock {
    pub now: std::sync::Mutex<DateTime<Utc>>,
    pub offset: FixedOffset,
}

#[cfg(test)]
impl FixedClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
            offset,
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn time(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}
