//! OneShot: a guard for an operation that must run at most once.

/// `NotStarted -> InFlight -> Done(T)`, with two ways out of `InFlight` on
/// failure: [`abort`](Self::abort) allows an immediate retry, while
/// [`fail`](Self::fail) parks in `Failed` until [`rearm`](Self::rearm).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneShot<T> {
    NotStarted,
    InFlight,
    Done(T),
    Failed,
}

impl<T> Default for OneShot<T> {
    fn default() -> Self {
        OneShot::NotStarted
    }
}

impl<T> OneShot<T> {
    /// Already completed with `value`.
    pub fn done(value: T) -> Self {
        OneShot::Done(value)
    }

    /// Enter `InFlight`. Returns `false` unless currently `NotStarted`.
    pub fn begin(&mut self) -> bool {
        if matches!(self, OneShot::NotStarted) {
            *self = OneShot::InFlight;
            true
        } else {
            false
        }
    }

    pub fn finish(&mut self, value: T) {
        if matches!(self, OneShot::InFlight) {
            *self = OneShot::Done(value);
        }
    }

    /// Back to `NotStarted`; the next `begin` may try again.
    pub fn abort(&mut self) {
        if matches!(self, OneShot::InFlight) {
            *self = OneShot::NotStarted;
        }
    }

    /// Park in `Failed`; only an explicit `rearm` allows another attempt.
    pub fn fail(&mut self) {
        if matches!(self, OneShot::InFlight) {
            *self = OneShot::Failed;
        }
    }

    /// `Failed -> NotStarted`. Returns whether it moved.
    pub fn rearm(&mut self) -> bool {
        if matches!(self, OneShot::Failed) {
            *self = OneShot::NotStarted;
            true
        } else {
            false
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            OneShot::Done(value) => Some(value),
            _ => None,
        }
    }
}
