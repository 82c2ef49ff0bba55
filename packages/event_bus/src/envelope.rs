use std::fmt;

use object_pool::Poolable;

use crate::Event;

/// A pooled `(sender, payload)` pair that carries one fired event until it is dispatched.
pub(crate) struct Envelope<E, S> {
    sender: Option<S>,
    payload: Option<Box<E>>,
}

impl<E, S> Envelope<E, S>
where
    E: Event,
    S: Send + 'static,
{
    pub(crate) fn fill(&mut self, sender: S, payload: Box<E>) {
        self.sender = Some(sender);
        self.payload = Some(payload);
    }

    pub(crate) fn sender(&self) -> Option<&S> {
        self.sender.as_ref()
    }

    pub(crate) fn take_payload(&mut self) -> Option<Box<E>> {
        self.payload.take()
    }
}

impl<E, S> Default for Envelope<E, S> {
    fn default() -> Self {
        Self {
            sender: None,
            payload: None,
        }
    }
}

impl<E, S> Poolable for Envelope<E, S>
where
    E: Event,
    S: Send + 'static,
{
    fn reset(&mut self) {
        self.sender = None;
        self.payload = None;
    }
}

impl<E, S> fmt::Debug for Envelope<E, S> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("has_sender", &self.sender.is_some())
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::EventId;

    #[derive(Default)]
    struct Score {
        points: u32,
    }

    impl Poolable for Score {
        fn reset(&mut self) {
            self.points = 0;
        }
    }

    impl Event for Score {
        fn id(&self) -> EventId {
            3
        }
    }

    assert_impl_all!(Envelope<Score, String>: Send);

    #[test]
    fn fill_then_take() {
        let mut envelope = Envelope::<Score, &'static str>::default();
        envelope.fill("referee", Box::new(Score { points: 3 }));

        assert_eq!(envelope.sender(), Some(&"referee"));

        let payload = envelope.take_payload().unwrap();
        assert_eq!(payload.points, 3);
        assert!(envelope.take_payload().is_none());
    }

    #[test]
    fn reset_empties_envelope() {
        let mut envelope = Envelope::<Score, u32>::default();
        envelope.fill(5, Box::new(Score::default()));

        envelope.reset();

        assert!(envelope.sender().is_none());
        assert!(envelope.take_payload().is_none());
    }
}
