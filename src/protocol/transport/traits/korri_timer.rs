//! Asynchronous timer abstraction providing every delay used by the stack:
//! response deadlines, claim backoff, inter-packet spacing and settle times.

/// Timer trait abstraction; must remain thread-safe when applicable.
///
/// Deadlines are built by racing `delay_ms` against `CanBus::recv`, so the returned
/// future has to be cancel safe as well.
pub trait KorriTimer {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(
        &'a mut self,
        millis: u32,
    ) -> impl core::future::Future<Output = ()> + 'a;
}
