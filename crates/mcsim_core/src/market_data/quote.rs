//! Shared market quotes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to a quote.
pub type QuoteHandle = Arc<SimpleQuote>;

/// A single market value that can be updated in place.
///
/// The value is stored as `f64` bits in an atomic, so handles can be read
/// and written from any thread without locking. Consumers that cache
/// results derived from quotes are not notified of updates; they expose an
/// explicit invalidation instead.
///
/// # Examples
///
/// ```
/// use mcsim_core::market_data::SimpleQuote;
///
/// let quote = SimpleQuote::handle(0.20);
/// let previous = quote.set_value(0.25);
/// assert_eq!(previous, 0.20);
/// assert_eq!(quote.value(), 0.25);
/// ```
#[derive(Debug)]
pub struct SimpleQuote {
    bits: AtomicU64,
}

impl SimpleQuote {
    /// Creates a quote holding `value`.
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    /// Creates a shared handle to a new quote.
    pub fn handle(value: f64) -> QuoteHandle {
        Arc::new(Self::new(value))
    }

    /// Returns the current value.
    #[inline]
    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Replaces the value, returning the previous one.
    pub fn set_value(&self, value: f64) -> f64 {
        f64::from_bits(self.bits.swap(value.to_bits(), Ordering::AcqRel))
    }
}

impl Clone for SimpleQuote {
    fn clone(&self) -> Self {
        Self::new(self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_update_visible_through_all_handles() {
        let a = SimpleQuote::handle(1.0);
        let b = Arc::clone(&a);
        a.set_value(2.5);
        assert_eq!(b.value(), 2.5);
    }

    #[test]
    fn test_clone_is_detached() {
        let a = SimpleQuote::new(1.0);
        let b = a.clone();
        a.set_value(3.0);
        assert_eq!(b.value(), 1.0);
    }

    #[test]
    fn test_concurrent_writes_leave_a_written_value() {
        let quote = SimpleQuote::handle(0.0);
        let writers: Vec<_> = (1..=4)
            .map(|i| {
                let q = Arc::clone(&quote);
                thread::spawn(move || {
                    q.set_value(i as f64);
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        assert!((1..=4).any(|i| quote.value() == i as f64));
    }
}
