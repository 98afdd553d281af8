//! Positional placeholder numbering.

use crate::error::{OqlError, OqlResult};

/// Hands out ascending `$n` placeholder indices for one compilation.
///
/// Indices start at 1 and are bounded by the number of parameters the query
/// method declares. Requesting more is an error, never a wraparound.
#[derive(Debug, Clone)]
pub struct PlaceholderSequence {
    next: usize,
    max: usize,
}

impl PlaceholderSequence {
    /// Create a sequence that issues at most `max` indices.
    pub fn new(max: usize) -> Self {
        Self { next: 1, max }
    }

    /// Create a sequence with no practical bound.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Return the current index and advance.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> OqlResult<usize> {
        if self.issued() >= self.max {
            return Err(OqlError::PlaceholderOverflow { max: self.max });
        }
        let index = self.next;
        self.next += 1;
        Ok(index)
    }

    /// Take `n` consecutive indices.
    pub fn take(&mut self, n: usize) -> OqlResult<Vec<usize>> {
        (0..n).map(|_| self.next()).collect()
    }

    /// Number of indices issued so far.
    pub fn issued(&self) -> usize {
        self.next - 1
    }

    /// Maximum number of indices this sequence will issue.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Start over at 1.
    pub fn reset(&mut self) {
        self.next = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        let mut seq = PlaceholderSequence::new(3);
        assert_eq!(seq.next().unwrap(), 1);
        assert_eq!(seq.next().unwrap(), 2);
        assert_eq!(seq.next().unwrap(), 3);
        assert_eq!(seq.issued(), 3);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut seq = PlaceholderSequence::new(1);
        seq.next().unwrap();
        assert!(matches!(
            seq.next(),
            Err(OqlError::PlaceholderOverflow { max: 1 })
        ));
        assert_eq!(seq.issued(), 1);
    }

    #[test]
    fn zero_bound_issues_nothing() {
        let mut seq = PlaceholderSequence::new(0);
        assert!(seq.next().is_err());
        assert_eq!(seq.take(0).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn take_and_reset() {
        let mut seq = PlaceholderSequence::new(4);
        assert_eq!(seq.take(2).unwrap(), vec![1, 2]);
        seq.reset();
        assert_eq!(seq.next().unwrap(), 1);
    }
}
