//! Bounded waits split into slices.
//!
//! A game that crashed mid-handshake never acknowledges anything, so every
//! blocking wait on it is made of a fixed number of timed slices.

use std::time::Duration;

/// How many slices a wait gets and what to do between them
pub trait RetryStrategy {
    /// Number of slices, at least one is always run
    fn attempts(&self) -> u32;

    /// Pause after slice `attempt` (0-indexed) failed, if any
    fn pause_after(&self, attempt: u32) -> Option<Duration>;

    /// Run `slice` until it succeeds or the slices are used up.
    ///
    /// The error of the last slice is returned.
    fn run<T, E, F>(&self, mut slice: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
    {
        let last = self.attempts().saturating_sub(1);
        let mut attempt = 0;
        loop {
            match slice(attempt) {
                Err(_) if attempt < last => {
                    if let Some(pause) = self.pause_after(attempt) {
                        std::thread::sleep(pause);
                    }
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slices(u32);

    impl RetryStrategy for Slices {
        fn attempts(&self) -> u32 {
            self.0
        }

        fn pause_after(&self, _attempt: u32) -> Option<Duration> {
            Some(Duration::from_millis(1))
        }
    }

    #[test]
    fn test_first_slice_succeeds() {
        let mut calls = 0;
        let result: Result<&str, ()> = Slices(5).run(|_| {
            calls += 1;
            Ok("acknowledged")
        });
        assert_eq!(result, Ok("acknowledged"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_later_slice_succeeds() {
        let result: Result<u32, &str> =
            Slices(3).run(|attempt| if attempt == 2 { Ok(attempt) } else { Err("timeout") });
        assert_eq!(result, Ok(2));
    }

    #[test]
    fn test_last_error_is_returned() {
        let mut seen = Vec::new();
        let result: Result<(), u32> = Slices(4).run(|attempt| {
            seen.push(attempt);
            Err(attempt)
        });
        assert_eq!(result, Err(3));
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_zero_slices_still_waits_once() {
        let mut calls = 0;
        let result: Result<(), ()> = Slices(0).run(|_| {
            calls += 1;
            Err(())
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
