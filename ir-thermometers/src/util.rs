// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

/// Check if the n-th bit is set.
///
/// Bits are 0-indexed, from the LSB.
pub(crate) fn is_bit_set<B>(value: B, index: usize) -> bool
where
    B: num_traits::PrimInt + num_traits::Unsigned,
{
    (value & (B::one() << index)) > B::zero()
}

/// Run `operation` until it succeeds, at most `attempts` times.
///
/// After each failure `should_retry` is consulted; when it returns `false` the error is returned
/// immediately. The error from the last attempt is returned once the attempts are used up. At
/// least one attempt is always made.
pub(crate) fn retry<T, E, P, F>(attempts: usize, mut should_retry: P, mut operation: F) -> Result<T, E>
where
    P: FnMut(&E) -> bool,
    F: FnMut() -> Result<T, E>,
{
    let mut remaining = attempts.max(1);
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) => {
                remaining -= 1;
                if remaining == 0 || !should_retry(&err) {
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use core::cell::Cell;

    use super::retry;

    #[test]
    fn is_bit_set() {
        for n in 0..16 {
            let value: u16 = 1 << n;
            assert!(
                super::is_bit_set(value, n),
                "is_bit_set was incorrect for bit {}",
                n
            );
        }
        assert!(!super::is_bit_set(0x7FFFu16, 15));
    }

    #[test]
    fn retry_stops_on_success() {
        let calls = Cell::new(0);
        let result: Result<u8, ()> = retry(
            10,
            |_| true,
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(())
                } else {
                    Ok(7)
                }
            },
        );
        assert_eq!(result, Ok(7));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn retry_is_bounded() {
        let calls = Cell::new(0);
        let result: Result<(), usize> = retry(
            10,
            |_| true,
            || {
                calls.set(calls.get() + 1);
                Err(calls.get())
            },
        );
        // The last error is the one returned
        assert_eq!(result, Err(10));
        assert_eq!(calls.get(), 10);
    }

    #[test]
    fn retry_respects_predicate() {
        let calls = Cell::new(0);
        let result: Result<(), &str> = retry(
            10,
            |err| *err != "fatal",
            || {
                calls.set(calls.get() + 1);
                Err("fatal")
            },
        );
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retry_always_attempts_once() {
        let calls = Cell::new(0);
        let result: Result<(), ()> = retry(
            0,
            |_| true,
            || {
                calls.set(calls.get() + 1);
                Err(())
            },
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
