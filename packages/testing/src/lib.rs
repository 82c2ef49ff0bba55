#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing the packages in this workspace.

use std::panic;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// How long a test wrapped in [`with_watchdog()`] may run before it is considered hung.
///
/// Miri is dramatically slower at thread synchronization, so it gets more time.
#[must_use]
pub fn watchdog_timeout() -> Duration {
    if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    }
}

/// Runs a test on a separate thread and fails it if it does not finish within
/// [`watchdog_timeout()`].
///
/// Use this for tests that involve multiple threads, where a bug tends to show up as a deadlock
/// rather than as a failed assertion.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog is disabled and
/// the test runs on the calling thread, so that mutation testing can detect mutations that hang.
///
/// # Panics
///
/// Panics if the test exceeds the timeout. If the test itself panics, the panic is resumed on
/// the calling thread.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let sum = with_watchdog(|| 2 + 2);
/// assert_eq!(sum, 4);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_thread = thread::spawn(move || {
        // If the receiver is gone, the watchdog has already given up on us.
        drop(tx.send(test_fn()));
    });

    let timeout = watchdog_timeout();

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_thread
                .join()
                .expect("test thread finished sending, so it cannot have panicked");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test did not finish within {timeout:?}, it is probably deadlocked");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_thread.join() {
            Ok(()) => panic!("test thread exited without producing a result"),
            Err(payload) => panic::resume_unwind(payload),
        },
    }
}
