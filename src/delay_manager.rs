use std::time::{Duration, Instant};
use std::thread;
use log::debug;
use crate::pipeline::CancelToken;

const SLICE: Duration = Duration::from_millis(100);

/// Fixed pause after a network call. Wakes early if `cancel` fires.
/// Returns false when the wait was cut short by cancellation.
pub fn request_delay(delay: Duration, cancel: &CancelToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    debug!("Waiting for {:.1} seconds (Request Delay)...", delay.as_secs_f64());

    let deadline = Instant::now() + delay;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(SLICE.min(deadline - now));
    }
}
