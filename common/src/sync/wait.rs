//! Bounded polling.
//!
//! Hardware handshakes are often "spin until a flag clears". An unbounded
//! spin wedges the CPU when the other side has died, so every such loop
//! goes through [`wait_until`] with an explicit iteration bound.

/// The condition did not become true within the poll bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Expired;

/// Poll `ready` at most `bound` times, relaxing the CPU between polls.
///
/// Returns the number of polls it took for `ready` to return `true`.
pub fn wait_until(mut ready: impl FnMut() -> bool, bound: u32) -> Result<u32, Expired> {
    for polls in 1..=bound {
        if ready() {
            return Ok(polls);
        }
        core::hint::spin_loop();
    }
    Err(Expired)
}
