//! Position assignment for joining robots.
//!
//! The primary scan walks the ring in strides of `N / max_robots` starting
//! at index 0, spreading the fleet evenly between the coordinator's two
//! reserved positions. When every strided candidate is taken, the fallback
//! scans the remaining indices in reverse from the high end. If nothing is
//! free the join is rejected.

use tracing::debug;

use crate::ring::Ring;

/// Find an unbound position for a joining robot.
///
/// Returns `None` when every index is bound. The caller is responsible for
/// binding the returned index before releasing the ring lock — scan and
/// bind must happen under the same acquisition or two joins could race to
/// the same position.
pub fn assign_position(ring: &Ring, max_robots: usize) -> Option<usize> {
    let stride = (ring.len() / max_robots.max(1)).max(1);

    for position in (0..ring.len()).step_by(stride) {
        if ring.occupant(position).is_free() {
            debug!(position, stride, "strided admission scan hit");
            return Some(position);
        }
    }

    // Every strided candidate is taken; sweep the rest from the high end.
    for position in (0..ring.len()).rev() {
        if ring.occupant(position).is_free() {
            debug!(position, "fallback admission scan hit");
            return Some(position);
        }
    }

    None
}
