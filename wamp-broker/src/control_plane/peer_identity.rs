//! Sender identity used for publisher self-exclusion.

use crate::sender::SenderRef;
use std::sync::Arc;

/// Returns `true` when both handles point at the same participant.
///
/// Only the data pointer is compared; two handles to the same allocation are equal
/// even if they were coerced through different vtables.
pub fn is_same_sender(left: &SenderRef, right: &SenderRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(left) as *const (),
        Arc::as_ptr(right) as *const (),
    )
}
