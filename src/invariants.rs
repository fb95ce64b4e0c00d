//! Debug-only sanity checks for the ring buffer and intern tables. Compiled
//! out entirely in release builds.

/// Head and tail must always refer to a slot within the sentinel-padded
/// buffer; violating this means the modulo arithmetic in `Ring` is wrong.
#[macro_export]
macro_rules! debug_assert_ring_index {
    ($index:expr, $slots:expr) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!(
                $index < $slots,
                "ring index {} out of range for {} slots",
                $index,
                $slots
            );
        }
    };
}

/// The ring can never hold more than `capacity` live items — the sentinel
/// slot exists precisely so `len()` can never reach `slots`.
#[macro_export]
macro_rules! debug_assert_ring_not_over_capacity {
    ($len:expr, $capacity:expr) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!(
                $len <= $capacity,
                "ring length {} exceeds capacity {}",
                $len,
                $capacity
            );
        }
    };
}

/// Intern-table indices are handed out once and never reused within a
/// session; a fresh index must always equal the table's length before insert.
#[macro_export]
macro_rules! debug_assert_intern_index_monotonic {
    ($index:expr, $len_before_insert:expr) => {
        #[cfg(debug_assertions)]
        {
            debug_assert_eq!(
                $index, $len_before_insert,
                "intern index {} did not match table length {} before insert",
                $index, $len_before_insert
            );
        }
    };
}
