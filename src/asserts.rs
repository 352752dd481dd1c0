//! Tiered debug assertions. The simple tier is always on and guards API
//! misuse; higher tiers check increasingly expensive internal invariants and
//! are enabled in tests or through the `debug-checks` feature.

#[cfg(all(not(test), not(feature = "debug-checks")))]
pub const PITAYA_ASSERT_LEVEL_DEFINITION: u8 = PITAYA_ASSERT_SIMPLE;

#[cfg(any(test, feature = "debug-checks"))]
pub const PITAYA_ASSERT_LEVEL_DEFINITION: u8 = PITAYA_ASSERT_MODERATE;

pub const PITAYA_ASSERT_SIMPLE: u8 = 1;
pub const PITAYA_ASSERT_MODERATE: u8 = 2;
pub const PITAYA_ASSERT_ADVANCED: u8 = 3;
pub const PITAYA_ASSERT_EXTREME: u8 = 4;

#[macro_export]
#[doc(hidden)]
macro_rules! pitaya_assert_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::PITAYA_ASSERT_LEVEL_DEFINITION >= $crate::asserts::PITAYA_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! pitaya_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::PITAYA_ASSERT_LEVEL_DEFINITION >= $crate::asserts::PITAYA_ASSERT_SIMPLE {
            assert_eq!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! pitaya_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::asserts::PITAYA_ASSERT_LEVEL_DEFINITION >= $crate::asserts::PITAYA_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! pitaya_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::asserts::PITAYA_ASSERT_LEVEL_DEFINITION >= $crate::asserts::PITAYA_ASSERT_ADVANCED {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! pitaya_assert_extreme {
    ($($arg:tt)*) => {
        if $crate::asserts::PITAYA_ASSERT_LEVEL_DEFINITION >= $crate::asserts::PITAYA_ASSERT_EXTREME {
            assert!($($arg)*);
        }
    };
}
