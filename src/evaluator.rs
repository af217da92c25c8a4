//! Arithmetic over signed 32-bit integers.
//!
//! All operations wrap on overflow (two's complement), so results are the
//! same on every platform and build profile.

/// `a + b`, wrapping.
pub fn add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

/// `a - b`, wrapping.
pub fn subtract(a: i32, b: i32) -> i32 {
    a.wrapping_sub(b)
}

/// `a * b`, wrapping.
pub fn multiply(a: i32, b: i32) -> i32 {
    a.wrapping_mul(b)
}

/// `a / b` truncated toward zero. `i32::MIN / -1` wraps to `i32::MIN`.
///
/// # Panics
///
/// Panics if `b` is zero; callers check the divisor first.
pub fn divide(a: i32, b: i32) -> i32 {
    a.wrapping_div(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDGES: [i32; 5] = [i32::MIN, -1, 0, 1, i32::MAX];

    #[test]
    fn matches_wide_arithmetic_mod_2_32() {
        for a in EDGES {
            for b in EDGES {
                let (wa, wb) = (i64::from(a), i64::from(b));
                assert_eq!(add(a, b), (wa + wb) as i32);
                assert_eq!(subtract(a, b), (wa - wb) as i32);
                assert_eq!(multiply(a, b), (wa * wb) as i32);
                if b != 0 {
                    assert_eq!(divide(a, b), (wa / wb) as i32);
                }
            }
        }
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(divide(7, 2), 3);
        assert_eq!(divide(-7, 2), -3);
        assert_eq!(divide(7, -2), -3);
        assert_eq!(divide(i32::MIN, -1), i32::MIN);
    }

    #[test]
    #[should_panic]
    fn division_by_zero_panics() {
        divide(1, 0);
    }
}
