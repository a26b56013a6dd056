//! Stack growth guard.
//!
//! Pathological inputs can nest blocks and expressions arbitrarily deep.
//! Recursive descent over them must not crash with a stack overflow, so
//! recursion points wrap themselves in [`ensure_sufficient_stack`], which
//! grows the stack on demand instead of running off the end of it.

/// Remaining-stack threshold below which we grow.
const RED_ZONE: usize = 100 * 1024;

/// How much to grow by each time.
const STACK_GROWTH: usize = 1024 * 1024;

/// Run `f`, growing the stack first when the red zone is reached.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_GROWTH, f)
}

/// WASM manages its own stack; call through.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_recursion_past_default_stack_depth() {
        fn count_down(n: u32) -> u32 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { count_down(n - 1) + 1 })
        }
        assert_eq!(count_down(200_000), 200_000);
    }
}
