//! Nested wall-clock timers for the phases of analysis and solve calls.

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        use web_time::Instant;
    } else {
        use std::time::Instant;
    }
}

mod timers;
pub(crate) use timers::*;
