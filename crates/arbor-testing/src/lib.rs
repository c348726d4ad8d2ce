//! Headless harness for reconciling virtual trees against a
//! [`MemorySurface`](arbor_core::MemorySurface): a test rule that keeps one
//! tree rendered, a message recorder, a surface that counts the nodes a patch
//! touches, and tree fixtures for benches and tests.

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::{
        assert_confluent, render_to_string, run_test_reconcile, Recorder, ReconcileTestRule,
    };
}
