#![allow(dead_code)]

use std::cell::Cell;

#[cfg(feature = "integration-tests")]
use vitrine::viewer::{FlowConstructor, ViewerFlow, run};

/// Frame counter usable from `&self` hooks.
pub(crate) struct FrameCounter(Cell<u32>);

impl Default for FrameCounter {
    fn default() -> Self {
        Self(Cell::new(0))
    }
}

impl FrameCounter {
    pub(crate) fn frame(&self) -> u32 {
        self.0.get()
    }

    pub(crate) fn progress(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Spin up the full viewer event loop around a single test flow.
///
/// The flow is expected to exit the loop by returning
/// `ImageTestResult::Passed` from its render capture hook.
#[cfg(feature = "integration-tests")]
pub(crate) fn run_flow<F>(make: F)
where
    F: FnOnce() -> Box<dyn ViewerFlow> + 'static,
{
    let constructor: FlowConstructor = Box::new(move |_| Box::pin(async move { make() }));
    run(vec![constructor]).expect("Failed to run flow for integration test.");
}
