use std::sync::OnceLock;

use tokio::runtime::{Handle, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Handle of the ambient runtime, or of a lazily started fallback runtime
/// when called from outside any tokio context (platform UI threads).
pub(crate) fn handle() -> Handle {
    Handle::try_current().unwrap_or_else(|_| {
        RUNTIME
            .get_or_init(|| {
                tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(1)
                    .thread_name("trellis-shell")
                    .enable_all()
                    .build()
                    .expect("failed to start the fallback tokio runtime")
            })
            .handle()
            .clone()
    })
}
