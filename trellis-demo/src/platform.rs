use std::time::Duration;

use futures_util::{FutureExt, future::BoxFuture};
use tracing::info;
use trellis_shell::{PlatformError, PlatformNavigator, Transition, TransitionKind};

/// Pretends to animate native transitions and logs them.
pub struct LoggingPlatform {
    pub animation: Duration,
}

impl PlatformNavigator for LoggingPlatform {
    fn transition(&self, transition: Transition) -> BoxFuture<'static, Result<(), PlatformError>> {
        let delay = if transition.animated {
            self.animation
        } else {
            Duration::ZERO
        };
        async move {
            match &transition.kind {
                TransitionKind::Push(page) | TransitionKind::PushModal(page) => {
                    info!(page = %page.id(), source = ?transition.source, "native push");
                }
                TransitionKind::Pop(page) | TransitionKind::PopModal(page) => {
                    info!(page = %page.id(), source = ?transition.source, "native pop");
                }
                TransitionKind::PopToRoot(pages) => {
                    info!(count = pages.len(), "native pop to root");
                }
                TransitionKind::Insert { page, before } => {
                    info!(page = %page.id(), %before, "native insert");
                }
                TransitionKind::Remove(page) => info!(page = %page.id(), "native remove"),
                TransitionKind::Route { main, modal } => {
                    info!(main = main.len(), modal = modal.len(), "native route");
                }
            }
            tokio::time::sleep(delay).await;
            Ok(())
        }
        .boxed()
    }
}
