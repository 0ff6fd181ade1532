mod platform;
mod text;

use std::{error::Error, sync::Arc, time::Duration};

use tracing::info;
use trellis_property::LINE_HEIGHT;
use trellis_shell::{Page, PresentationMode, RouteTable, Shell};

use crate::{platform::LoggingPlatform, text::Label};

/// Debug builds only: reports parking_lot deadlocks between the shell's
/// state lock and the property stores through tracing.
fn spawn_deadlock_watchdog() {
    #[cfg(debug_assertions)]
    {
        use std::thread;

        const INTERVAL: Duration = Duration::from_secs(10);

        let spawned = thread::Builder::new()
            .name("deadlock-watchdog".to_owned())
            .spawn(|| {
                loop {
                    thread::sleep(INTERVAL);
                    for (cycle, threads) in parking_lot::deadlock::check_deadlock()
                        .iter()
                        .enumerate()
                    {
                        for thread in threads {
                            tracing::error!(
                                cycle,
                                thread_id = ?thread.thread_id(),
                                backtrace = ?thread.backtrace(),
                                "deadlock detected"
                            );
                        }
                    }
                }
            });
        if let Err(err) = spawned {
            tracing::warn!(%err, "deadlock watchdog not started");
        }
    }
}

fn init_tracing() {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match tracing_subscriber::EnvFilter::try_new(
            "error,trellis_shell=debug,trellis_demo=info",
        ) {
            Ok(filter) => filter,
            Err(_) => tracing_subscriber::EnvFilter::new("error"),
        },
    };

    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .try_init();
}

fn routes() -> Result<RouteTable, Box<dyn Error>> {
    let routes = RouteTable::new()
        .with_route("message", || Page::with_route("message").titled("Message"))?
        .with_route("compose", || {
            Page::with_route("compose")
                .titled("Compose")
                .presented(PresentationMode::ModalAnimated)
        })?
        .with_route("locked", || Page::with_route("locked").titled("Locked"))?;
    Ok(routes)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    spawn_deadlock_watchdog();

    let label = Label::default();
    LINE_HEIGHT.set(&label, 1.25)?;
    info!(line_height = LINE_HEIGHT.get(&label), "label ready");

    let shell = Shell::builder(Page::with_route("inbox").titled("Inbox"))
        .routes(routes()?)
        .platform(Arc::new(LoggingPlatform {
            animation: Duration::from_millis(20),
        }))
        .build();

    let _navigated = shell.on_navigated(|args| {
        info!(from = %args.previous(), to = %args.current(), source = ?args.source(), "navigated");
    });
    let _guard = shell.on_navigating(|args| {
        if args.target().location().ends_with("/locked") {
            info!(to = %args.target(), "blocking navigation");
            args.cancel();
        }
    });

    shell.go_to("message", true).await?;
    info!(back = ?shell.back_button_text(), "back button");

    shell.go_to("compose", true).await?;
    let compose = shell.current_page();
    info!(modal_depth = shell.modal_stack().len(), "compose presented");

    // The user swipes the sheet away.
    let bridge = shell.platform_bridge();
    bridge.did_dismiss(&compose);
    info!(modal_depth = shell.modal_stack().len(), "compose dismissed");

    let outcome = shell.go_to("locked", true).await?;
    info!(?outcome, "locked route");

    let outcome = bridge.send_pop().await?;
    info!(?outcome, location = %shell.current_state(), "back button pressed");

    Ok(())
}
