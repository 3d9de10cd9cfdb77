use std::sync::OnceLock;

use crossbeam_channel::{Receiver, bounded, never};

static SHUTDOWN: OnceLock<Receiver<()>> = OnceLock::new();

/// Returns a receiver that gets a message when the user presses Ctrl-C.
///
/// The handler is installed on first use. A second Ctrl-C while the first is
/// still being handled exits the process immediately. If no handler can be
/// installed the receiver never fires.
pub fn shutdown_receiver() -> Receiver<()> {
    SHUTDOWN
        .get_or_init(|| {
            let (tx, rx) = bounded(1);
            let installed = ctrlc::set_handler(move || {
                if tx.try_send(()).is_err() {
                    std::process::exit(130);
                }
            });

            match installed {
                Ok(()) => rx,
                Err(err) => {
                    tracing::warn!("Failed to install the Ctrl-C handler: {err}");
                    never()
                }
            }
        })
        .clone()
}
