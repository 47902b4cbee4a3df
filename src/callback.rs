use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{debug, error};
use crate::control_message::ControlMessage;

/// Application code's handler for control messages from the VHAL. It is called on one of the
///  sink's background threads (never the thread driving the sink's IO), and the reader waits for
///  it to return before it reads the next message. It may send packets through the sink.
pub type CameraCallback = Arc<dyn Fn(ControlMessage) + Send + Sync>;

/// Holds the currently registered [CameraCallback]. Registration replaces the previous callback,
///  and it is synchronized with dispatch so it is safe to register while messages are arriving.
#[derive(Default)]
pub struct CallbackSlot {
    callback: RwLock<Option<CameraCallback>>,
}

impl CallbackSlot {
    pub fn register(&self, callback: CameraCallback) {
        let mut slot = self.callback.write()
            .unwrap_or_else(|e| e.into_inner());
        if slot.replace(callback).is_some() {
            debug!("replacing previously registered camera callback");
        }
    }

    pub fn is_registered(&self) -> bool {
        self.callback.read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Returns `true` if a callback was registered and returned regularly. A panicking callback is
    ///  contained here and logged.
    pub fn dispatch(&self, msg: ControlMessage) -> bool {
        // clone so that the callback can register a replacement without deadlocking
        let callback = self.callback.read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let Some(callback) = callback else {
            debug!(?msg, "no camera callback registered - dropping control message");
            return false;
        };

        match catch_unwind(AssertUnwindSafe(|| callback(msg))) {
            Ok(()) => true,
            Err(panic) => {
                let cause = panic.downcast_ref::<&str>().map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown cause".to_string());
                error!(?msg, "camera callback panicked: {}", cause);
                false
            }
        }
    }
}
