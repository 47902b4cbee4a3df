use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A unique, not yet existing path for a Unix domain socket
pub fn temp_socket_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "vhal-{}-{}-{}.sock",
        name,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed),
    ));
    std::fs::remove_file(&path).ok();
    path
}
