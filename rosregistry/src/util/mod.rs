pub mod kill;

pub static FAILED_TO_LOCK: &str = "Failed to acquire lock";
pub static MPSC_CHANNEL_UNEXPECTEDLY_CLOSED: &str =
    "MPSC channel unexpectedly closed on one end";
