pub mod debounce;
pub mod text;

pub use debounce::Debouncer;
pub use text::{SyncStatus, TextChannel, TextView};
