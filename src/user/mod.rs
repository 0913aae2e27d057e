// Public API
pub use directory::{InMemoryPlayerDirectory, PlayerDirectory};

// Internal modules
mod directory;
