// Public API
pub use moves::{Move, ParseMoveError};
pub use outcome::{resolve, Outcome};

// Internal modules
mod moves;
mod outcome;
