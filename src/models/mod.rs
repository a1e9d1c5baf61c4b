// Re-export all model types
pub use self::enums::*;
pub use self::envelope::*;
pub use self::errors::*;
pub use self::guest::*;
pub use self::room::*;

mod enums;
mod envelope;
mod errors;
mod guest;
mod room;
