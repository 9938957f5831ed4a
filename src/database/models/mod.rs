pub mod goal;
pub mod outcome;
pub mod record;

pub use goal::Goal;
pub use outcome::{NewOutcome, Outcome};
pub use record::{NewRecord, Record};
