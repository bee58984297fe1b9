mod id;
mod time;

pub use id::shortid;
pub use time::{parse_hhmm, time_millis};
