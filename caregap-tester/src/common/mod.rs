pub mod scenario;
pub mod util;

pub use util::{report_stamp, split_csv};
