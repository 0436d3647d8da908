mod filter_input;
mod key_result;
mod slow_notice;

pub use filter_input::{FilterEvent, FilterInput};
pub use key_result::KeyResult;
pub use slow_notice::draw_slow_notice;
