pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_filter_chips, draw_footer};
pub use header::draw_header;
pub use utils::{status_color, truncate};
