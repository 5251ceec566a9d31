mod error;
mod sequence;
mod util;

pub use error::{Error, Result};
pub use sequence::{hamming, random_sequence, substitute_base, BASES, UP_PRIMER};
pub use util::handle_error_and_exit;
