mod entry;
mod value;

pub use entry::*;
pub use value::*;
