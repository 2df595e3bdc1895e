pub mod csv_codec;
pub mod import;
pub mod labels;
pub mod search;

pub use csv_codec::*;
pub use import::*;
pub use labels::*;
pub use search::*;
