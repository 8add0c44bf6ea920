pub mod enums;
pub mod models;
pub mod pagination;

pub use enums::*;
pub use models::*;
pub use pagination::*;
