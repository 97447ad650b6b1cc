pub mod error;
pub mod messages;
pub mod models;
pub mod module;
pub mod resources;

pub use error::*;
pub use messages::*;
pub use models::*;
pub use module::*;
pub use resources::*;
