pub mod types;
pub mod resolved;
pub mod settings;
pub mod validator;

pub use types::*;
pub use resolved::*;
pub use settings::*;
pub use validator::*;
