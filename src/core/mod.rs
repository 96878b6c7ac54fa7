pub mod balance;
pub mod constants;
pub mod error;
pub mod types;
pub mod wallet_management;

pub use balance::*;
pub use constants::*;
pub use error::*;
pub use types::*;
pub use wallet_management::*;
