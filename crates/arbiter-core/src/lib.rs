pub mod account;
pub mod challenge;
pub mod constants;
pub mod error;
pub mod event;
pub mod feed;
pub mod market;
pub mod request;
pub mod types;

pub use account::*;
pub use challenge::*;
pub use constants::*;
pub use error::ArbiterError;
pub use event::*;
pub use feed::*;
pub use market::*;
pub use request::*;
pub use types::*;
