pub mod account;
pub mod eth;
pub mod sync;
pub mod token;
pub mod transaction;
