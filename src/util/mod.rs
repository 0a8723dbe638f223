pub mod abi;
pub mod conv;
pub mod serialize;
