pub mod account;
pub mod cv;
pub mod letter;
