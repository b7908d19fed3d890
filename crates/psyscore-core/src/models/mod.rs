pub mod application;
pub mod demographics;
pub mod response;
