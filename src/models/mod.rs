pub mod analyze;
pub mod chat;
pub mod company;
pub mod lenient;
pub mod moves;
pub mod session;
pub mod stream;
