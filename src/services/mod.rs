pub mod auth;
pub mod email;
pub mod init;
pub mod scheduler;
