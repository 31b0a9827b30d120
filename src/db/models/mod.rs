#![allow(unused_imports)]

//! Database models split into separate files.
//! This module re-exports individual model modules so existing imports like
//! `use crate::db::models::*;` continue to work.

pub mod appointment;
pub mod price;
pub mod time_range_settings;
pub mod user;

// Re-export all types at the `crate::db::models` namespace.
pub use self::appointment::*;
pub use self::price::*;
pub use self::time_range_settings::*;
pub use self::user::*;
