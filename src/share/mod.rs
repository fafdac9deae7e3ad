// src/share/mod.rs
pub mod caption;
pub mod dispatch;
pub mod email;
pub mod link;
pub mod refcode;
pub mod webhook;
