pub mod auth;
pub mod bank_account;
pub mod category;
pub mod event;
pub mod event_user;
pub mod item;
pub mod token;
pub mod user;
