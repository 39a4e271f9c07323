pub mod bank_account;
pub mod category;
pub mod event;
pub mod event_user;
pub mod item;
pub mod tenant;
pub mod token;
pub mod user;

pub use bank_account::*;
pub use category::*;
pub use event::*;
pub use event_user::*;
pub use item::*;
pub use tenant::*;
pub use token::*;
pub use user::*;
