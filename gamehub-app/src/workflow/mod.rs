pub mod account;
pub mod email;
pub mod image;
pub mod r#match;
pub mod notification;
pub mod order;
pub mod reward;
pub mod team;
pub mod tournament;
pub mod transaction;
pub mod user;
