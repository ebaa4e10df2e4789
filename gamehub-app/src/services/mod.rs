pub mod dispatch;
pub mod password;
