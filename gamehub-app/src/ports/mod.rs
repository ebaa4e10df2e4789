pub mod email;
pub mod image_storage;
pub mod realtime;
pub mod token;
