pub mod generate_key;
pub mod issue;
pub mod key_info;
