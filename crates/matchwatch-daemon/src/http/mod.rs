pub mod health;
pub mod watches;
