pub mod draft;
pub mod health;
