pub mod announcements;
pub mod error;
pub mod health;
pub mod wallboard;
pub mod webhooks;
