pub mod checkins;
pub mod sessions;
pub mod tokens;
