pub mod prelude;

pub mod song;
pub mod user;
