pub mod admission;
pub mod bans;
pub mod keys;

pub use admission::Admission;
pub use bans::Bans;
pub use keys::Keys;
