pub mod store;

pub use store::{Profile, ProfileStore};
