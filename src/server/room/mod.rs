pub mod registry;
pub mod room;
pub mod session;
pub mod messages;

pub use room::Room;
