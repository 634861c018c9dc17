mod registry;
mod room_event;

pub use registry::RoomRegistry;
pub use room_event::RoomEvent;
