pub mod channel;
pub mod events;
pub mod ws_listener;

pub use channel::{ChannelConnector, ChannelError, LiveChannel};
pub use events::{parse_frame, FrameError, LiveEvent, StateChange};
pub use ws_listener::{WsChannel, WsConnector};
