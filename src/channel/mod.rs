// Push channel lifecycle: one WebSocket session per channel name

mod manager;
mod session;

pub use manager::{
    channel_url, is_valid_channel_name, ChannelEvent, ChannelEventKind, ChannelManager,
};
pub use session::{Session, SessionId, SessionStatus};

#[cfg(test)]
mod tests;
