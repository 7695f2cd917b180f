/// Everything the monitor reacts to.
///
/// Produced by a [`ChatSession`](crate::session::ChatSession) from protocol traffic, or by
/// the supervisor for [`MonitorEvent::Disconnected`] and [`MonitorEvent::Shutdown`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Registration finished. `nickname` is the nick the server confirmed.
    Welcome { nickname: String },
    /// The nickname we asked for is taken.
    NicknameInUse,
    /// Someone joined a channel.
    Joined { nickname: String, channel: String },
    /// The topic sent right after joining.
    InitialTopic { channel: String, topic: String },
    /// Someone set the topic.
    TopicChanged {
        channel: String,
        topic: String,
        changed_by: Option<String>,
    },
    /// Someone was kicked from a channel.
    Kicked {
        channel: String,
        nickname: String,
        kicked_by: Option<String>,
    },
    /// The connection is gone.
    Disconnected,
    /// The server reported an error.
    ProtocolError(String),
    /// Stop was requested.
    Shutdown,
}
