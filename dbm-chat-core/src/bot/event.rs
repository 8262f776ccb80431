/// Events a chat connection delivers to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	/// The connection is established and the bot can talk.
	Ready,
	/// A message was posted in a channel the bot can see.
	MessageCreate {
		author: String,
		channel: String,
		content: String,
	},
	Disconnect,
}

/// Key listeners are registered against; one per `Event` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
	Ready,
	MessageCreate,
	Disconnect,
}

impl Event {
	pub fn kind(&self) -> EventKind {
		match self {
			Event::Ready => EventKind::Ready,
			Event::MessageCreate { .. } => EventKind::MessageCreate,
			Event::Disconnect => EventKind::Disconnect,
		}
	}
}
