use crate::bot::bus::{EventBus, ListenerId};
use crate::bot::event::{Event, EventKind};

/// A unit of bot behavior that can be switched on and off.
pub trait Module {
	fn name(&self) -> &str;

	fn on_enable(&mut self, bus: &mut EventBus);

	fn on_disable(&mut self, bus: &mut EventBus);
}

/// The chat bot module.
///
/// It listens to `MessageCreate` events. What it should answer is not
/// decided yet, so the listener only logs what it receives.
#[derive(Debug, Default)]
pub struct ChatBot {
	listener: Option<ListenerId>,
}

impl ChatBot {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_enabled(&self) -> bool {
		self.listener.is_some()
	}
}

impl Module for ChatBot {
	fn name(&self) -> &str {
		"DBMChatBot"
	}

	fn on_enable(&mut self, bus: &mut EventBus) {
		if self.listener.is_some() {
			return;
		}
		let id = bus.register(
			EventKind::MessageCreate,
			Box::new(|event: &Event| {
				if let Event::MessageCreate { author, channel, content } = event {
					log::debug!("[{channel}] {author}: {content}");
				}
			}),
		);
		self.listener = Some(id);
		log::info!("{} enabled", self.name());
	}

	fn on_disable(&mut self, bus: &mut EventBus) {
		if let Some(id) = self.listener.take() {
			bus.unregister(id);
			log::info!("{} disabled", self.name());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn message() -> Event {
		Event::MessageCreate {
			author: "alice".into(),
			channel: "general".into(),
			content: "hi".into(),
		}
	}

	#[test]
	fn enable_and_disable_toggle_the_listener() {
		let mut bus = EventBus::new();
		let mut bot = ChatBot::new();

		bot.on_enable(&mut bus);
		bot.on_enable(&mut bus);
		assert!(bot.is_enabled());
		assert_eq!(bus.dispatch(&message()), 1);

		bot.on_disable(&mut bus);
		assert!(!bot.is_enabled());
		assert_eq!(bus.dispatch(&message()), 0);
	}
}
