use std::collections::HashMap;

use crate::bot::event::{Event, EventKind};

/// Handle returned by [`EventBus::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Something that reacts to events of one kind.
///
/// Any `FnMut(&Event)` closure is a listener.
pub trait EventListener: Send {
	fn on(&mut self, event: &Event);
}

impl<F: FnMut(&Event) + Send> EventListener for F {
	fn on(&mut self, event: &Event) {
		self(event)
	}
}

/// Dispatch map from event kind to the listeners registered for it.
///
/// Listeners of one kind run in registration order.
#[derive(Default)]
pub struct EventBus {
	listeners: HashMap<EventKind, Vec<(ListenerId, Box<dyn EventListener>)>>,
	next_id: u64,
}

impl EventBus {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, kind: EventKind, listener: Box<dyn EventListener>) -> ListenerId {
		let id = ListenerId(self.next_id);
		self.next_id += 1;
		self.listeners.entry(kind).or_default().push((id, listener));
		log::debug!("Registered listener {id:?} for {kind:?}");
		id
	}

	/// Removes a listener; returns `false` when `id` is not registered.
	pub fn unregister(&mut self, id: ListenerId) -> bool {
		for listeners in self.listeners.values_mut() {
			if let Some(position) = listeners.iter().position(|(l, _)| *l == id) {
				listeners.remove(position);
				return true;
			}
		}
		false
	}

	/// Calls every listener registered for the event's kind and returns how
	/// many ran.
	pub fn dispatch(&mut self, event: &Event) -> usize {
		match self.listeners.get_mut(&event.kind()) {
			Some(listeners) => {
				for (_, listener) in listeners.iter_mut() {
					listener.on(event);
				}
				listeners.len()
			}
			None => 0,
		}
	}

	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.listeners.get(&kind).map_or(0, Vec::len)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{Arc, Mutex};

	use super::*;

	#[test]
	fn listeners_run_in_registration_order() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let mut bus = EventBus::new();
		for name in ["first", "second"] {
			let seen = Arc::clone(&seen);
			bus.register(
				EventKind::Ready,
				Box::new(move |_: &Event| seen.lock().unwrap().push(name)),
			);
		}

		assert_eq!(bus.dispatch(&Event::Ready), 2);
		assert_eq!(bus.dispatch(&Event::Disconnect), 0);
		assert_eq!(*seen.lock().unwrap(), ["first", "second"]);
	}

	#[test]
	fn unregistered_listener_no_longer_runs() {
		let mut bus = EventBus::new();
		let id = bus.register(EventKind::Disconnect, Box::new(|_: &Event| {}));
		assert_eq!(bus.listener_count(EventKind::Disconnect), 1);

		assert!(bus.unregister(id));
		assert!(!bus.unregister(id));
		assert_eq!(bus.dispatch(&Event::Disconnect), 0);
	}
}
