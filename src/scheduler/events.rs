//! Lifecycle observer lists.
//!
//! Observers are coarse telemetry taps: every registered observer fires for
//! every matching transition of every command, in registration order. They are
//! not filtered by command identity.

use crate::command::Command;
use crate::id::CommandId;

/// Observer invoked with the affected command on a lifecycle transition.
pub type CommandObserver = Box<dyn FnMut(CommandId, &dyn Command)>;

/// Which lifecycle transition an observer list is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandEvent {
    Initialized,
    Executed,
    Interrupted,
    Finished,
}

/// Ordered observer lists, one per lifecycle transition.
#[derive(Default)]
pub(crate) struct ObserverSet {
    on_initialize: Vec<CommandObserver>,
    on_execute: Vec<CommandObserver>,
    on_interrupt: Vec<CommandObserver>,
    on_finish: Vec<CommandObserver>,
}

impl ObserverSet {
    pub(crate) fn push(&mut self, event: CommandEvent, observer: CommandObserver) {
        self.list_mut(event).push(observer);
    }

    pub(crate) fn notify(&mut self, event: CommandEvent, id: CommandId, command: &dyn Command) {
        for observer in self.list_mut(event) {
            observer(id, command);
        }
    }

    fn list_mut(&mut self, event: CommandEvent) -> &mut Vec<CommandObserver> {
        match event {
            CommandEvent::Initialized => &mut self.on_initialize,
            CommandEvent::Executed => &mut self.on_execute,
            CommandEvent::Interrupted => &mut self.on_interrupt,
            CommandEvent::Finished => &mut self.on_finish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Stub;

    impl Command for Stub {
        fn name(&self) -> &str {
            "stub"
        }
    }

    #[test]
    fn test_observers_fire_in_registration_order() {
        let mut set = ObserverSet::default();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            set.push(
                CommandEvent::Initialized,
                Box::new(move |_, _| order.borrow_mut().push(tag)),
            );
        }

        set.notify(CommandEvent::Initialized, CommandId::new(0), &Stub);
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_observers_scoped_to_event() {
        let mut set = ObserverSet::default();
        let count = Rc::new(RefCell::new(0));

        let c = count.clone();
        set.push(CommandEvent::Finished, Box::new(move |_, _| *c.borrow_mut() += 1));

        set.notify(CommandEvent::Initialized, CommandId::new(0), &Stub);
        set.notify(CommandEvent::Interrupted, CommandId::new(0), &Stub);
        assert_eq!(*count.borrow(), 0);

        set.notify(CommandEvent::Finished, CommandId::new(0), &Stub);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_observer_sees_command_name() {
        let mut set = ObserverSet::default();
        let seen = Rc::new(RefCell::new(String::new()));

        let s = seen.clone();
        set.push(
            CommandEvent::Executed,
            Box::new(move |_, cmd| *s.borrow_mut() = cmd.name().to_string()),
        );

        set.notify(CommandEvent::Executed, CommandId::new(9), &Stub);
        assert_eq!(*seen.borrow(), "stub");
    }
}
