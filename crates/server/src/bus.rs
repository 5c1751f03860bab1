use shared::protocol::Command;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out delivery of commands to every open event-stream connection.
///
/// Each subscriber owns an independent queue fed by every publish, so all
/// attached listeners receive every command in publish order, and a listener
/// that attaches later sees no backlog. Dropping the receiver releases the
/// registration.
#[derive(Clone)]
pub struct CommandBus {
    sender: broadcast::Sender<Command>,
}

impl CommandBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Never blocks; a publish with no listeners attached is dropped.
    pub fn publish(&self, command: Command) {
        let _ = self.sender.send(command);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Command> {
        self.sender.subscribe()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_listener_receives_every_command_in_order() {
        let bus = CommandBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let c1 = Command::error("one");
        let c2 = Command::error("two");
        bus.publish(c1.clone());
        bus.publish(c2.clone());

        assert_eq!(first.recv().await.expect("recv"), c1);
        assert_eq!(first.recv().await.expect("recv"), c2);
        assert_eq!(second.recv().await.expect("recv"), c1);
        assert_eq!(second.recv().await.expect("recv"), c2);
    }

    #[tokio::test]
    async fn late_subscriber_sees_no_backlog() {
        let bus = CommandBus::new();
        let mut early = bus.subscribe();
        bus.publish(Command::error("before"));

        let mut late = bus.subscribe();
        bus.publish(Command::error("after"));

        assert_eq!(early.recv().await.expect("recv"), Command::error("before"));
        assert_eq!(early.recv().await.expect("recv"), Command::error("after"));
        assert_eq!(late.recv().await.expect("recv"), Command::error("after"));
        assert!(matches!(
            late.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn publish_without_listeners_is_a_no_op() {
        let bus = CommandBus::new();
        bus.publish(Command::error("nobody listening"));
    }
}
