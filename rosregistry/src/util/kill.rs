use crossbeam::channel;

/// Shutdown signal for a server's poll loop.
///
/// The channel is unbounded so that signalling never blocks the sender,
/// no matter whether the poll loop is between polls or mid-request.
#[derive(Clone, Debug)]
pub struct Sender {
    kill_tx: channel::Sender<()>,
}

impl Sender {
    pub fn send(&self) -> Result<(), channel::SendError<()>> {
        self.kill_tx.send(())
    }
}

#[derive(Debug)]
pub struct Receiver {
    kill_rx: channel::Receiver<()>,
}

impl Receiver {
    pub fn try_recv(&self) -> Result<(), channel::TryRecvError> {
        self.kill_rx.try_recv()
    }
}

pub fn channel() -> (Sender, Receiver) {
    let (kill_tx, kill_rx) = channel::unbounded();
    (Sender { kill_tx }, Receiver { kill_rx })
}
