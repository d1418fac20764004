use std::time::Duration;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::trace;

/// Quiet period before an edited amount is acted on.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Publishes the latest input only once it stopped changing for `delay`.
///
/// Every [`Debouncer::set`] restarts the delay. Intermediate values are never
/// published. The background task stops when the debouncer is dropped.
#[derive(Debug)]
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    output: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawns the debounce task on the current runtime.
    pub fn new(delay: Duration) -> Self {
        let (input, rx) = mpsc::unbounded_channel();
        let (tx, output) = watch::channel(None);
        let task = tokio::spawn(run(delay, rx, tx));
        Self {
            input,
            output,
            task,
        }
    }

    pub fn set(&self, value: T) {
        // only fails once the task is gone, at which point nobody listens
        let _ = self.input.send(value);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.output.clone()
    }

    /// The last settled value.
    pub fn current(&self) -> Option<T> {
        self.output.borrow().clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T>(
    delay: Duration,
    mut input: mpsc::UnboundedReceiver<T>,
    output: watch::Sender<Option<T>>,
) {
    let mut pending = None;
    let sleep = time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            value = input.recv() => match value {
                Some(value) => {
                    pending = Some(value);
                    sleep.as_mut().reset(Instant::now() + delay);
                }
                None => break,
            },
            () = &mut sleep, if pending.is_some() => {
                trace!(?delay, "input settled");
                output.send_replace(pending.take());
            }
        }
    }
}
