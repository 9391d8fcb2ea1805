// Background runner for the guesser.
//
// The scan works on its own copy of the buffer and reports once, with the
// full list, over a channel. Only one scan may be outstanding.

use std::sync::mpsc;
use std::thread;

use super::{CandidateMapping, GuessError, GuessRequest, guess};

#[derive(Debug, Default)]
pub struct GuessWorker {
    rx: Option<mpsc::Receiver<Vec<CandidateMapping>>>,
}

impl GuessWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a scan has been started and its result not yet collected.
    pub fn is_running(&self) -> bool {
        self.rx.is_some()
    }

    /// Start a scan over `data`. Fails with `Busy` if one is outstanding;
    /// request validation errors are reported before any thread is spawned.
    pub fn start(&mut self, data: Vec<u8>, request: &GuessRequest) -> Result<(), GuessError> {
        if self.is_running() {
            log::warn!("guess rejected: a scan is already running");
            return Err(GuessError::Busy);
        }
        let phrases = request.compile()?;
        let range = request.range.clone();

        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);
        thread::spawn(move || {
            let results = guess(&data, &phrases, range);
            let _ = tx.send(results);
        });
        Ok(())
    }

    /// Non-blocking check for the result.
    ///
    /// A worker that died without reporting counts as an empty result so the
    /// worker becomes idle again.
    pub fn poll(&mut self) -> Option<Vec<CandidateMapping>> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(results) => {
                self.rx = None;
                Some(results)
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                log::error!("guess worker exited without a result");
                self.rx = None;
                Some(Vec::new())
            }
            Err(mpsc::TryRecvError::Empty) => None,
        }
    }

    /// Block until the outstanding scan reports. `None` when idle.
    pub fn wait(&mut self) -> Option<Vec<CandidateMapping>> {
        let rx = self.rx.take()?;
        Some(rx.recv().unwrap_or_else(|_| {
            log::error!("guess worker exited without a result");
            Vec::new()
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
