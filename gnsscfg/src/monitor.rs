//! Capture of the receiver's reply stream.
//!
//! [`RxCallback::on_data_available`] plays the part of the UART receive
//! interrupt: it drains at most one buffer from the receive half of the port
//! and hands the bytes to a bounded channel without ever blocking. The
//! [`RxLog`] end is consumed by a separate thread that does the printing.
//!
//! The receive side owns its own buffer and port handle; nothing is shared
//! with the transmit path.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{debug, info, warn};

use crate::constants::{RX_BUFFER_MAX, RX_BUFFER_MIN};

const CHUNK_SEPARATOR: &str = "-------------";

/// The receive half of a serial port
pub trait SerialSource {
    /// Source associated error type
    type Error;

    /// Read what is available into `buf`, returning the number of bytes.
    /// Returns 0 when nothing arrived before the source's read deadline;
    /// must not wait indefinitely.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl<T: SerialSource + ?Sized> SerialSource for &mut T {
    type Error = T::Error;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read_available(buf)
    }
}

/// Builds the two ends of the receive path
pub struct ReceiveMonitor;

impl ReceiveMonitor {
    /// `capacity` is the number of chunks the channel holds, `buffer_len`
    /// the size of one read (clamped to 255..=1024 bytes).
    #[allow(clippy::new_ret_no_self)]
    pub fn new(capacity: usize, buffer_len: usize) -> (RxCallback, RxLog) {
        let (tx, rx) = bounded(capacity.max(1));
        let buffer_len = buffer_len.clamp(RX_BUFFER_MIN, RX_BUFFER_MAX);
        (
            RxCallback {
                tx,
                buf: vec![0; buffer_len],
                received: 0,
                dropped: 0,
            },
            RxLog { rx },
        )
    }
}

/// Producer end, called whenever the port has bytes
pub struct RxCallback {
    tx: Sender<Vec<u8>>,
    buf: Vec<u8>,
    received: usize,
    dropped: usize,
}

impl RxCallback {
    /// Drain one buffer from `source` and queue it for logging. A full queue
    /// drops the chunk instead of waiting. Returns the number of bytes read.
    pub fn on_data_available<S: SerialSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<usize, S::Error> {
        let nbytes = source.read_available(&mut self.buf)?;
        if nbytes == 0 {
            return Ok(0);
        }
        self.received += nbytes;

        match self.tx.try_send(self.buf[..nbytes].to_vec()) {
            Ok(()) => {},
            Err(TrySendError::Full(chunk)) => {
                self.dropped += 1;
                warn!("receive log is full, dropping {} bytes", chunk.len());
            },
            Err(TrySendError::Disconnected(chunk)) => {
                self.dropped += 1;
                debug!("receive log closed, dropping {} bytes", chunk.len());
            },
        }
        Ok(nbytes)
    }

    pub fn buffer_len(&self) -> usize {
        self.buf.len()
    }

    /// Total bytes read from the port
    pub fn received(&self) -> usize {
        self.received
    }

    /// Chunks that did not fit in the queue
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Counters of a finished receive loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxStats {
    pub received: usize,
    pub dropped: usize,
}

/// Poll `source` on a dedicated thread until `stop` is set
pub fn spawn_receiver<S>(
    mut callback: RxCallback,
    mut source: S,
    stop: Arc<AtomicBool>,
) -> JoinHandle<Result<RxStats, S::Error>>
where
    S: SerialSource + Send + 'static,
    S::Error: Send + 'static,
{
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            callback.on_data_available(&mut source)?;
        }
        Ok(RxStats {
            received: callback.received(),
            dropped: callback.dropped(),
        })
    })
}

/// Consumer end of the receive path
pub struct RxLog {
    rx: Receiver<Vec<u8>>,
}

impl RxLog {
    /// Take every chunk queued so far
    pub fn drain(&self) -> Vec<Vec<u8>> {
        self.rx.try_iter().collect()
    }

    /// Wait up to `timeout` for the next chunk
    pub fn next_chunk(&self, timeout: Duration) -> Option<Vec<u8>> {
        match self.rx.recv_timeout(timeout) {
            Ok(chunk) => Some(chunk),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Log every chunk on its own thread until the producer goes away.
    /// The handle yields the number of chunks logged.
    pub fn spawn_logger(self) -> JoinHandle<usize> {
        thread::spawn(move || {
            let mut count = 0;
            for chunk in self.rx.iter() {
                info!("\n{}\n{}", String::from_utf8_lossy(&chunk), CHUNK_SEPARATOR);
                count += 1;
            }
            count
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Hands out scripted reads
    struct ScriptedSource(VecDeque<Vec<u8>>);

    impl SerialSource for ScriptedSource {
        type Error = ();

        fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            match self.0.pop_front() {
                Some(data) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    Ok(n)
                },
                None => Ok(0),
            }
        }
    }

    #[test]
    fn test_chunks_reach_log() {
        let (mut callback, log) = ReceiveMonitor::new(4, 255);
        let mut source = ScriptedSource(VecDeque::from([b"$GNGGA,1*00\r\n".to_vec(), vec![]]));

        assert_eq!(callback.on_data_available(&mut source), Ok(13));
        assert_eq!(callback.on_data_available(&mut source), Ok(0));
        assert_eq!(log.drain(), [b"$GNGGA,1*00\r\n".to_vec()]);
        assert_eq!(callback.received(), 13);
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let (mut callback, log) = ReceiveMonitor::new(1, 255);
        let mut source = ScriptedSource(VecDeque::from([b"one".to_vec(), b"two".to_vec()]));

        assert_eq!(callback.on_data_available(&mut source), Ok(3));
        assert_eq!(callback.on_data_available(&mut source), Ok(3));
        assert_eq!(callback.dropped(), 1);
        assert_eq!(log.drain(), [b"one".to_vec()]);
    }

    #[test]
    fn test_buffer_len_is_bounded() {
        let (callback, _log) = ReceiveMonitor::new(1, 16);
        assert_eq!(callback.buffer_len(), 255);
        let (callback, _log) = ReceiveMonitor::new(1, 1 << 20);
        assert_eq!(callback.buffer_len(), 1024);
    }

    #[test]
    fn test_read_is_capped_at_buffer_len() {
        let (mut callback, log) = ReceiveMonitor::new(2, 255);
        let mut source = ScriptedSource(VecDeque::from([vec![b'x'; 600]]));
        assert_eq!(callback.on_data_available(&mut source), Ok(255));
        assert_eq!(log.drain()[0].len(), 255);
    }

    #[test]
    fn test_logger_thread_ends_with_producer() {
        let (mut callback, log) = ReceiveMonitor::new(4, 255);
        let handle = log.spawn_logger();
        let mut source = ScriptedSource(VecDeque::from([b"a".to_vec(), b"b".to_vec()]));
        callback.on_data_available(&mut source).unwrap();
        callback.on_data_available(&mut source).unwrap();
        drop(callback);
        assert_eq!(handle.join().unwrap(), 2);
    }

    #[test]
    fn test_receiver_thread_stops_on_flag() {
        let (callback, log) = ReceiveMonitor::new(8, 255);
        let stop = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource(VecDeque::from([b"hello".to_vec()]));
        let handle = spawn_receiver(callback, source, stop.clone());

        assert_eq!(log.next_chunk(Duration::from_secs(5)), Some(b"hello".to_vec()));
        stop.store(true, Ordering::Relaxed);
        let stats = handle.join().unwrap().unwrap();
        assert_eq!(stats, RxStats { received: 5, dropped: 0 });
    }
}
