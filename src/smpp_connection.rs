use bytes::BytesMut;
use core::fmt::{Display, Formatter};
use log::*;
use std::error;
use std::io;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Duration, Instant};

use crate::pdu::{CheckError, CheckOutcome, Pdu, PduParseError};

/// Why reading the next PDU from a connection failed.
#[derive(Debug)]
pub enum ReadError {
    /// The frame boundary could not be established (impossible
    /// command_length).  The stream is desynchronised and must be closed
    /// without a response.
    FatalFrame(CheckError),
    /// The peer closed the stream partway through a frame.
    UnexpectedEof,
    /// One complete frame was consumed from the stream but could not be
    /// decoded.  The connection remains usable.
    MalformedPdu(PduParseError),
}

impl Display for ReadError {
    fn fmt(
        &self,
        formatter: &mut Formatter,
    ) -> std::result::Result<(), std::fmt::Error> {
        match self {
            ReadError::FatalFrame(e) => e.fmt(formatter),
            ReadError::UnexpectedEof => formatter
                .write_str("Connection closed in the middle of a PDU."),
            ReadError::MalformedPdu(e) => e.fmt(formatter),
        }
    }
}

impl error::Error for ReadError {}

struct Reader {
    read_half: OwnedReadHalf,
    buffer: BytesMut,
}

/// One ESME's TCP connection: a framed PDU reader on one side and a
/// serialized PDU writer on the other.  Reading is done by exactly one
/// task (the session's read loop); writes may come from several tasks and
/// are serialized by the writer lock.
pub struct SmppConnection {
    pub id: String,
    reader: Mutex<Reader>,
    writer: Mutex<Option<OwnedWriteHalf>>,
    closed: AtomicBool,
    close_notify: Notify,
    started: Instant,
    last_activity_millis: AtomicU64,
}

impl SmppConnection {
    pub fn new(
        tcp_stream: TcpStream,
        socket_addr: SocketAddr,
    ) -> SmppConnection {
        let (read_half, write_half) = tcp_stream.into_split();
        SmppConnection {
            id: socket_addr.to_string(),
            reader: Mutex::new(Reader {
                read_half,
                buffer: BytesMut::with_capacity(4096),
            }),
            writer: Mutex::new(Some(write_half)),
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
            started: Instant::now(),
            last_activity_millis: AtomicU64::new(0),
        }
    }

    /// Read one PDU, buffering until a complete frame is available.
    /// Returns None on a clean end of stream or once the connection has
    /// been closed locally.
    pub async fn read_pdu(&self) -> Result<Option<Pdu>, ReadError> {
        let mut reader = self.reader.lock().await;
        loop {
            if let Some(pdu) = self.parse_pdu(&mut reader)? {
                self.touch();
                return Ok(Some(pdu));
            }

            let notified = self.close_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.closed.load(Ordering::SeqCst) {
                return Ok(None);
            }

            let Reader { read_half, buffer } = &mut *reader;
            tokio::select! {
                _ = notified => return Ok(None),
                read = read_half.read_buf(buffer) => match read {
                    Ok(0) => {
                        if buffer.is_empty() {
                            return Ok(None);
                        } else {
                            return Err(ReadError::UnexpectedEof);
                        }
                    }
                    Ok(_) => self.touch(),
                    Err(e) => {
                        // Reset, broken pipe and friends all collapse to
                        // "the peer went away"
                        debug!(
                            "Connection {} - read failed: {}",
                            self.id, e
                        );
                        return Ok(None);
                    }
                },
            }
        }
    }

    fn parse_pdu(
        &self,
        reader: &mut Reader,
    ) -> Result<Option<Pdu>, ReadError> {
        let mut buf = Cursor::new(&reader.buffer[..]);
        match Pdu::check(&mut buf) {
            Ok(CheckOutcome::Ready) => {
                // Pdu::check moved us to the end, so position is length.
                // Consume the frame before parsing: even if the body turns
                // out to be malformed, the stream stays synchronised.
                let len = buf.position() as usize;
                let frame = reader.buffer.split_to(len);

                let mut frame = Cursor::new(&frame[..]);
                Pdu::parse(&mut frame)
                    .map(Some)
                    .map_err(ReadError::MalformedPdu)
            }
            // Try again when we have more
            Ok(CheckOutcome::Incomplete) => Ok(None),
            // Failed (e.g. command_length out of range)
            Err(e) => Err(ReadError::FatalFrame(e)),
        }
    }

    /// Write one PDU and flush it to the transport.  At most one write is
    /// in flight per connection.
    pub async fn write_pdu(&self, pdu: &Pdu) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        if let Some(stream) = writer.as_mut() {
            pdu.write(stream).await?;
            stream.flush().await
        } else {
            debug!(
                "Connection {} - attempted write after close",
                self.id
            );
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    /// Time since the last successful read on this connection.
    pub fn idle_time(&self) -> Duration {
        let elapsed = self.started.elapsed().as_millis() as u64;
        let last = self.last_activity_millis.load(Ordering::Relaxed);
        Duration::from_millis(elapsed.saturating_sub(last))
    }

    pub fn touch(&self) {
        self.last_activity_millis.store(
            self.started.elapsed().as_millis() as u64,
            Ordering::Relaxed,
        );
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the connection: wakes a blocked reader, and sends FIN by
    /// shutting down the write half.  Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.close_notify.notify_waiters();
        if let Some(mut write_half) = self.writer.lock().await.take() {
            if let Err(e) = write_half.shutdown().await {
                debug!(
                    "Connection {} - error during close: {}",
                    self.id, e
                );
            }
        }
    }
}
