//! Calculator server: accept loop and per-connection dispatch.
use std::{
    io::{self, BufReader, BufWriter},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use log::{debug, error, info};

use crate::{
    error::Result,
    evaluator,
    protocol::{self, Operation, RequestRecord, Response},
    thread_pool::{SharedQueueThreadPool, ThreadPool},
};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What the server does with one decoded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Send this response back.
    Reply(Response),
    /// End the connection without answering.
    Close,
}

/// Evaluate one request record.
///
/// A zero divisor is caught here, before the evaluator is called.
pub fn dispatch(record: &RequestRecord) -> Dispatch {
    let (a, b) = (record.operand1, record.operand2);
    let response = match record.operation() {
        Some(Operation::Add) => Response::ok(evaluator::add(a, b)),
        Some(Operation::Subtract) => Response::ok(evaluator::subtract(a, b)),
        Some(Operation::Multiply) => Response::ok(evaluator::multiply(a, b)),
        Some(Operation::Divide) if b == 0 => Response::division_by_zero(),
        Some(Operation::Divide) => Response::ok(evaluator::divide(a, b)),
        Some(Operation::Close) => return Dispatch::Close,
        None => Response::invalid_operation(),
    };
    Dispatch::Reply(response)
}

/// Serve one client until it sends the close signal, disconnects, or an I/O
/// error occurs. Returns the number of responses sent.
///
/// An orderly disconnect between records is not an error.
pub fn handle_connection(stream: TcpStream, peer: SocketAddr) -> Result<u64> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);
    let mut answered = 0;

    loop {
        let Some(record) = protocol::read_request(&mut reader)? else {
            info!("Connection with {peer} closed by peer");
            return Ok(answered);
        };
        debug!("Received from {peer}: {:?}", record);

        match dispatch(&record) {
            Dispatch::Close => {
                info!("Connection closed with {peer}");
                return Ok(answered);
            }
            Dispatch::Reply(response) => {
                protocol::write_response(&mut writer, &response)?;
                debug!("Sent to {peer}: {:?}", response);
                answered += 1;
            }
        }
    }
}

/// Queue one accepted connection on `pool`.
///
/// If the pool refuses the job the connection is dropped and `false` is
/// returned; the accept loop carries on either way.
fn hand_off<P: ThreadPool>(
    pool: &P,
    stream: TcpStream,
    peer: SocketAddr,
    served: Arc<AtomicU64>,
) -> bool {
    let job = move || {
        if let Err(e) = handle_connection(stream, peer) {
            error!("Error in client handling for {peer}: {e}");
        }
        served.fetch_add(1, Ordering::SeqCst);
    };
    match pool.spawn(job) {
        Ok(()) => true,
        Err(e) => {
            error!("Dropping connection with {peer}: {e}");
            false
        }
    }
}

/// Calculator server.
pub struct CalcServer {
    listener: TcpListener,
    thread_pool: SharedQueueThreadPool,
    shutdown: Arc<AtomicBool>,
    served: Arc<AtomicU64>,
    timeout: Option<Duration>,
}

impl CalcServer {
    /// Bind the listener and start `workers` connection handlers.
    ///
    /// With one worker connections are served strictly one after another.
    pub fn bind(addr: impl ToSocketAddrs, workers: u32) -> Result<Self> {
        let thread_pool = SharedQueueThreadPool::new(workers)?;
        let listener = TcpListener::bind(addr)?;
        // Non-blocking so the accept loop can observe the shutdown flag.
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            thread_pool,
            shutdown: Arc::new(AtomicBool::new(false)),
            served: Arc::new(AtomicU64::new(0)),
            timeout: None,
        })
    }

    /// Apply a read/write timeout to every accepted connection.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The address actually bound, useful after binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops [`CalcServer::run`] once set.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Number of connections that have finished, cleanly or not.
    pub fn connections_served(&self) -> Arc<AtomicU64> {
        self.served.clone()
    }

    /// Accept connections until shutdown is requested.
    ///
    /// Per-connection failures are logged and never end the loop.
    pub fn run(self) -> Result<()> {
        info!(
            "Waiting for clients on {} with {} worker(s)",
            self.listener.local_addr()?,
            self.thread_pool.size()
        );

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!("Connection established with {peer}");
                    if let Err(e) = self.prepare(&stream) {
                        error!("Failed to configure connection with {peer}: {e}");
                        continue;
                    }
                    hand_off(&self.thread_pool, stream, peer, self.served.clone());
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    error!("accept() failed: {e}");
                    std::thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        info!("Shutdown requested, waiting for active connections to finish");
        // Dropping the pool joins its workers.
        Ok(())
    }

    fn prepare(&self, stream: &TcpStream) -> io::Result<()> {
        // Accepted sockets may inherit the listener's non-blocking mode.
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalcError;
    use std::io::Read;

    fn record(tag: u8, operand1: i32, operand2: i32) -> RequestRecord {
        RequestRecord {
            tag,
            operand1,
            operand2,
        }
    }

    #[test]
    fn computes_the_four_operators() {
        assert_eq!(dispatch(&record(b'+', 2, 3)), Dispatch::Reply(Response::ok(5)));
        assert_eq!(dispatch(&record(b'-', 2, 3)), Dispatch::Reply(Response::ok(-1)));
        assert_eq!(dispatch(&record(b'*', -4, 5)), Dispatch::Reply(Response::ok(-20)));
        assert_eq!(dispatch(&record(b'/', -7, 2)), Dispatch::Reply(Response::ok(-3)));
    }

    #[test]
    fn wraps_on_overflow() {
        assert_eq!(
            dispatch(&record(b'+', i32::MAX, 1)),
            Dispatch::Reply(Response::ok(i32::MIN))
        );
        assert_eq!(
            dispatch(&record(b'/', i32::MIN, -1)),
            Dispatch::Reply(Response::ok(i32::MIN))
        );
    }

    #[test]
    fn zero_divisor_is_reported() {
        for a in [i32::MIN, -1, 0, 1, i32::MAX] {
            assert_eq!(
                dispatch(&record(b'/', a, 0)),
                Dispatch::Reply(Response { result: 0, error: 2 })
            );
        }
    }

    #[test]
    fn unknown_tags_are_invalid() {
        for tag in [b'x', b'%', b'i', 0, 0xff] {
            assert_eq!(
                dispatch(&record(tag, 6, 7)),
                Dispatch::Reply(Response { result: 0, error: 1 })
            );
        }
    }

    #[test]
    fn close_has_no_reply() {
        assert_eq!(dispatch(&record(b'=', 0, 0)), Dispatch::Close);
    }

    struct RefusingPool;

    impl ThreadPool for RefusingPool {
        fn new(_threads: u32) -> Result<Self> {
            Ok(RefusingPool)
        }

        fn spawn<F>(&self, _job: F) -> Result<()>
        where
            F: FnOnce() + Send + 'static,
        {
            Err(CalcError::ThreadPool("no workers left".into()))
        }
    }

    #[test]
    fn refused_job_drops_the_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let (stream, peer) = listener.accept().unwrap();

        let served = Arc::new(AtomicU64::new(0));
        let pool = RefusingPool::new(1).unwrap();
        assert!(!hand_off(&pool, stream, peer, served.clone()));
        assert_eq!(served.load(Ordering::SeqCst), 0);

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn accepted_job_is_served() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (stream, peer) = listener.accept().unwrap();

        let served = Arc::new(AtomicU64::new(0));
        {
            let pool = SharedQueueThreadPool::new(1).unwrap();
            assert!(hand_off(&pool, stream, peer, served.clone()));
            drop(client);
        }
        assert_eq!(served.load(Ordering::SeqCst), 1);
    }
}
