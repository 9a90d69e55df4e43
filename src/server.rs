//! TCP pose-update service.
//!
//! Agents connect and report poses as length-prefixed JSON frames. Every
//! request is acknowledged after the update has been handed to the render
//! loop's queue, so the call stays synchronous for the reporting agent.
//! Requests are never rejected; pose values are not validated.
//!
//! The accept loop and each connection run on their own threads; all render
//! state stays on the render-loop thread, which is the sole consumer of the
//! update queue.

use crate::error::{Error, Result};
use crate::geometry::Pose;
use crate::wire::{self, PoseAck, PoseRequest};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Read timeout so connection threads notice shutdown
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Accept-poll interval while no connection is pending
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Listening half of the pose service
pub struct PoseServer {
    listener: TcpListener,
    updates: Sender<Pose>,
    running: Arc<AtomicBool>,
}

impl PoseServer {
    /// Bind the service socket.
    pub fn bind(addr: &str, updates: Sender<Pose>, running: Arc<AtomicBool>) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| {
            Error::Config(format!("failed to bind pose service to {}: {}", addr, e))
        })?;
        listener.set_nonblocking(true)?;
        log::info!("pose service listening on {}", addr);
        Ok(Self {
            listener,
            updates,
            running,
        })
    }

    /// Actual bound address; useful when binding to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Spawn the accept loop on its own thread.
    pub fn spawn(self) -> Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("pose-server".to_string())
            .spawn(move || self.accept_loop())
            .map_err(|e| Error::Other(format!("failed to spawn pose server: {}", e)))
    }

    fn accept_loop(self) {
        while self.running.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    log::info!("agent connected: {}", addr);
                    let updates = self.updates.clone();
                    let running = Arc::clone(&self.running);
                    let spawned = thread::Builder::new()
                        .name("pose-conn".to_string())
                        .spawn(move || {
                            if let Err(e) = handle_connection(stream, updates, running) {
                                log::error!("pose connection error: {}", e);
                            }
                            log::info!("agent disconnected: {}", addr);
                        });
                    if let Err(e) = spawned {
                        log::error!("failed to spawn connection thread: {}", e);
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => log::error!("accept error: {}", e),
            }
        }
        log::debug!("pose server stopped");
    }
}

fn handle_connection(
    mut stream: TcpStream,
    updates: Sender<Pose>,
    running: Arc<AtomicBool>,
) -> Result<()> {
    // The accepted socket inherits non-blocking mode on some platforms
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    while running.load(Ordering::Relaxed) {
        match wire::read_frame::<_, PoseRequest>(&mut stream) {
            Ok(Some(req)) => {
                let pose = Pose::new(req.x, req.y, req.theta);
                if updates.send(pose).is_err() {
                    // Render loop is gone; the service is shutting down
                    break;
                }
                wire::write_frame(&mut stream, &PoseAck { ok: true })?;
            }
            Ok(None) => {
                // Read timeout; fall through to the shutdown-flag check
            }
            Err(Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof
                    || e.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }

    let _ = stream.shutdown(Shutdown::Both);
    Ok(())
}
