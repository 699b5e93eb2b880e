//! Landmark engine receiver
//!
//! Receives JSON-over-UDP landmark bundles from the `scripts/landmark_engine.py`
//! helper, one datagram per video frame.

use std::net::SocketAddr;
use tokio::net::UdpSocket;

use crate::config::TrackingConfig;
use crate::error::{TrackingError, VtPuppetError};
use crate::landmarks::LandmarkBundle;

/// Largest datagram accepted from the engine
const MAX_PACKET_SIZE: usize = 65536;

/// Decode one engine datagram.
pub fn decode_packet(bytes: &[u8]) -> Result<LandmarkBundle, VtPuppetError> {
    LandmarkBundle::from_json(bytes)
        .map_err(|e| TrackingError::Parse(format!("JSON parse error: {}", e)).into())
}

/// Landmark bundle UDP receiver
pub struct LandmarkReceiver {
    listen_address: String,
    port: u16,
    socket: Option<UdpSocket>,
    buf: Vec<u8>,
    packets: u64,
}

impl LandmarkReceiver {
    /// Create a new receiver (does not bind yet)
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            listen_address: config.listen_address.clone(),
            port: config.port,
            socket: None,
            buf: vec![0u8; MAX_PACKET_SIZE],
            packets: 0,
        }
    }

    /// Bind the UDP socket
    pub async fn start(&mut self) -> Result<(), VtPuppetError> {
        let addr = format!("{}:{}", self.listen_address, self.port);

        let socket = UdpSocket::bind(&addr).await.map_err(|e| {
            TrackingError::Receiver(format!("Failed to bind to {}: {}", addr, e))
        })?;

        tracing::info!("Landmark receiver listening on {}", addr);
        self.socket = Some(socket);

        Ok(())
    }

    /// Address the socket is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Wait for the next datagram and decode it.
    ///
    /// Returns `Ok(None)` when the receiver is not bound or the datagram was
    /// empty.
    pub async fn recv_bundle(&mut self) -> Result<Option<LandmarkBundle>, VtPuppetError> {
        let socket = match &self.socket {
            Some(s) => s,
            None => return Ok(None),
        };

        let size = socket
            .recv(&mut self.buf)
            .await
            .map_err(|e| TrackingError::Receiver(format!("Receive error: {}", e)))?;

        if size == 0 {
            return Ok(None);
        }

        self.packets += 1;
        decode_packet(&self.buf[..size]).map(Some)
    }

    /// Datagrams received since start
    pub fn packets(&self) -> u64 {
        self.packets
    }

    pub fn is_running(&self) -> bool {
        self.socket.is_some()
    }

    /// Stop the receiver
    pub fn stop(&mut self) {
        if self.socket.take().is_some() {
            tracing::info!("Landmark receiver stopped");
        }
    }
}
