//! Buffer for frames awaiting address resolution.

use std::collections::VecDeque;

use core::repr::Ipv4Address;

/// A fully built frame held back until its target resolves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFrame {
    /// The IPv4 address whose resolution the frame is waiting on.
    pub target_addr: Ipv4Address,
    /// The serialized Ethernet frame, destination left unspecified.
    pub payload: Vec<u8>,
}

/// FIFO queue of frames owned by a single resolution entry.
///
/// Unbounded; the entry level timeout is the only thing that ever clears a
/// queue whose target never resolves.
#[derive(Clone, Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<PendingFrame>,
}

impl FrameQueue {
    pub fn new() -> FrameQueue {
        FrameQueue {
            frames: VecDeque::new(),
        }
    }

    /// Appends a frame to the back of the queue.
    pub fn append(&mut self, target_addr: Ipv4Address, payload: Vec<u8>) {
        self.frames.push_back(PendingFrame {
            target_addr,
            payload,
        });
    }

    /// Removes and returns all queued frames in FIFO order.
    pub fn flush(&mut self) -> Vec<PendingFrame> {
        self.frames.drain(..).collect()
    }

    /// Discards all queued frames.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}
