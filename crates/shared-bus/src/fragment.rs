//! # Fragments
//!
//! The unit the transport moves. A message that fits in one frame travels as
//! a single fragment flagged both `BEGIN` and `END`.

/// First fragment of a message.
pub const BEGIN_FRAG_FLAG: u8 = 0b1000_0000;

/// Last fragment of a message.
pub const END_FRAG_FLAG: u8 = 0b0100_0000;

/// A message carried in a single fragment.
pub const UNFRAGMENTED: u8 = BEGIN_FRAG_FLAG | END_FRAG_FLAG;

/// One frame received from a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Session of the publication that produced the frame.
    pub session_id: i32,

    /// `BEGIN` / `END` flags.
    pub flags: u8,

    /// Payload bytes of this frame only.
    pub payload: Vec<u8>,
}

impl Fragment {
    pub fn new(session_id: i32, flags: u8, payload: Vec<u8>) -> Self {
        Self {
            session_id,
            flags,
            payload,
        }
    }

    /// Returns true if this frame starts a message.
    #[must_use]
    pub fn is_begin(&self) -> bool {
        self.flags & BEGIN_FRAG_FLAG != 0
    }

    /// Returns true if this frame ends a message.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.flags & END_FRAG_FLAG != 0
    }

    /// Returns true if this frame is a whole message.
    #[must_use]
    pub fn is_unfragmented(&self) -> bool {
        self.flags & UNFRAGMENTED == UNFRAGMENTED
    }
}

/// Split a message into frames of at most `mtu` payload bytes.
///
/// An empty message still produces one (empty) frame.
pub(crate) fn split(session_id: i32, message: &[u8], mtu: usize) -> Vec<Fragment> {
    let mtu = mtu.max(1);
    if message.len() <= mtu {
        return vec![Fragment::new(session_id, UNFRAGMENTED, message.to_vec())];
    }

    let chunks: Vec<&[u8]> = message.chunks(mtu).collect();
    let last = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut flags = 0;
            if i == 0 {
                flags |= BEGIN_FRAG_FLAG;
            }
            if i == last {
                flags |= END_FRAG_FLAG;
            }
            Fragment::new(session_id, flags, chunk.to_vec())
        })
        .collect()
}
