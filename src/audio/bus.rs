use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::AudioError;
use crate::synth::SoundVariant;

/// Note as seen by the audio thread: start position in output frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub frame: u64,
    pub variant: SoundVariant,
    pub beat_index: usize,
    pub accent: bool,
}

/// Bounded channel carrying scheduled notes to the audio thread
pub struct NoteBus {
    tx: Sender<NoteEvent>,
    rx: Receiver<NoteEvent>,
}

impl NoteBus {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// Get a sender that can be cloned and shared
    pub fn sender(&self) -> NoteSender {
        NoteSender {
            tx: self.tx.clone(),
        }
    }

    /// Get a receiver (typically for the audio thread)
    pub fn receiver(&self) -> NoteReceiver {
        NoteReceiver {
            rx: self.rx.clone(),
        }
    }
}

impl Default for NoteBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable sender for scheduled notes
#[derive(Clone)]
pub struct NoteSender {
    tx: Sender<NoteEvent>,
}

impl NoteSender {
    /// Send a note (non-blocking, fails if the buffer is full)
    pub fn send(&self, note: NoteEvent) -> Result<(), AudioError> {
        match self.tx.try_send(note) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(AudioError::BusFull),
            Err(TrySendError::Disconnected(_)) => Err(AudioError::Disconnected),
        }
    }
}

/// Receiver for consuming notes
#[derive(Clone)]
pub struct NoteReceiver {
    rx: Receiver<NoteEvent>,
}

impl NoteReceiver {
    /// Try to receive a note (non-blocking)
    pub fn try_recv(&self) -> Option<NoteEvent> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(frame: u64) -> NoteEvent {
        NoteEvent {
            frame,
            variant: SoundVariant::Click,
            beat_index: 0,
            accent: true,
        }
    }

    #[test]
    fn test_notes_arrive_in_send_order() {
        let bus = NoteBus::new();
        let tx = bus.sender();
        let rx = bus.receiver();
        tx.send(note(10)).unwrap();
        tx.send(note(20)).unwrap();
        assert_eq!(rx.try_recv(), Some(note(10)));
        assert_eq!(rx.try_recv(), Some(note(20)));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_full_bus_reports_error() {
        let bus = NoteBus::with_capacity(1);
        let tx = bus.sender();
        tx.send(note(1)).unwrap();
        assert!(matches!(tx.send(note(2)), Err(AudioError::BusFull)));
    }
}
