use log::{error, trace};
use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::host::AudioSink;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AudioCommand {
    PlaySound { resource: u16, freq: u8, volume: u8, channel: u8 },
    PlayMusic { resource: u16, delay: u16, position: u8 },
    StopAll,
}

/// Hands audio triggers to a mixer on another thread.
pub struct AudioQueue {
    pub producer: Producer<AudioCommand>,
}

impl AudioQueue {
    /// The queue plus the consumer end for the mixer.
    pub fn new(capacity: usize) -> (Self, Consumer<AudioCommand>) {
        let (producer, consumer) = RingBuffer::<AudioCommand>::new(capacity);
        (Self { producer }, consumer)
    }

    fn send(&mut self, command: AudioCommand) {
        trace!("audio {:?}", command);
        if let Err(PushError::Full(command)) = self.producer.push(command) {
            error!("audio queue full, dropping {:?}", command);
        }
    }
}

impl AudioSink for AudioQueue {
    fn play_sound(&mut self, resource: u16, freq: u8, volume: u8, channel: u8) {
        self.send(AudioCommand::PlaySound { resource, freq, volume, channel });
    }

    fn play_music(&mut self, resource: u16, delay: u16, position: u8) {
        self.send(AudioCommand::PlayMusic { resource, delay, position });
    }

    fn stop_all(&mut self) {
        self.send(AudioCommand::StopAll);
    }
}
