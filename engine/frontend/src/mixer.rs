use rtrb::Consumer;
use tracing::{debug, info};
use vge_core::audio_queue::AudioCommand;

/// Consumer end of the engine's audio queue.
///
/// There is no sound output in the headless runner; commands are logged and
/// the music position is tracked so it shows up in traces.
pub struct Mixer {
    commands: Consumer<AudioCommand>,
    pub sounds_played: u64,
    pub music: Option<u16>,
}

impl Mixer {
    pub fn new(commands: Consumer<AudioCommand>) -> Self {
        Self { commands, sounds_played: 0, music: None }
    }

    /// Handle everything queued since the last call.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(command) = self.commands.pop() {
            handled += 1;
            match command {
                AudioCommand::PlaySound { resource, freq, volume, channel } => {
                    self.sounds_played += 1;
                    debug!(resource, freq, volume, channel, "sound");
                }
                AudioCommand::PlayMusic { resource, delay, position } => {
                    info!(resource, delay, position, "music");
                    self.music = (resource != 0).then_some(resource);
                }
                AudioCommand::StopAll => {
                    debug!("stop all channels");
                    self.music = None;
                }
            }
        }
        handled
    }
}
