use std::io::BufRead;
use std::path::{Path, PathBuf};

use beatline_core::{
    translate_char, AppConfig, BeatlineError, EventSource, FramePacer, GameConfig, GameContext,
    HitKind, InputEvent, Mixer, ScoreSummary, Session, SoundBank, StopHandle, TapMode,
    TimelineDocument, WavStream,
};
use clap::{Parser, Subcommand};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam::channel::{Receiver, Sender};
use tracing_subscriber::EnvFilter;

fn main() -> beatline_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            hits,
            audio,
            config,
            autoplay,
            report,
        } => run_play(&hits, &audio, config.as_deref(), autoplay, report.as_deref()),
        Commands::Check { hits } => run_check(&hits),
    }
}

fn run_play(
    hits: &Path,
    audio: &Path,
    config: Option<&Path>,
    autoplay: bool,
    report: Option<&Path>,
) -> beatline_core::Result<()> {
    let mut config = AppConfig::load_or_default(config)?;
    config.game.autoplay |= autoplay;

    let document = TimelineDocument::load(hits)?;
    if let Some(lead_in) = document.audio_lead_in() {
        config.difficulty.audio_lead_in = lead_in;
    }
    let timeline = document.into_timeline()?;
    tracing::info!(?hits, objects = timeline.len(), "loaded hit objects");

    let music = WavStream::open(audio, config.audio.packet_frames)?;
    let mixer = Mixer::with_music(&config.audio, Box::new(music));
    let sounds = SoundBank::load(&config.sounds, mixer.sample_rate())?;
    let _stream = open_output(&mixer)?;

    let mut pacer = FramePacer::new(&config.game);
    let game = GameContext::new(
        timeline,
        mixer,
        config.difficulty,
        sounds,
        config.game.autoplay,
        pacer.now(),
    );
    let mut session = Session::new(game, TapMode::new());

    let (sender, receiver) = crossbeam::channel::unbounded();
    spawn_terminal(sender, session.stop_handle(), config.game.clone());
    let mut events = TerminalEvents(receiver);
    session.run(&config.game, &mut pacer, &mut events)?;

    if let Some(path) = report {
        let summary = session
            .summary()
            .unwrap_or_else(|| ScoreSummary::from_timeline(&session.game().timeline));
        std::fs::write(path, serde_json::to_vec_pretty(&summary)?)?;
        tracing::info!(?path, "wrote score report");
    }
    Ok(())
}

fn run_check(hits: &Path) -> beatline_core::Result<()> {
    let document = TimelineDocument::load(hits)?;
    let lead_in = document.audio_lead_in();
    let timeline = document.into_timeline()?;

    let count = |kind: HitKind| {
        timeline
            .hits()
            .iter()
            .filter(|hit| hit.kind.contains(kind))
            .count()
    };
    tracing::info!(
        ?hits,
        objects = timeline.len(),
        circles = count(HitKind::CIRCLE),
        sliders = count(HitKind::SLIDER),
        spinners = count(HitKind::SPINNER),
        holds = count(HitKind::HOLD),
        first = timeline.first_time(),
        last = timeline.last_end_time(),
        lead_in,
        "hit objects are valid"
    );
    Ok(())
}

/// Opens the default output device and feeds it from the mixer.
fn open_output(mixer: &Mixer) -> beatline_core::Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| BeatlineError::Device("no audio output device found".to_string()))?;

    let fixed = cpal::StreamConfig {
        channels: 2,
        sample_rate: cpal::SampleRate(mixer.sample_rate()),
        buffer_size: cpal::BufferSize::Fixed(mixer.block_size() as u32),
    };
    let stream = match build_stream(&device, &fixed, mixer) {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(error = %err, "fixed buffer size rejected, using the device default");
            let fallback = cpal::StreamConfig {
                buffer_size: cpal::BufferSize::Default,
                ..fixed
            };
            build_stream(&device, &fallback, mixer)?
        }
    };
    stream
        .play()
        .map_err(|err| BeatlineError::Device(err.to_string()))?;

    tracing::info!(
        sample_rate = mixer.sample_rate(),
        block_size = mixer.block_size(),
        "audio output initialized"
    );
    Ok(stream)
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: &Mixer,
) -> beatline_core::Result<cpal::Stream> {
    let mixer = mixer.clone();
    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| mixer.render(data),
            |err| tracing::error!(error = %err, "audio stream error"),
            None,
        )
        .map_err(|err| BeatlineError::Device(err.to_string()))
}

/// Reads commands from stdin until EOF, which stops the session.
fn spawn_terminal(sender: Sender<InputEvent>, stop: StopHandle, config: GameConfig) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            for event in parse_command(&line, &config) {
                if sender.send(event).is_err() {
                    return;
                }
            }
        }
        stop.request_stop();
    });
}

/// `p` pauses or resumes, `r` rewinds, `f` skips ahead and `q` quits. Any
/// other characters are keys, pressed and released in order.
fn parse_command(line: &str, config: &GameConfig) -> Vec<InputEvent> {
    match line.trim() {
        "p" => vec![InputEvent::TogglePause],
        "r" => vec![InputEvent::Rewind(config.rewind_step)],
        "f" => vec![InputEvent::Forward(config.forward_step)],
        "q" => vec![InputEvent::Stop],
        keys => keys
            .chars()
            .filter_map(translate_char)
            .flat_map(|finger| [InputEvent::Press(finger), InputEvent::Release(finger)])
            .collect(),
    }
}

struct TerminalEvents(Receiver<InputEvent>);

impl EventSource for TerminalEvents {
    fn poll(&mut self) -> Option<InputEvent> {
        self.0.try_recv().ok()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal rhythm game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a hit-object file against a music track.
    Play {
        /// JSON hit-object file.
        hits: PathBuf,
        /// WAV music track.
        #[arg(short, long)]
        audio: PathBuf,
        /// Optional JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Let the game play itself.
        #[arg(long)]
        autoplay: bool,
        /// Write the final score as JSON to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Validate a hit-object file and summarise its content.
    Check {
        /// JSON hit-object file.
        hits: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_commands() {
        let config = GameConfig::default();
        assert_eq!(parse_command("p\n", &config), vec![InputEvent::TogglePause]);
        assert_eq!(parse_command("r", &config), vec![InputEvent::Rewind(10.0)]);
        assert_eq!(parse_command(" f ", &config), vec![InputEvent::Forward(20.0)]);
        assert_eq!(parse_command("q", &config), vec![InputEvent::Stop]);
    }

    #[test]
    fn key_characters_press_and_release() {
        let events = parse_command("z?", &GameConfig::default());
        let finger = translate_char('z').unwrap();
        assert_eq!(
            events,
            vec![InputEvent::Press(finger), InputEvent::Release(finger)]
        );
    }

    #[test]
    fn cli_parses_play_arguments() {
        let cli = Cli::try_parse_from([
            "beatline", "play", "map.json", "--audio", "song.wav", "--autoplay",
        ])
        .unwrap();
        match cli.command {
            Commands::Play {
                hits,
                audio,
                autoplay,
                report,
                ..
            } => {
                assert_eq!(hits, PathBuf::from("map.json"));
                assert_eq!(audio, PathBuf::from("song.wav"));
                assert!(autoplay);
                assert!(report.is_none());
            }
            Commands::Check { .. } => panic!("expected play"),
        }
    }
}
