use std::path::{Path, PathBuf};

use anyhow::bail;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use tracing::info;

use crate::chord::Chord;
use crate::pitch::MidiNote;

pub const TICKS_PER_QUARTER: u16 = 480;
pub const TEMPO_MICROSECONDS_PER_QUARTER: u32 = 500_000;
pub const BAR_TICKS: u32 = 4 * TICKS_PER_QUARTER as u32;

const CHANNEL: u8 = 0;
const MAX_MIDI_VALUE: MidiNote = 127;

fn midi_velocity(velocity: f32) -> u7 {
    u7::new((velocity.clamp(0.0, 1.0) * MAX_MIDI_VALUE as f32).round() as u8)
}

fn midi_key(note: MidiNote) -> u7 {
    u7::new(note.clamp(0, MAX_MIDI_VALUE) as u8)
}

fn note_event(delta: u32, message: MidiMessage) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(CHANNEL),
            message,
        },
    }
}

/// One track holding each chord for a bar, back to back.
fn progression_track(chords: &[Chord], octave: MidiNote, velocity: f32) -> Track<'static> {
    let vel = midi_velocity(velocity);
    let mut track = vec![TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(TEMPO_MICROSECONDS_PER_QUARTER))),
    }];
    // Note-offs close each bar; the next chord starts on the same tick.
    for chord in chords {
        let keys = chord.midi_notes(octave).into_iter().map(midi_key).collect::<Vec<_>>();
        for key in keys.iter() {
            track.push(note_event(0, MidiMessage::NoteOn { key: *key, vel }));
        }
        for (i, key) in keys.iter().enumerate() {
            let delta = if i == 0 { BAR_TICKS } else { 0 };
            track.push(note_event(delta, MidiMessage::NoteOff { key: *key, vel: u7::new(0) }));
        }
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

fn progression_smf(chords: &[Chord], octave: MidiNote, velocity: f32) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));
    smf.tracks.push(progression_track(chords, octave, velocity));
    smf
}

/// A one-bar file of `chord` in root position at `octave`.
pub fn chord_smf(chord: &Chord, octave: MidiNote, velocity: f32) -> Smf<'static> {
    progression_smf(std::slice::from_ref(chord), octave, velocity)
}

fn write_smf(smf: &Smf, path: &Path) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    std::fs::write(path, &buf)?;
    Ok(())
}

pub fn write_chord(chord: &Chord, octave: MidiNote, velocity: f32, path: &Path) -> anyhow::Result<()> {
    write_smf(&chord_smf(chord, octave, velocity), path)
}

/// Writes the chords one bar apiece.
pub fn export_progression(chords: &[Chord], octave: MidiNote, path: &Path, velocity: f32) -> anyhow::Result<()> {
    if chords.is_empty() {
        bail!("Cannot export an empty progression to {}", path.display());
    }
    write_smf(&progression_smf(chords, octave, velocity), path)?;
    info!(path = %path.display(), chords = chords.len(), "progression exported");
    Ok(())
}

/// Writes `<directory>/<chord name>.mid`, creating the directory if needed.
pub fn export_to_directory(chord: &Chord, octave: MidiNote, directory: &Path, velocity: f32) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(directory)?;
    let path = directory.join(format!("{}.mid", chord.name()));
    write_chord(chord, octave, velocity, &path)?;
    info!(path = %path.display(), "chord exported");
    Ok(path)
}

/// Writes the chord to a uniquely named file in the system temp directory,
/// ready to be handed to a drag-and-drop target.
pub fn temp_chord_file(chord: &Chord, octave: MidiNote, velocity: f32) -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("chordpumper_{:x}.mid", rand::random::<u64>()));
    write_chord(chord, octave, velocity, &path)?;
    Ok(path)
}
