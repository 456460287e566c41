use midi_msg::{Channel, ChannelVoiceMsg, MidiMsg};

use crate::chord::{Chord, MAX_CHORD_SIZE};
use crate::pitch::{MidiNote, NOTES_PER_OCTAVE};

/// Permutation search is factorial in this bound.
pub const MAX_VOICES: usize = MAX_CHORD_SIZE;

const MAX_MIDI_NOTE: MidiNote = 127;

/// Minimum total semitone motion between two voicings.
///
/// The first `min(len)` notes of each side are paired under the cheapest
/// permutation. Each surplus note of the longer side then adds its distance to
/// the nearest note of the shorter side. Either side empty gives zero.
pub fn voice_leading_distance(from: &[MidiNote], to: &[MidiNote]) -> MidiNote {
    if from.is_empty() || to.is_empty() {
        return 0;
    }
    let n = from.len().min(to.len());
    assert!(n <= MAX_VOICES, "{n} voices exceeds the limit of {MAX_VOICES}");

    let paired = min_pairing(&from[..n], &to[..n], 0, 0);
    let (longer, shorter) = if from.len() > to.len() { (from, to) } else { (to, from) };
    let surplus: MidiNote = longer[n..]
        .iter()
        .map(|extra| shorter.iter().map(|s| (extra - s).abs()).min().unwrap_or(0))
        .sum();
    paired + surplus
}

fn min_pairing(from: &[MidiNote], to: &[MidiNote], i: usize, used: u32) -> MidiNote {
    if i == from.len() {
        return 0;
    }
    (0..to.len())
        .filter(|j| used & (1 << j) == 0)
        .map(|j| (from[i] - to[j]).abs() + min_pairing(from, to, i + 1, used | (1 << j)))
        .min()
        .unwrap_or(0)
}

/// A chord together with the concrete MIDI notes chosen to sound it.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct VoicedChord {
    chord: Chord,
    midi_notes: Vec<MidiNote>,
}

impl VoicedChord {
    pub fn new(chord: Chord, midi_notes: Vec<MidiNote>) -> Self {
        VoicedChord { chord, midi_notes }
    }

    pub fn chord(&self) -> Chord {
        self.chord
    }

    pub fn midi_notes(&self) -> &[MidiNote] {
        &self.midi_notes
    }

    pub fn note_on_messages(&self, velocity: u8) -> Vec<MidiMsg> {
        self.channel_messages(|note| ChannelVoiceMsg::NoteOn { note, velocity })
    }

    pub fn note_off_messages(&self) -> Vec<MidiMsg> {
        self.channel_messages(|note| ChannelVoiceMsg::NoteOff { note, velocity: 0 })
    }

    fn channel_messages<F: Fn(u8) -> ChannelVoiceMsg>(&self, make: F) -> Vec<MidiMsg> {
        self.midi_notes
            .iter()
            .map(|n| MidiMsg::ChannelVoice {
                channel: Channel::Ch1,
                msg: make((*n).clamp(0, MAX_MIDI_NOTE) as u8),
            })
            .collect()
    }
}

/// Places `target` as close as possible to `previous`.
///
/// With nothing sounding, `target` is voiced in root position at `octave`.
/// Otherwise each chord tone starts within a tritone of the centroid of
/// `previous`, and every combination of octave nudges is tried; the first
/// strictly cheaper voicing wins.
pub fn optimal_voicing(target: &Chord, previous: &[MidiNote], octave: MidiNote) -> VoicedChord {
    if previous.is_empty() {
        return VoicedChord::new(*target, target.midi_notes(octave));
    }

    let centroid = previous.iter().sum::<MidiNote>() / previous.len() as MidiNote;
    let octave_base = centroid / NOTES_PER_OCTAVE * NOTES_PER_OCTAVE;
    let half_octave = NOTES_PER_OCTAVE / 2;
    let base = target
        .semitones()
        .map(|pc| {
            let note = octave_base + pc;
            if note < centroid - half_octave {
                note + NOTES_PER_OCTAVE
            } else if note > centroid + half_octave {
                note - NOTES_PER_OCTAVE
            } else {
                note
            }
        })
        .collect::<Vec<_>>();

    let mut best = base.clone();
    let mut best_distance = voice_leading_distance(previous, &base);
    let combinations = 3_u32.pow(base.len() as u32);
    for mask in 0..combinations {
        let mut digits = mask;
        let candidate = base
            .iter()
            .map(|note| {
                let shift = (digits % 3) as MidiNote - 1;
                digits /= 3;
                note + shift * NOTES_PER_OCTAVE
            })
            .collect::<Vec<_>>();
        let distance = voice_leading_distance(previous, &candidate);
        if distance < best_distance {
            best_distance = distance;
            best = candidate;
        }
    }
    VoicedChord::new(*target, best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::ChordType;
    use crate::pitch::pitches;

    #[test]
    fn test_distance() {
        assert_eq!(voice_leading_distance(&[60, 64, 67], &[60, 65, 69]), 3);
        assert_eq!(voice_leading_distance(&[60, 64, 67], &[69, 60, 65]), 3);
        assert_eq!(voice_leading_distance(&[60, 64, 67], &[60, 64, 67]), 0);
    }

    #[test]
    fn test_empty_distance() {
        assert_eq!(voice_leading_distance(&[], &[60, 64, 67]), 0);
        assert_eq!(voice_leading_distance(&[60, 64, 67], &[]), 0);
        assert_eq!(voice_leading_distance(&[], &[]), 0);
    }

    #[test]
    fn test_surplus_voices() {
        assert_eq!(voice_leading_distance(&[60, 64, 67], &[60, 64, 67, 71]), 4);
        assert_eq!(voice_leading_distance(&[60, 64, 67, 71], &[60, 64, 67]), 4);
        assert_eq!(voice_leading_distance(&[62], &[60, 64, 67]), 2 + 2 + 5);
    }

    #[test]
    fn test_transposition_invariant() {
        let from = [60, 64, 67, 70];
        let to = [62, 65, 69, 72];
        for shift in [-24, -5, 7, 12] {
            let from_shifted = from.iter().map(|n| n + shift).collect::<Vec<_>>();
            let to_shifted = to.iter().map(|n| n + shift).collect::<Vec<_>>();
            assert_eq!(
                voice_leading_distance(&from, &to),
                voice_leading_distance(&from_shifted, &to_shifted)
            );
        }
    }

    #[test]
    #[should_panic]
    fn test_too_many_voices() {
        let notes = [60, 61, 62, 63, 64, 65, 66];
        voice_leading_distance(&notes, &notes);
    }

    #[test]
    fn test_root_position_without_previous() {
        let c_major = Chord::new(pitches::C, ChordType::Major);
        let voiced = optimal_voicing(&c_major, &[], 4);
        assert_eq!(voiced.midi_notes(), &[60, 64, 67]);
        assert_eq!(voiced.chord(), c_major);
    }

    #[test]
    fn test_close_voicing() {
        let f_major = Chord::new(pitches::F, ChordType::Major);
        let previous = [60, 64, 67];
        let voiced = optimal_voicing(&f_major, &previous, 4);
        assert_eq!(voiced.midi_notes().len(), 3);
        assert!(voice_leading_distance(&previous, voiced.midi_notes()) <= 5);
        assert_eq!(voice_leading_distance(&previous, voiced.midi_notes()), 3);
    }

    #[test]
    fn test_voicing_keeps_note_count() {
        let c_min7 = Chord::new(pitches::C, ChordType::Min7);
        let voiced = optimal_voicing(&c_min7, &[55, 60, 64], 4);
        assert_eq!(voiced.midi_notes().len(), 4);
        let mut pcs = voiced.midi_notes().iter().map(|n| n % 12).collect::<Vec<_>>();
        pcs.sort();
        assert_eq!(pcs, vec![0, 3, 7, 10]);
    }

    #[test]
    fn test_same_chord_does_not_move() {
        let c_major = Chord::new(pitches::C, ChordType::Major);
        for previous in [[60, 64, 67], [64, 67, 72], [55, 60, 64]] {
            let voiced = optimal_voicing(&c_major, &previous, 4);
            assert_eq!(voice_leading_distance(&previous, voiced.midi_notes()), 0);
        }
    }

    #[test]
    fn test_note_messages() {
        let voiced = VoicedChord::new(Chord::default(), vec![60, 64, 67]);
        let on = voiced.note_on_messages(100);
        assert_eq!(on.len(), 3);
        assert_eq!(
            on[1],
            MidiMsg::ChannelVoice {
                channel: Channel::Ch1,
                msg: ChannelVoiceMsg::NoteOn { note: 64, velocity: 100 }
            }
        );
        let off = voiced.note_off_messages();
        assert_eq!(
            off[2],
            MidiMsg::ChannelVoice {
                channel: Channel::Ch1,
                msg: ChannelVoiceMsg::NoteOff { note: 67, velocity: 0 }
            }
        );
    }
}
