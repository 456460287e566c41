use crate::chord::{Chord, ChordType};
use crate::pitch::{pitches, PitchClass};

/// Pads on the smaller grid.
pub const GRID_PADS: usize = 32;

const DIMINISHED_ROOTS: [PitchClass; 4] = [pitches::C, pitches::D, pitches::E, pitches::FS];
const AUGMENTED_ROOTS: [PitchClass; 4] = [pitches::C, pitches::EB, pitches::G, pitches::BB];

/// The pad layout shown before anything has been morphed: every major triad,
/// every minor triad, then four diminished and four augmented triads.
pub fn chromatic_palette() -> [Chord; GRID_PADS] {
    let mut palette = [Chord::default(); GRID_PADS];
    let layout = pitches::CHROMATIC
        .iter()
        .map(|root| Chord::new(*root, ChordType::Major))
        .chain(pitches::CHROMATIC.iter().map(|root| Chord::new(*root, ChordType::Minor)))
        .chain(DIMINISHED_ROOTS.iter().map(|root| Chord::new(*root, ChordType::Diminished)))
        .chain(AUGMENTED_ROOTS.iter().map(|root| Chord::new(*root, ChordType::Augmented)));
    for (pad, chord) in palette.iter_mut().zip(layout) {
        *pad = chord;
    }
    palette
}
