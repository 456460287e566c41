use enum_iterator::{all, Sequence};

use crate::chord::ChordType::{Diminished as Dim, Dom7, HalfDim7, Maj7, Major, Min7, Minor};
use crate::chord::{Chord, ChordType};
use crate::pitch::{interval_between, MidiNote};

pub const DIATONIC_SCALE_SIZE: usize = 7;

const MODE_NAMES: [&str; DIATONIC_SCALE_SIZE] = [
    "Ionian",
    "Dorian",
    "Phrygian",
    "Lydian",
    "Mixolydian",
    "Aeolian",
    "Locrian",
];

/// Degree offsets and the triad and seventh built on each degree.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ScalePattern {
    pub intervals: [MidiNote; DIATONIC_SCALE_SIZE],
    pub triads: [ChordType; DIATONIC_SCALE_SIZE],
    pub sevenths: [ChordType; DIATONIC_SCALE_SIZE],
}

const MODE_PATTERNS: [ScalePattern; DIATONIC_SCALE_SIZE] = [
    // Ionian
    ScalePattern {
        intervals: [0, 2, 4, 5, 7, 9, 11],
        triads: [Major, Minor, Minor, Major, Major, Minor, Dim],
        sevenths: [Maj7, Min7, Min7, Maj7, Dom7, Min7, HalfDim7],
    },
    // Dorian
    ScalePattern {
        intervals: [0, 2, 3, 5, 7, 9, 10],
        triads: [Minor, Minor, Major, Major, Minor, Dim, Major],
        sevenths: [Min7, Min7, Maj7, Dom7, Min7, HalfDim7, Maj7],
    },
    // Phrygian
    ScalePattern {
        intervals: [0, 1, 3, 5, 7, 8, 10],
        triads: [Minor, Major, Major, Minor, Dim, Major, Minor],
        sevenths: [Min7, Maj7, Dom7, Min7, HalfDim7, Maj7, Min7],
    },
    // Lydian
    ScalePattern {
        intervals: [0, 2, 4, 6, 7, 9, 11],
        triads: [Major, Major, Minor, Dim, Major, Minor, Minor],
        sevenths: [Maj7, Dom7, Min7, HalfDim7, Maj7, Min7, Min7],
    },
    // Mixolydian
    ScalePattern {
        intervals: [0, 2, 4, 5, 7, 9, 10],
        triads: [Major, Minor, Dim, Major, Minor, Minor, Major],
        sevenths: [Dom7, Min7, HalfDim7, Maj7, Min7, Min7, Maj7],
    },
    // Aeolian
    ScalePattern {
        intervals: [0, 2, 3, 5, 7, 8, 10],
        triads: [Minor, Dim, Major, Minor, Minor, Major, Major],
        sevenths: [Min7, HalfDim7, Maj7, Min7, Min7, Maj7, Dom7],
    },
    // Locrian
    ScalePattern {
        intervals: [0, 1, 3, 5, 6, 8, 10],
        triads: [Dim, Major, Minor, Minor, Major, Major, Minor],
        sevenths: [HalfDim7, Maj7, Min7, Min7, Maj7, Dom7, Min7],
    },
];

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Sequence)]
pub enum Mode {
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl Mode {
    pub fn pattern(&self) -> &'static ScalePattern {
        &MODE_PATTERNS[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        MODE_NAMES[*self as usize]
    }

    /// How common the mode is in popular harmony; the weight diatonic
    /// scoring awards to chords native to it.
    pub fn typicality(&self) -> f64 {
        match self {
            Mode::Ionian => 1.00,
            Mode::Dorian => 0.75,
            Mode::Phrygian => 0.60,
            Mode::Lydian => 0.70,
            Mode::Mixolydian => 0.80,
            Mode::Aeolian => 0.85,
            Mode::Locrian => 0.60,
        }
    }

    /// The scale degree (0-based) whose triad or seventh is `chord` when the
    /// mode is built on `tonic`.
    pub fn degree_of(&self, tonic: MidiNote, chord: &Chord) -> Option<usize> {
        let pattern = self.pattern();
        let interval = interval_between(tonic, chord.root().semitone());
        (0..DIATONIC_SCALE_SIZE).find(|&degree| {
            pattern.intervals[degree] == interval
                && (pattern.triads[degree] == chord.chord_type()
                    || pattern.sevenths[degree] == chord.chord_type())
        })
    }

    pub fn contains_chord(&self, tonic: MidiNote, chord: &Chord) -> bool {
        self.degree_of(tonic, chord).is_some()
    }

    /// Every mode in which `chord` is diatonic over `tonic`.
    pub fn modes_containing(tonic: MidiNote, chord: &Chord) -> Vec<Mode> {
        all::<Mode>()
            .filter(|mode| mode.contains_chord(tonic, chord))
            .collect()
    }
}
