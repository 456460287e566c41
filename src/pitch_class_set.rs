use lazy_static::lazy_static;
use enum_iterator::all;

use crate::chord::{Chord, ChordType, BASE_CHORD_TYPES};
use crate::pitch::{pitches, MidiNote};

/// Twelve-bit mask with bit `i` set when pitch class `i` (0 = C .. 11 = B)
/// sounds in a chord. Enharmonically identical chords share a set.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Default)]
pub struct PitchClassSet(u16);

impl PitchClassSet {
    pub fn of(chord: &Chord) -> Self {
        PitchClassSet(chord.semitones().fold(0, |set, pc| set | (1 << pc)))
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn contains(&self, semitone: MidiNote) -> bool {
        (0..12).contains(&semitone) && self.0 & (1 << semitone) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn common_tone_count(&self, other: &PitchClassSet) -> usize {
        (self.0 & other.0).count_ones() as usize
    }
}

pub fn pitch_class_set(chord: &Chord) -> PitchClassSet {
    PitchClassSet::of(chord)
}

pub fn common_tone_count(a: PitchClassSet, b: PitchClassSet) -> usize {
    a.common_tone_count(&b)
}

/// Every root paired with every type, root-major and type-minor.
pub fn all_chords(chord_types: &[ChordType]) -> Vec<Chord> {
    pitches::CHROMATIC
        .iter()
        .flat_map(|root| chord_types.iter().map(move |t| Chord::new(*root, *t)))
        .collect()
}

lazy_static! {
    static ref BASIC_CATALOG: Vec<Chord> = all_chords(&BASE_CHORD_TYPES);
    static ref EXTENDED_CATALOG: Vec<Chord> = all_chords(&all::<ChordType>().collect::<Vec<_>>());
}

/// The universe of morph candidates.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ChordCatalog {
    /// 12 roots by the 9 base qualities.
    #[default]
    Basic,
    /// 12 roots by all 18 qualities.
    Extended,
}

impl ChordCatalog {
    pub fn chords(&self) -> &'static [Chord] {
        match self {
            ChordCatalog::Basic => BASIC_CATALOG.as_slice(),
            ChordCatalog::Extended => EXTENDED_CATALOG.as_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.chords().len()
    }
}
