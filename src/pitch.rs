use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::bail;
use bare_metal_modulo::{MNum, ModNumC};
use enum_iterator::{all, Sequence};

pub type MidiNote = i32;

pub const NOTES_PER_OCTAVE: MidiNote = 12;
pub const USIZE_NOTES_PER_OCTAVE: usize = NOTES_PER_OCTAVE as usize;

/// A value reduced into the twelve semitone positions of an octave.
pub type Semitone = ModNumC<MidiNote, USIZE_NOTES_PER_OCTAVE>;

/// Semitones up from `from` to `to`, reduced into `0..12`.
pub fn interval_between(from: MidiNote, to: MidiNote) -> MidiNote {
    Semitone::new(to - from).a()
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Sequence)]
pub enum NoteLetter {
    C, D, E, F, G, A, B
}

impl NoteLetter {
    pub fn natural_pitch(&self) -> MidiNote {
        match self {
            NoteLetter::C => 0,
            NoteLetter::D => 2,
            NoteLetter::E => 4,
            NoteLetter::F => 5,
            NoteLetter::G => 7,
            NoteLetter::A => 9,
            NoteLetter::B => 11,
        }
    }

    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        all::<NoteLetter>().nth(ordinal)
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(NoteLetter::C),
            'D' => Some(NoteLetter::D),
            'E' => Some(NoteLetter::E),
            'F' => Some(NoteLetter::F),
            'G' => Some(NoteLetter::G),
            'A' => Some(NoteLetter::A),
            'B' => Some(NoteLetter::B),
            _ => None,
        }
    }
}

/// A spelled pitch class. Enharmonic spellings are distinct values even though
/// they share a semitone: `C#` and `Db` are not equal.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PitchClass {
    letter: NoteLetter,
    accidental: i8,
}

impl PitchClass {
    pub const fn new(letter: NoteLetter, accidental: i8) -> Self {
        PitchClass { letter, accidental }
    }

    pub fn letter(&self) -> NoteLetter {
        self.letter
    }

    pub fn accidental(&self) -> i8 {
        self.accidental
    }

    pub fn semitone(&self) -> MidiNote {
        Semitone::new(self.letter.natural_pitch() + self.accidental as MidiNote).a()
    }

    /// MIDI number of this pitch class in `octave`, using the C4 = 60 convention.
    pub fn midi_note(&self, octave: MidiNote) -> MidiNote {
        self.semitone() + (octave + 1) * NOTES_PER_OCTAVE
    }

    pub fn name(&self) -> String {
        let symbol = if self.accidental < 0 { "b" } else { "#" };
        format!("{:?}{}", self.letter, symbol.repeat(self.accidental.unsigned_abs() as usize))
    }
}

impl Default for PitchClass {
    fn default() -> Self {
        pitches::C
    }
}

impl Display for PitchClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PitchClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let Some(letter) = chars.next().and_then(NoteLetter::from_char) else {
            bail!("No note letter at the start of '{s}'");
        };
        let mut accidental: i8 = 0;
        for c in chars {
            let next = match c {
                '#' if accidental >= 0 => accidental.checked_add(1),
                'b' if accidental <= 0 => accidental.checked_sub(1),
                _ => bail!("Unexpected accidental '{c}' in '{s}'"),
            };
            let Some(next) = next else {
                bail!("Too many accidentals in '{s}'");
            };
            accidental = next;
        }
        Ok(PitchClass::new(letter, accidental))
    }
}

/// The spellings used for chord roots throughout the catalog.
pub mod pitches {
    use super::{NoteLetter, PitchClass};

    pub const C: PitchClass = PitchClass::new(NoteLetter::C, 0);
    pub const CS: PitchClass = PitchClass::new(NoteLetter::C, 1);
    pub const D: PitchClass = PitchClass::new(NoteLetter::D, 0);
    pub const EB: PitchClass = PitchClass::new(NoteLetter::E, -1);
    pub const E: PitchClass = PitchClass::new(NoteLetter::E, 0);
    pub const F: PitchClass = PitchClass::new(NoteLetter::F, 0);
    pub const FS: PitchClass = PitchClass::new(NoteLetter::F, 1);
    pub const G: PitchClass = PitchClass::new(NoteLetter::G, 0);
    pub const AB: PitchClass = PitchClass::new(NoteLetter::A, -1);
    pub const A: PitchClass = PitchClass::new(NoteLetter::A, 0);
    pub const BB: PitchClass = PitchClass::new(NoteLetter::B, -1);
    pub const B: PitchClass = PitchClass::new(NoteLetter::B, 0);

    pub const CHROMATIC: [PitchClass; 12] = [C, CS, D, EB, E, F, FS, G, AB, A, BB, B];
}
