use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail};
use chrono::{DateTime, Local, TimeZone, Utc};
use sqlite::{Connection, State, Statement};
use tracing::info;

use crate::chord::{Chord, ChordType};
use crate::morph::{MorphWeights, ScoredChord};
use crate::palette::{chromatic_palette, GRID_PADS};
use crate::pitch::{MidiNote, NoteLetter, PitchClass};

pub const STATE_VERSION: i64 = 1;

/// Everything needed to restore the pad grid and the morph that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct PersistentState {
    pub grid_chords: [Chord; GRID_PADS],
    pub roman_numerals: [String; GRID_PADS],
    pub last_played: Chord,
    pub last_voicing: Vec<MidiNote>,
    pub progression: Vec<Chord>,
    pub weights: MorphWeights,
    pub has_morphed: bool,
}

impl Default for PersistentState {
    fn default() -> Self {
        PersistentState {
            grid_chords: chromatic_palette(),
            roman_numerals: std::array::from_fn(|_| String::new()),
            last_played: Chord::default(),
            last_voicing: vec![],
            progression: vec![],
            weights: MorphWeights::default(),
            has_morphed: false,
        }
    }
}

impl PersistentState {
    /// Lays the leading morph results onto the grid and remembers what they
    /// were computed from.
    pub fn apply_morph(&mut self, reference: &Chord, voicing: &[MidiNote], results: &[ScoredChord]) {
        for (pad, scored) in results.iter().take(GRID_PADS).enumerate() {
            self.grid_chords[pad] = scored.chord();
            self.roman_numerals[pad] = scored.roman_numeral().to_string();
        }
        self.last_played = *reference;
        self.last_voicing = voicing.to_vec();
        self.has_morphed = true;
    }
}

/// SQLite-backed storage for a single `PersistentState`.
#[derive(Clone, Debug)]
pub struct StateStore {
    filename: PathBuf,
}

impl StateStore {
    pub fn new<P: AsRef<Path>>(filename: P) -> Self {
        StateStore {
            filename: filename.as_ref().to_path_buf(),
        }
    }

    pub fn filename(&self) -> &Path {
        self.filename.as_path()
    }

    fn get_connection(&self) -> anyhow::Result<Connection> {
        let connection = sqlite::open(self.filename.as_path())?;
        connection.execute("CREATE TABLE IF NOT EXISTS state_meta (version INTEGER, saved_at INTEGER);")?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS pads (idx INTEGER, letter INTEGER, accidental INTEGER, chord_type INTEGER, roman TEXT);",
        )?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS morph_context (letter INTEGER, accidental INTEGER, chord_type INTEGER, voicing TEXT);",
        )?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS progression (position INTEGER, letter INTEGER, accidental INTEGER, chord_type INTEGER);",
        )?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS weights (diatonic FLOAT, common_tones FLOAT, voice_leading FLOAT);",
        )?;
        Ok(connection)
    }

    /// Replaces whatever was stored before. Nothing is written unless every
    /// table is written.
    pub fn save(&self, state: &PersistentState) -> anyhow::Result<()> {
        let connection = self.get_connection()?;
        connection.execute("BEGIN TRANSACTION;")?;
        let written = Self::write_state(&connection, state);
        Self::finish_transaction(&connection, written)?;
        info!(
            path = %self.filename.display(),
            progression = state.progression.len(),
            has_morphed = state.has_morphed,
            "state saved"
        );
        Ok(())
    }

    /// Commits on success. On failure rolls back and returns the write error,
    /// with any rollback error attached as context.
    fn finish_transaction(connection: &Connection, written: anyhow::Result<()>) -> anyhow::Result<()> {
        match written {
            Ok(()) => {
                connection.execute("COMMIT;")?;
                Ok(())
            }
            Err(e) => match connection.execute("ROLLBACK;") {
                Ok(()) => Err(e),
                Err(rollback) => Err(e.context(format!("rollback failed: {rollback}"))),
            },
        }
    }

    fn write_state(connection: &Connection, state: &PersistentState) -> anyhow::Result<()> {
        for table in ["state_meta", "pads", "morph_context", "progression", "weights"] {
            connection.execute(format!("DELETE FROM {table};"))?;
        }

        let mut statement = connection.prepare("INSERT INTO state_meta (version, saved_at) VALUES (?, ?)")?;
        statement.bind((1, STATE_VERSION))?;
        statement.bind((2, Utc::now().timestamp()))?;
        statement.next()?;

        for (idx, (chord, roman)) in state.grid_chords.iter().zip(state.roman_numerals.iter()).enumerate() {
            let mut statement = connection
                .prepare("INSERT INTO pads (idx, letter, accidental, chord_type, roman) VALUES (?, ?, ?, ?, ?)")?;
            statement.bind((1, idx as i64))?;
            bind_chord(&mut statement, 2, chord)?;
            statement.bind((5, roman.as_str()))?;
            statement.next()?;
        }

        if state.has_morphed {
            let mut statement = connection.prepare(
                "INSERT INTO morph_context (letter, accidental, chord_type, voicing) VALUES (?, ?, ?, ?)",
            )?;
            bind_chord(&mut statement, 1, &state.last_played)?;
            statement.bind((4, voicing_to_string(&state.last_voicing).as_str()))?;
            statement.next()?;
        }

        for (position, chord) in state.progression.iter().enumerate() {
            let mut statement = connection
                .prepare("INSERT INTO progression (position, letter, accidental, chord_type) VALUES (?, ?, ?, ?)")?;
            statement.bind((1, position as i64))?;
            bind_chord(&mut statement, 2, chord)?;
            statement.next()?;
        }

        let mut statement =
            connection.prepare("INSERT INTO weights (diatonic, common_tones, voice_leading) VALUES (?, ?, ?)")?;
        statement.bind((1, state.weights.diatonic))?;
        statement.bind((2, state.weights.common_tones))?;
        statement.bind((3, state.weights.voice_leading))?;
        statement.next()?;
        Ok(())
    }

    /// The stored state, or the default when nothing usable has been saved.
    pub fn load(&self) -> anyhow::Result<PersistentState> {
        let connection = self.get_connection()?;
        let mut state = PersistentState::default();
        match Self::stored_version(&connection)? {
            Some(version) if version >= STATE_VERSION => {}
            _ => return Ok(state),
        }

        let mut statement = connection.prepare("SELECT idx, letter, accidental, chord_type, roman FROM pads")?;
        while let State::Row = statement.next()? {
            let idx = statement.read::<i64, usize>(0)?;
            if !(0..GRID_PADS as i64).contains(&idx) {
                continue;
            }
            state.grid_chords[idx as usize] = read_chord(&statement, 1)?;
            state.roman_numerals[idx as usize] = statement.read::<String, usize>(4)?;
        }

        let mut statement = connection.prepare("SELECT letter, accidental, chord_type, voicing FROM morph_context")?;
        if let State::Row = statement.next()? {
            state.last_played = read_chord(&statement, 0)?;
            state.last_voicing = voicing_from_str(&statement.read::<String, usize>(3)?)?;
            state.has_morphed = true;
        }

        let mut statement =
            connection.prepare("SELECT letter, accidental, chord_type FROM progression ORDER BY position")?;
        while let State::Row = statement.next()? {
            state.progression.push(read_chord(&statement, 0)?);
        }

        let mut statement = connection.prepare("SELECT diatonic, common_tones, voice_leading FROM weights")?;
        if let State::Row = statement.next()? {
            state.weights = MorphWeights::new(
                statement.read::<f64, usize>(0)?,
                statement.read::<f64, usize>(1)?,
                statement.read::<f64, usize>(2)?,
            );
        }

        info!(path = %self.filename.display(), has_morphed = state.has_morphed, "state loaded");
        Ok(state)
    }

    /// When the stored state was written, if ever.
    pub fn last_saved(&self) -> anyhow::Result<Option<DateTime<Local>>> {
        let connection = self.get_connection()?;
        let mut statement = connection.prepare("SELECT saved_at FROM state_meta")?;
        match statement.next()? {
            State::Row => {
                let timestamp = statement.read::<i64, usize>(0)?;
                Ok(Local.timestamp_opt(timestamp, 0).single())
            }
            State::Done => Ok(None),
        }
    }

    fn stored_version(connection: &Connection) -> anyhow::Result<Option<i64>> {
        let mut statement = connection.prepare("SELECT version FROM state_meta")?;
        match statement.next()? {
            State::Row => Ok(Some(statement.read::<i64, usize>(0)?)),
            State::Done => Ok(None),
        }
    }
}

fn bind_chord(statement: &mut Statement, first: usize, chord: &Chord) -> anyhow::Result<()> {
    statement.bind((first, chord.root().letter().ordinal() as i64))?;
    statement.bind((first + 1, chord.root().accidental() as i64))?;
    statement.bind((first + 2, chord.chord_type().ordinal() as i64))?;
    Ok(())
}

fn read_chord(statement: &Statement, first: usize) -> anyhow::Result<Chord> {
    let letter = statement.read::<i64, usize>(first)?;
    let accidental = statement.read::<i64, usize>(first + 1)?;
    let chord_type = statement.read::<i64, usize>(first + 2)?;
    let letter = usize::try_from(letter)
        .ok()
        .and_then(NoteLetter::from_ordinal)
        .ok_or_else(|| anyhow!("Invalid note letter ordinal {letter}"))?;
    let chord_type = usize::try_from(chord_type)
        .ok()
        .and_then(ChordType::from_ordinal)
        .ok_or_else(|| anyhow!("Invalid chord type ordinal {chord_type}"))?;
    Ok(Chord::new(PitchClass::new(letter, i8::try_from(accidental)?), chord_type))
}

fn voicing_to_string(voicing: &[MidiNote]) -> String {
    voicing.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",")
}

fn voicing_from_str(s: &str) -> anyhow::Result<Vec<MidiNote>> {
    let mut voicing = vec![];
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<MidiNote>() {
            Ok(note) => voicing.push(note),
            Err(e) => bail!("Bad voicing entry '{part}': {e}"),
        }
    }
    Ok(voicing)
}
