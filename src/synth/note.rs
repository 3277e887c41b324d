#![allow(non_upper_case_globals)]

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/*
Playable Notes
==============

The keyboard covers a fixed alphabet of 37 notes, C3 (MIDI 48) through
C6 (MIDI 84). Each note maps 1:1 to a frequency in the constant table below
(twelve-tone equal temperament, A4 = 440 Hz):

    f = 440 · 2^((note - 69) / 12)

The MIDI formula: note_number = 12 * (octave + 1) + semitone
Where semitone: C=0, C#=1, D=2, D#=3, E=4, F=5, F#=6, G=7, G#=8, A=9, A#=10, B=11

Naming Convention:
- Natural notes: C4, D4, E4, etc.
- Sharps: Cs4 (C#4), Ds4 (D#4), etc.
- Flats: Db4, Eb4, etc. (aliases for the same MIDI notes as sharps)

Anything outside the alphabet is not a NoteId. Input layers convert with
`NoteId::from_midi` / `str::parse` and drop what does not convert.
*/

pub const LOWEST: u8 = 48;
pub const HIGHEST: u8 = 84;

// Octave 3
pub const C3: u8 = 48;
pub const Cs3: u8 = 49;
pub const Db3: u8 = 49;
pub const D3: u8 = 50;
pub const Ds3: u8 = 51;
pub const Eb3: u8 = 51;
pub const E3: u8 = 52;
pub const F3: u8 = 53;
pub const Fs3: u8 = 54;
pub const Gb3: u8 = 54;
pub const G3: u8 = 55;
pub const Gs3: u8 = 56;
pub const Ab3: u8 = 56;
pub const A3: u8 = 57;
pub const As3: u8 = 58;
pub const Bb3: u8 = 58;
pub const B3: u8 = 59;

// Octave 4 (Middle C octave)
pub const C4: u8 = 60;
pub const Cs4: u8 = 61;
pub const Db4: u8 = 61;
pub const D4: u8 = 62;
pub const Ds4: u8 = 63;
pub const Eb4: u8 = 63;
pub const E4: u8 = 64;
pub const F4: u8 = 65;
pub const Fs4: u8 = 66;
pub const Gb4: u8 = 66;
pub const G4: u8 = 67;
pub const Gs4: u8 = 68;
pub const Ab4: u8 = 68;
pub const A4: u8 = 69; // A440 tuning reference
pub const As4: u8 = 70;
pub const Bb4: u8 = 70;
pub const B4: u8 = 71;

// Octave 5
pub const C5: u8 = 72;
pub const Cs5: u8 = 73;
pub const Db5: u8 = 73;
pub const D5: u8 = 74;
pub const Ds5: u8 = 75;
pub const Eb5: u8 = 75;
pub const E5: u8 = 76;
pub const F5: u8 = 77;
pub const Fs5: u8 = 78;
pub const Gb5: u8 = 78;
pub const G5: u8 = 79;
pub const Gs5: u8 = 80;
pub const Ab5: u8 = 80;
pub const A5: u8 = 81;
pub const As5: u8 = 82;
pub const Bb5: u8 = 82;
pub const B5: u8 = 83;

// Octave 6
pub const C6: u8 = 84;

const FREQUENCIES: [f32; (HIGHEST - LOWEST + 1) as usize] = [
    130.8128, // C3
    138.5913, // Cs3
    146.8324, // D3
    155.5635, // Ds3
    164.8138, // E3
    174.6141, // F3
    184.9972, // Fs3
    195.9977, // G3
    207.6523, // Gs3
    220.0000, // A3
    233.0819, // As3
    246.9417, // B3
    261.6256, // C4
    277.1826, // Cs4
    293.6648, // D4
    311.1270, // Ds4
    329.6276, // E4
    349.2282, // F4
    369.9944, // Fs4
    391.9954, // G4
    415.3047, // Gs4
    440.0000, // A4
    466.1638, // As4
    493.8833, // B4
    523.2511, // C5
    554.3653, // Cs5
    587.3295, // D5
    622.2540, // Ds5
    659.2551, // E5
    698.4565, // F5
    739.9888, // Fs5
    783.9909, // G5
    830.6094, // Gs5
    880.0000, // A5
    932.3275, // As5
    987.7666, // B5
    1046.5023, // C6
];

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A note inside the playable alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(u8);

impl NoteId {
    /// `None` for MIDI numbers outside the alphabet.
    pub fn from_midi(note: u8) -> Option<Self> {
        (LOWEST..=HIGHEST).contains(&note).then_some(Self(note))
    }

    pub fn midi(&self) -> u8 {
        self.0
    }

    /// Fixed frequency in Hz.
    pub fn frequency(&self) -> f32 {
        FREQUENCIES[(self.0 - LOWEST) as usize]
    }

    pub fn octave(&self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Every note of the alphabet, lowest first.
    pub fn all() -> impl Iterator<Item = NoteId> {
        (LOWEST..=HIGHEST).map(NoteId)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SHARP_NAMES[(self.0 % 12) as usize], self.octave())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a playable note")]
pub struct UnknownNote(pub String);

impl FromStr for NoteId {
    type Err = UnknownNote;

    /// Accepts `C4`, `C#4`, `Cs4` and `Db4` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownNote(s.to_string());
        let mut chars = s.trim().chars();

        let semitone: i32 = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(unknown()),
        };

        let rest = chars.as_str();
        let (accidental, octave) = match rest.chars().next() {
            Some('#') | Some('s') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };

        let octave: i32 = octave.parse().map_err(|_| unknown())?;
        let midi = 12 * (octave + 1) + semitone + accidental;
        u8::try_from(midi)
            .ok()
            .and_then(NoteId::from_midi)
            .ok_or_else(unknown)
    }
}
