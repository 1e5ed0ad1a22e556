//! Typed views over raw event payloads.
//!
//! Each type here is a thin wrapper over a fixed-size byte array, laid out exactly like the
//! payload it describes.
//! Events hand out shared or mutable references to these wrappers (see for example
//! [`Event::tempo`](../struct.Event.html#method.tempo)), so reading or writing a field touches
//! the payload bytes directly.

use crate::prelude::*;

/// Define a payload view over a byte array of a fixed length.
macro_rules! payload_type {
    {$(#[$attr:meta])* $name:ident: $len:expr} => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
        #[repr(transparent)]
        pub struct $name([u8; $len]);
        impl $name {
            /// The length in bytes of this payload.
            pub const LEN: usize = $len;

            /// Wrap raw payload bytes.
            #[inline]
            pub const fn from_bytes(raw: [u8; $len]) -> $name {
                $name(raw)
            }

            /// The raw payload bytes.
            #[inline]
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            #[inline]
            pub(crate) fn from_slice(raw: &[u8]) -> Option<&$name> {
                let arr = <&[u8; $len]>::try_from(raw).ok()?;
                // SAFETY: `$name` is a `repr(transparent)` wrapper over `[u8; $len]`.
                Some(unsafe { &*(arr as *const [u8; $len] as *const $name) })
            }

            #[inline]
            pub(crate) fn from_slice_mut(raw: &mut [u8]) -> Option<&mut $name> {
                let arr = <&mut [u8; $len]>::try_from(raw).ok()?;
                // SAFETY: `$name` is a `repr(transparent)` wrapper over `[u8; $len]`.
                Some(unsafe { &mut *(arr as *mut [u8; $len] as *mut $name) })
            }
        }
        impl From<$name> for Vec<u8> {
            #[inline]
            fn from(field: $name) -> Vec<u8> {
                field.0.to_vec()
            }
        }
    };
}

payload_type! {
    /// The payload of `NoteOn`, `NoteOff` and `AfterTouch` messages: a key and a velocity (or
    /// pressure).
    Note: 2
}
impl Note {
    #[inline]
    pub fn new(pitch: u7, velocity: u7) -> Note {
        Note([pitch.as_int(), velocity.as_int()])
    }

    /// The key, from 0 to 127.
    #[inline]
    pub fn pitch(&self) -> u7 {
        u7::new(self.0[0])
    }

    #[inline]
    pub fn set_pitch(&mut self, pitch: u7) {
        self.0[0] = pitch.as_int();
    }

    /// The velocity of a `NoteOn`/`NoteOff`, or the pressure of an `AfterTouch`.
    #[inline]
    pub fn velocity(&self) -> u7 {
        u7::new(self.0[1])
    }

    #[inline]
    pub fn set_velocity(&mut self, velocity: u7) {
        self.0[1] = velocity.as_int();
    }
}

payload_type! {
    /// The payload of a `ControlChange` message.
    Control: 2
}
impl Control {
    #[inline]
    pub fn new(control: u7, value: u7) -> Control {
        Control([control.as_int(), value.as_int()])
    }

    /// The controller number.
    #[inline]
    pub fn control(&self) -> u7 {
        u7::new(self.0[0])
    }

    #[inline]
    pub fn set_control(&mut self, control: u7) {
        self.0[0] = control.as_int();
    }

    #[inline]
    pub fn value(&self) -> u7 {
        u7::new(self.0[1])
    }

    #[inline]
    pub fn set_value(&mut self, value: u7) {
        self.0[1] = value.as_int();
    }
}

payload_type! {
    /// The single-byte payload of `ProgramChange` and `ChannelAfterTouch` messages.
    Value: 1
}
impl Value {
    #[inline]
    pub fn new(value: u7) -> Value {
        Value([value.as_int()])
    }

    #[inline]
    pub fn value(&self) -> u7 {
        u7::new(self.0[0])
    }

    #[inline]
    pub fn set_value(&mut self, value: u7) {
        self.0[0] = value.as_int();
    }
}

payload_type! {
    /// The payload of a `PitchWheel` message: a 14-bit value, least significant 7 bits first.
    ///
    /// The raw value is centered at `0x2000`, which means "no bend".
    PitchBend: 2
}
impl PitchBend {
    /// Smallest signed bend.
    pub const MIN: i16 = -0x2000;
    /// Largest signed bend.
    pub const MAX: i16 = 0x1FFF;

    /// Create a pitch bend from a signed value, clamped to `[-8192, 8191]`.
    #[inline]
    pub fn from_value(value: i16) -> PitchBend {
        let mut bend = PitchBend::default();
        bend.set_value(value);
        bend
    }

    /// The raw, unsigned 14-bit value.
    #[inline]
    pub fn raw(&self) -> u14 {
        u14::new(((self.0[1] as u16 & 0x7F) << 7) | (self.0[0] as u16 & 0x7F))
    }

    #[inline]
    pub fn set_raw(&mut self, raw: u14) {
        let raw = raw.as_int();
        self.0 = [(raw & 0x7F) as u8, (raw >> 7) as u8];
    }

    /// The bend as a signed value, `0` being the center.
    #[inline]
    pub fn value(&self) -> i16 {
        self.raw().as_int() as i16 - 0x2000
    }

    /// Set the bend from a signed value, clamping it to `[-8192, 8191]`.
    #[inline]
    pub fn set_value(&mut self, value: i16) {
        let value = value.max(Self::MIN).min(Self::MAX);
        self.set_raw(u14::new((value + 0x2000) as u16));
    }
}

payload_type! {
    /// The payload of a `SequenceNumber` meta event.
    SequenceNumber: 2
}
impl SequenceNumber {
    #[inline]
    pub fn new(number: u16) -> SequenceNumber {
        SequenceNumber(number.to_be_bytes())
    }

    #[inline]
    pub fn number(&self) -> u16 {
        u16::from_be_bytes(self.0)
    }

    #[inline]
    pub fn set_number(&mut self, number: u16) {
        self.0 = number.to_be_bytes();
    }
}

payload_type! {
    /// The payload of a `SetTempo` meta event: microseconds per quarter note, as a big-endian
    /// 24-bit integer.
    Tempo: 3
}
impl Tempo {
    const MICROS_PER_MINUTE: f64 = 60_000_000.0;

    #[inline]
    pub fn from_mpqn(mpqn: u24) -> Tempo {
        let mut tempo = Tempo::default();
        tempo.set_mpqn(mpqn);
        tempo
    }

    /// Create a tempo from beats per minute.
    ///
    /// The stored value is `floor(60_000_000 / bpm)`, saturating at the 24-bit maximum.
    #[inline]
    pub fn from_bpm(bpm: f64) -> Tempo {
        let mut tempo = Tempo::default();
        tempo.set_bpm(bpm);
        tempo
    }

    /// Microseconds per quarter note.
    #[inline]
    pub fn mpqn(&self) -> u24 {
        u24::new(u32::from_be_bytes([0, self.0[0], self.0[1], self.0[2]]))
    }

    #[inline]
    pub fn set_mpqn(&mut self, mpqn: u24) {
        let [_, a, b, c] = mpqn.as_int().to_be_bytes();
        self.0 = [a, b, c];
    }

    /// Beats (quarter notes) per minute.
    ///
    /// A zero tempo yields infinity.
    #[inline]
    pub fn bpm(&self) -> f64 {
        Self::MICROS_PER_MINUTE / self.mpqn().as_int() as f64
    }

    #[inline]
    pub fn set_bpm(&mut self, bpm: f64) {
        // Float to int casts saturate, which takes care of zero and negative tempos
        let mpqn = (Self::MICROS_PER_MINUTE / bpm).floor() as u32;
        self.set_mpqn(u24::new(mpqn.min(u24::max_value().as_int())));
    }
}

payload_type! {
    /// The payload of a `TimeSignature` meta event.
    ///
    /// The denominator is stored as a power of two.
    TimeSignature: 4
}
impl TimeSignature {
    /// Create a time signature.
    ///
    /// `metronome` is the amount of MIDI clocks per metronome click, and `thirty_seconds` the
    /// amount of 32nd notes per quarter note (usually 8).
    pub fn new(
        numerator: u8,
        denominator: u32,
        metronome: u8,
        thirty_seconds: u8,
    ) -> TimeSignature {
        let mut sig = TimeSignature([numerator, 0, metronome, thirty_seconds]);
        sig.set_denominator(denominator);
        sig
    }

    #[inline]
    pub fn numerator(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn set_numerator(&mut self, numerator: u8) {
        self.0[0] = numerator;
    }

    /// The denominator, `2` raised to the stored exponent.
    ///
    /// Yields 0 if the stored exponent is too large to represent.
    #[inline]
    pub fn denominator(&self) -> u32 {
        1u32.checked_shl(self.0[1] as u32).unwrap_or(0)
    }

    /// Set the denominator, rounding it to the nearest power of two.
    #[inline]
    pub fn set_denominator(&mut self, denominator: u32) {
        self.0[1] = (denominator.max(1) as f64).log2().round() as u8;
    }

    #[inline]
    pub fn metronome(&self) -> u8 {
        self.0[2]
    }

    #[inline]
    pub fn set_metronome(&mut self, metronome: u8) {
        self.0[2] = metronome;
    }

    #[inline]
    pub fn thirty_seconds(&self) -> u8 {
        self.0[3]
    }

    #[inline]
    pub fn set_thirty_seconds(&mut self, thirty_seconds: u8) {
        self.0[3] = thirty_seconds;
    }
}

payload_type! {
    /// The payload of a `KeySignature` meta event.
    KeySignature: 2
}
impl KeySignature {
    #[inline]
    pub fn new(alternatives: i8, minor: bool) -> KeySignature {
        KeySignature([alternatives as u8, minor as u8])
    }

    /// Amount of sharps if positive, or flats if negative.
    #[inline]
    pub fn alternatives(&self) -> i8 {
        self.0[0] as i8
    }

    #[inline]
    pub fn set_alternatives(&mut self, alternatives: i8) {
        self.0[0] = alternatives as u8;
    }

    /// Whether the key is minor.
    #[inline]
    pub fn minor(&self) -> bool {
        self.0[1] != 0
    }

    #[inline]
    pub fn set_minor(&mut self, minor: bool) {
        self.0[1] = minor as u8;
    }
}
