//! The closed catalogue of event types.
//!
//! Every event belongs to one of three families, and within each family it is identified by a
//! single key byte:
//!
//! - Channel-voice messages are keyed by the top nibble of their status byte (`0x80..=0xE0`).
//! - Meta events share the `0xFF` status byte and are keyed by their metacommand (`0x00..=0x7F`).
//! - System exclusive dumps have a single type, keyed by the `0xF0` status byte.

use crate::prelude::*;

/// Status byte introducing every meta event.
pub(crate) const META_STATUS: u8 = 0xFF;
/// Status byte introducing a system exclusive dump.
pub(crate) const SYSEX_STATUS: u8 = 0xF0;
/// Byte terminating a system exclusive dump.
pub(crate) const SYSEX_END: u8 = 0xF7;

/// The three families of events.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Family {
    /// Messages addressed to one of the 16 MIDI channels.
    Channel,
    /// Track annotations, introduced by `0xFF`.
    Meta,
    /// Manufacturer-defined dumps, introduced by `0xF0`.
    SysEx,
}

/// How the length of an event payload is determined.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Length {
    /// The payload always has exactly this many bytes.
    Fixed(usize),
    /// The payload is prefixed by a varlen length.
    Variable,
    /// The payload runs until a `0xF7` terminator, which is not part of the payload.
    Terminated,
}
impl Length {
    /// Whether a payload of `len` bytes satisfies this rule.
    ///
    /// The terminator rule also restricts payload contents, which this method cannot check.
    #[inline]
    pub fn accepts(self, len: usize) -> bool {
        match self {
            Length::Fixed(fixed) => len == fixed,
            Length::Variable => len <= VARLEN_MAX as usize,
            Length::Terminated => true,
        }
    }
}

/// Define a family enum along with its key, name and length tables.
macro_rules! catalog {
    {
        $(#[$attr:meta])*
        pub enum $name:ident : $key:ident {
            $( $(#[$vattr:meta])* $variant:ident = $code:expr, $label:expr, $len:expr; )*
        }
    } => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
        pub enum $name {
            $( $(#[$vattr])* $variant, )*
        }
        impl $name {
            /// Every type in this family, in catalogue order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )* ];

            /// The identity key of this type within its family.
            #[inline]
            pub fn $key(self) -> u8 {
                match self {
                    $( $name::$variant => $code, )*
                }
            }

            /// A human-readable name.
            #[inline]
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )*
                }
            }

            /// The length rule of the payload.
            #[inline]
            pub fn length(self) -> Length {
                match self {
                    $( $name::$variant => $len, )*
                }
            }
        }
        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

catalog! {
    /// Channel-voice message types.
    ///
    /// The status byte of these messages is `status() | channel`.
    pub enum ChannelType: status {
        /// Stop playing a note.
        NoteOff = 0x80, "Note Off", Length::Fixed(2);
        /// Start playing a note.
        ///
        /// By convention a velocity of 0 is equivalent to a `NoteOff`.
        NoteOn = 0x90, "Note On", Length::Fixed(2);
        /// Modify the pressure on a single held note.
        AfterTouch = 0xA0, "After Touch", Length::Fixed(2);
        /// Set a MIDI controller to a value.
        ControlChange = 0xB0, "Control Change", Length::Fixed(2);
        /// Change the program (instrument) of the channel.
        ProgramChange = 0xC0, "Program Change", Length::Fixed(1);
        /// Modify the pressure on every note of the channel at once.
        ChannelAfterTouch = 0xD0, "Channel After Touch", Length::Fixed(1);
        /// Bend the pitch of the whole channel.
        PitchWheel = 0xE0, "Pitch Wheel", Length::Fixed(2);
    }
}
impl ChannelType {
    /// The amount of data bytes following the status byte.
    #[inline]
    pub fn data_len(self) -> usize {
        match self.length() {
            Length::Fixed(len) => len,
            _ => unreachable!("channel messages always have a fixed length"),
        }
    }
}

catalog! {
    /// Meta event types.
    pub enum MetaType: command {
        /// The number of a sequence, as a big-endian 16-bit integer.
        SequenceNumber = 0x00, "Sequence Number", Length::Fixed(2);
        /// Arbitrary text.
        Text = 0x01, "Text", Length::Variable;
        /// A copyright notice.
        Copyright = 0x02, "Copyright Notice", Length::Variable;
        /// The name of the track, or of the sequence in the first track.
        TrackName = 0x03, "Track Name", Length::Variable;
        /// The name of the instrument used in this track.
        InstrumentName = 0x04, "Instrument Name", Length::Variable;
        /// A lyric syllable.
        Lyrics = 0x05, "Lyrics", Length::Variable;
        /// A rehearsal letter or section name.
        Marker = 0x06, "Marker", Length::Variable;
        /// A description of something happening on stage.
        CuePoint = 0x07, "Cue Point", Length::Variable;
        /// The name of the program in use.
        ProgramName = 0x08, "Program Name", Length::Variable;
        /// The name of the device this track is intended for.
        DeviceName = 0x09, "Device Name", Length::Variable;
        /// The channel that the following meta and sysex events refer to.
        ChannelPrefix = 0x20, "Channel Prefix", Length::Fixed(1);
        /// The output port or cable. Kept as an opaque payload.
        MidiPort = 0x21, "MIDI Port/Cable", Length::Variable;
        /// Non-standard loop marker.
        TrackLoop = 0x2E, "Track Loop", Length::Fixed(0);
        /// The mandatory last event of a track.
        EndOfTrack = 0x2F, "End of Track", Length::Fixed(0);
        /// Microseconds per quarter note, as a big-endian 24-bit integer.
        SetTempo = 0x51, "Set Tempo", Length::Fixed(3);
        /// The SMPTE time at which the track starts. Kept as an opaque payload.
        SmpteOffset = 0x54, "SMPTE Offset", Length::Variable;
        /// Numerator, log2 of the denominator, clocks per click and 32nd notes per quarter.
        TimeSignature = 0x58, "Time Signature", Length::Fixed(4);
        /// Signed count of sharps (positive) or flats (negative), and a major/minor flag.
        KeySignature = 0x59, "Key Signature", Length::Fixed(2);
        /// Arbitrary data intended for a specific sequencer.
        SequencerSpecific = 0x7F, "Sequencer Specific", Length::Variable;
    }
}
impl MetaType {
    /// Whether the payload of this type is text.
    #[inline]
    pub fn is_text(self) -> bool {
        matches!(self.command(), 0x01..=0x09)
    }
}

/// The type of an event, out of the closed catalogue.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventType {
    /// A channel-voice message.
    Channel(ChannelType),
    /// A meta event.
    Meta(MetaType),
    /// A system exclusive dump.
    SysEx,
}
impl EventType {
    /// Iterate over every event type in the catalogue.
    pub fn catalog() -> impl Iterator<Item = EventType> {
        ChannelType::ALL
            .iter()
            .map(|&ty| EventType::Channel(ty))
            .chain(MetaType::ALL.iter().map(|&ty| EventType::Meta(ty)))
            .chain(Some(EventType::SysEx))
    }

    /// The family this type belongs to.
    #[inline]
    pub fn family(self) -> Family {
        match self {
            EventType::Channel(_) => Family::Channel,
            EventType::Meta(_) => Family::Meta,
            EventType::SysEx => Family::SysEx,
        }
    }

    /// The identity key of this type within its family.
    #[inline]
    pub fn key(self) -> u8 {
        match self {
            EventType::Channel(ty) => ty.status(),
            EventType::Meta(ty) => ty.command(),
            EventType::SysEx => SYSEX_STATUS,
        }
    }

    /// A human-readable name.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            EventType::Channel(ty) => ty.name(),
            EventType::Meta(ty) => ty.name(),
            EventType::SysEx => "SysEx",
        }
    }

    /// The length rule of the payload.
    #[inline]
    pub fn length(self) -> Length {
        match self {
            EventType::Channel(ty) => ty.length(),
            EventType::Meta(ty) => ty.length(),
            EventType::SysEx => Length::Terminated,
        }
    }
}
impl From<ChannelType> for EventType {
    #[inline]
    fn from(ty: ChannelType) -> EventType {
        EventType::Channel(ty)
    }
}
impl From<MetaType> for EventType {
    #[inline]
    fn from(ty: MetaType) -> EventType {
        EventType::Meta(ty)
    }
}
impl fmt::Display for EventType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
