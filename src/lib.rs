//! # Overview
//!
//! `smfio` decodes and encodes Standard Midi Files (`.mid` files).
//!
//! Reading a file is as simple as:
//!
//! ```rust,no_run
//! let pattern = smfio::read_file("song.mid").unwrap();
//!
//! for (i, track) in pattern.tracks.iter().enumerate() {
//!     println!("track {} has {} events", i, track.len());
//! }
//! ```
//!
//! The [`Pattern`](struct.Pattern.html) struct is the main type in the crate: a format selector,
//! a resolution in ticks per quarter note and an ordered list of [`Track`](struct.Track.html)s,
//! each one an ordered list of [`Event`](struct.Event.html)s.
//!
//! # Writing Standard Midi Files
//!
//! Patterns can be built by hand and written to any `std::io::Write` sink:
//!
//! ```rust
//! use smfio::{num::{u4, u7}, fields::Tempo, Event, Format, Pattern, Track};
//!
//! let mut track = Track::new();
//! track.push(Event::with_tempo(0, Tempo::from_bpm(120.0)));
//! track.push(Event::note_on(0, u4::new(0), u7::new(60), u7::new(100)));
//! track.push(Event::note_off(96, u4::new(0), u7::new(60), u7::new(0)));
//! track.push(Event::end_of_track(0));
//!
//! let mut pattern = Pattern::new(Format::SingleTrack, 96);
//! pattern.tracks.push(track);
//!
//! let mut in_memory = Vec::new();
//! pattern.write(&mut in_memory).unwrap();
//! assert_eq!(Pattern::parse(&in_memory).unwrap(), pattern);
//! ```
//!
//! # The event catalogue
//!
//! Every event has an [`EventType`](enum.EventType.html) out of a closed catalogue, split in three
//! families: channel-voice messages, meta events and system exclusive dumps.
//! The bytes of an event are kept raw, and typed views (see the [`fields`](fields/index.html)
//! module) reinterpret them as pitches, tempos, time signatures and so on.
//!
//! Status bytes are resolved to event types through a [`Registry`](struct.Registry.html), which
//! is validated once on construction.
//! The [`Reader`](struct.Reader.html) and [`Writer`](struct.Writer.html) types take a registry by
//! reference; the free functions and `Pattern` methods use [`Registry::standard`].
//!
//! # About features
//!
//! - The `parallel` feature (enabled by default)
//!
//!   Tracks do not share any decoding state, so large files are decoded and encoded one track per
//!   thread through the `rayon` dependency.
//!   Results are identical to the single-threaded path.

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors this crate produces.
mod error;

mod prelude {
    pub(crate) use crate::{
        catalog::{ChannelType, EventType, MetaType},
        error::{Error, ErrorKind, Result, ResultExt, StdResult},
        primitive::{
            read_slice, read_u16, read_u32, read_u8, read_varlen, read_varlen_slice,
            write_varlen, write_varlen_slice, u14, u24, u4, u7, VARLEN_MAX,
        },
        registry::Registry,
    };
    pub(crate) use core::{convert::TryFrom, fmt};
    pub(crate) use std::{fs::File, io, path::Path};
}

mod catalog;
mod event;
pub mod fields;
mod primitive;
mod registry;
mod smf;

pub use crate::{
    catalog::{ChannelType, EventType, Family, Length, MetaType},
    error::{Error, ErrorKind, Result},
    event::Event,
    registry::Registry,
    smf::{EventIter, Format, Pattern, Reader, Track, Writer},
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::{u14, u24, u4, u7};
}

/// The variable-length integers used for delta times and payload lengths.
///
/// Each byte carries 7 bits of the value, most significant group first, and has its top bit set
/// if more bytes follow.
/// At most 4 bytes (28 bits) are accepted.
pub mod varlen {
    pub use crate::primitive::{decode_varlen as decode, encode_varlen as encode, VARLEN_MAX as MAX};
}

/// Read and decode the Standard Midi File at the given path.
///
/// Equivalent to [`Pattern::open`](struct.Pattern.html#method.open).
#[inline]
pub fn read_file<P: AsRef<std::path::Path>>(path: P) -> Result<Pattern> {
    Pattern::open(path)
}

/// Encode a pattern and write it to the given path, replacing any existing file.
///
/// Equivalent to [`Pattern::save`](struct.Pattern.html#method.save).
#[inline]
pub fn write_file<P: AsRef<std::path::Path>>(path: P, pattern: &Pattern) -> Result<()> {
    pattern.save(path)
}
