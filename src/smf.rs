//! Whole-file reading and writing, along with the in-memory pattern and track containers.

use crate::{event::RunningStatus, prelude::*, Event};
use tracing::{debug, trace, warn};

/// How many events per byte to estimate when allocating memory for events while parsing.
///
/// With running status, most tracks are made up of `DeltaTime [+ Status] + Key + Velocity`
/// note messages, which average a little above 3 bytes per event.
const BYTES_TO_EVENTS: f32 = 1.0 / 3.0;

/// How many bytes per event to estimate when allocating memory when writing.
///
/// Text-heavy tracks go over this estimate, but they are usually small enough that reallocating
/// does not matter.
const EVENTS_TO_BYTES: f32 = 3.4;

/// How many bytes must a MIDI body have in order to enable multithreading.
///
/// When writing, the MIDI body size is estimated from the event count using `EVENTS_TO_BYTES`.
#[cfg(feature = "parallel")]
const PARALLEL_ENABLE_THRESHOLD: usize = 3 * 1024;

const HEADER_MAGIC: &[u8; 4] = b"MThd";
const TRACK_MAGIC: &[u8; 4] = b"MTrk";
const HEADER_LEN: u32 = 6;

/// The layout of the tracks in a file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    /// A single track holding every channel.
    SingleTrack,
    /// Several tracks played simultaneously.
    Parallel,
    /// Several independent tracks, played one after the other.
    Sequential,
}
impl Format {
    /// Decode the format field of a file header.
    ///
    /// Fails with `BadFileHeader` on anything other than 0, 1 or 2.
    pub fn from_bits(bits: u16) -> Result<Format> {
        Ok(match bits {
            0 => Format::SingleTrack,
            1 => Format::Parallel,
            2 => Format::Sequential,
            _ => bail!(ErrorKind::BadFileHeader),
        })
    }

    #[inline]
    pub fn as_bits(self) -> u16 {
        match self {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
            Format::Sequential => 2,
        }
    }
}

/// An ordered list of events, in execution order.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Default)]
pub struct Track {
    events: Vec<Event>,
}
impl Track {
    #[inline]
    pub fn new() -> Track {
        Track::default()
    }

    /// Append an event at the end of the track.
    #[inline]
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Event> {
        self.events.iter_mut()
    }

    /// Pair every event with its absolute time, the sum of the delta times up to and including
    /// it.
    pub fn absolute_ticks(&self) -> impl Iterator<Item = (u64, &Event)> + '_ {
        self.events.iter().scan(0u64, |abs, ev| {
            *abs += ev.tick() as u64;
            Some((*abs, ev))
        })
    }
}
impl From<Vec<Event>> for Track {
    #[inline]
    fn from(events: Vec<Event>) -> Track {
        Track { events }
    }
}
impl From<Track> for Vec<Event> {
    #[inline]
    fn from(track: Track) -> Vec<Event> {
        track.events
    }
}
impl FromIterator<Event> for Track {
    #[inline]
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Track {
        Track {
            events: iter.into_iter().collect(),
        }
    }
}
impl IntoIterator for Track {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
impl<'a> IntoIterator for &'a Track {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// A decoded Standard Midi File.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct Pattern {
    pub format: Format,
    /// Ticks per quarter note.
    pub resolution: u16,
    pub tracks: Vec<Track>,
}
impl Pattern {
    /// Create a pattern with no tracks.
    #[inline]
    pub fn new(format: Format, resolution: u16) -> Pattern {
        Pattern {
            format,
            resolution,
            tracks: Vec::new(),
        }
    }

    /// Decode a pattern from raw file bytes, using the standard registry.
    #[inline]
    pub fn parse(raw: &[u8]) -> Result<Pattern> {
        Reader::default().parse(raw)
    }

    /// Read a whole byte source and decode it as a pattern.
    #[inline]
    pub fn read<R: io::Read>(src: R) -> Result<Pattern> {
        Reader::default().read(src)
    }

    /// Read and decode the file at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Pattern> {
        fn open_impl(path: &Path) -> Result<Pattern> {
            let file = File::open(path).context("failed to open file")?;
            Pattern::read(file)
        }
        open_impl(path.as_ref())
    }

    /// Encode this pattern into the given byte sink, using the standard registry.
    #[inline]
    pub fn write<W: io::Write>(&self, out: W) -> Result<()> {
        Writer::default().write(self, out)
    }

    /// Encode this pattern into an in-memory buffer.
    #[inline]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Writer::default().to_bytes(self)
    }

    /// Encode this pattern into the file at the given path, replacing it if it exists.
    ///
    /// The pattern is completely encoded before the file is created, so an unencodable pattern
    /// leaves the filesystem untouched.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fn save_impl(pattern: &Pattern, path: &Path) -> Result<()> {
            let raw = pattern.to_bytes()?;
            let mut file = File::create(path).context("failed to create file")?;
            io::Write::write_all(&mut file, &raw)?;
            Ok(())
        }
        save_impl(self, path.as_ref())
    }
}

/// Decodes Standard Midi Files, resolving event types through a registry.
#[derive(Copy, Clone, Debug)]
pub struct Reader<'r> {
    registry: &'r Registry,
}
impl Default for Reader<'static> {
    #[inline]
    fn default() -> Reader<'static> {
        Reader::new(Registry::standard())
    }
}
impl<'r> Reader<'r> {
    #[inline]
    pub fn new(registry: &'r Registry) -> Reader<'r> {
        Reader { registry }
    }

    /// Read a whole byte source and decode it as a pattern.
    ///
    /// The source is consumed up to its end before decoding starts.
    pub fn read<R: io::Read>(&self, mut src: R) -> Result<Pattern> {
        let mut raw = Vec::new();
        src.read_to_end(&mut raw).context("failed to read source")?;
        self.parse(&raw)
    }

    /// Decode a pattern from raw file bytes.
    ///
    /// Every track is decoded, or the first error in file order is returned.
    pub fn parse(&self, mut raw: &[u8]) -> Result<Pattern> {
        let (format, track_count, resolution) =
            read_header(&mut raw).context("failed to read file header")?;
        let mut chunks = Vec::with_capacity(track_count as usize);
        for index in 0..track_count as usize {
            let chunk = read_track_chunk(&mut raw)
                .context("failed to read track header")
                .map_err(|err| err.at_track(index))?;
            chunks.push(chunk);
        }
        if !raw.is_empty() {
            warn!(trailing = raw.len(), "ignoring bytes after the last track");
        }
        let tracks = self.decode_tracks(chunks)?;
        Ok(Pattern {
            format,
            resolution,
            tracks,
        })
    }

    /// Lazily decode the events of a single track, given the contents of its chunk.
    #[inline]
    pub fn events<'a>(&self, track: &'a [u8]) -> EventIter<'a, 'r> {
        EventIter {
            raw: track,
            running_status: None,
            registry: self.registry,
        }
    }

    fn decode_tracks(&self, chunks: Vec<&[u8]>) -> Result<Vec<Track>> {
        let decode = |(index, raw): (usize, &[u8])| -> Result<Track> {
            let track = self.events(raw).into_track().map_err(|err| err.at_track(index))?;
            debug!(track = index, bytes = raw.len(), events = track.len(), "decoded track");
            Ok(track)
        };
        #[cfg(feature = "parallel")]
        {
            if chunks.iter().map(|raw| raw.len()).sum::<usize>() >= PARALLEL_ENABLE_THRESHOLD {
                use rayon::prelude::*;

                // Keep results in file order, so the first failing track is the one reported
                let mut tracks = Vec::new();
                chunks
                    .into_par_iter()
                    .enumerate()
                    .map(decode)
                    .collect_into_vec(&mut tracks);
                return tracks.into_iter().collect();
            }
        }
        chunks.into_iter().enumerate().map(decode).collect()
    }
}

/// Read the `MThd` chunk, returning the format, the track count and the resolution.
fn read_header(raw: &mut &[u8]) -> Result<(Format, u16, u16)> {
    let magic = read_slice(raw, 4).map_err(|_| ErrorKind::BadFileHeader)?;
    ensure!(magic == HEADER_MAGIC, ErrorKind::BadFileHeader);
    let len = read_u32(raw)?;
    ensure!(len >= HEADER_LEN, ErrorKind::BadFileHeader);
    let mut body = read_slice(raw, len as usize)?;
    let format = Format::from_bits(read_u16(&mut body)?)?;
    let track_count = read_u16(&mut body)?;
    let resolution = read_u16(&mut body)?;
    debug!(
        format = format.as_bits(),
        tracks = track_count,
        resolution,
        padding = body.len(),
        "parsed file header"
    );
    Ok((format, track_count, resolution))
}

/// Read an `MTrk` chunk, returning its contents.
fn read_track_chunk<'a>(raw: &mut &'a [u8]) -> StdResult<&'a [u8], ErrorKind> {
    let magic = read_slice(raw, 4)?;
    ensure!(magic == TRACK_MAGIC, ErrorKind::BadTrackHeader);
    let len = read_u32(raw)?;
    read_slice(raw, len as usize)
}

/// An iterator over the events of a single track, decoded lazily.
///
/// Yields the first error it finds and then stops, since the stream cannot be resynchronized
/// after a malformed event.
#[derive(Clone, Debug)]
pub struct EventIter<'a, 'r> {
    raw: &'a [u8],
    running_status: RunningStatus,
    registry: &'r Registry,
}
impl<'a, 'r> EventIter<'a, 'r> {
    /// The bytes that have not been decoded yet.
    #[inline]
    pub fn unread(&self) -> &'a [u8] {
        self.raw
    }

    /// The channel message type and channel that a data byte in status position would resume.
    #[inline]
    pub fn running_status(&self) -> Option<(ChannelType, u4)> {
        self.running_status
    }

    /// Decode the remaining events into a track.
    pub fn into_track(self) -> Result<Track> {
        let mut events = Vec::with_capacity((self.raw.len() as f32 * BYTES_TO_EVENTS) as usize);
        for ev in self {
            events.push(ev?);
        }
        Ok(Track::from(events))
    }
}
impl<'a, 'r> Iterator for EventIter<'a, 'r> {
    type Item = Result<Event>;

    #[inline]
    fn next(&mut self) -> Option<Result<Event>> {
        if self.raw.is_empty() {
            return None;
        }
        match Event::read(&mut self.raw, &mut self.running_status, self.registry) {
            Ok(ev) => Some(Ok(ev)),
            Err(err) => {
                // Do not read again from the middle of a malformed event
                self.raw = &[];
                Some(Err(err.chain_ctx("failed to decode event")))
            }
        }
    }
}

/// Encodes patterns into Standard Midi Files, checking event types against a registry.
#[derive(Copy, Clone, Debug)]
pub struct Writer<'r> {
    registry: &'r Registry,
}
impl Default for Writer<'static> {
    #[inline]
    fn default() -> Writer<'static> {
        Writer::new(Registry::standard())
    }
}
impl<'r> Writer<'r> {
    #[inline]
    pub fn new(registry: &'r Registry) -> Writer<'r> {
        Writer { registry }
    }

    /// Encode a pattern and write it into the given byte sink.
    ///
    /// Every track is encoded before anything is written, so an unencodable pattern writes
    /// nothing.
    /// Fails with `Oversized` if there are more than 65535 tracks or a track chunk does not fit
    /// in 4 GiB.
    pub fn write<W: io::Write>(&self, pattern: &Pattern, mut out: W) -> Result<()> {
        let track_count = u16::try_from(pattern.tracks.len())
            .map_err(|_| ErrorKind::Oversized("track count exceeds 16 bit range"))?;
        let chunks = self.encode_tracks(&pattern.tracks)?;

        let mut header = [0; 4 + 4 + 6];
        header[0..4].copy_from_slice(HEADER_MAGIC);
        header[4..8].copy_from_slice(&HEADER_LEN.to_be_bytes());
        header[8..10].copy_from_slice(&pattern.format.as_bits().to_be_bytes());
        header[10..12].copy_from_slice(&track_count.to_be_bytes());
        header[12..14].copy_from_slice(&pattern.resolution.to_be_bytes());
        out.write_all(&header).context("failed to write file header")?;
        for chunk in &chunks {
            out.write_all(chunk).context("failed to write track")?;
        }
        out.flush()?;
        debug!(
            tracks = track_count,
            bytes = header.len() + chunks.iter().map(Vec::len).sum::<usize>(),
            "wrote pattern"
        );
        Ok(())
    }

    /// Encode a pattern into an in-memory buffer.
    pub fn to_bytes(&self, pattern: &Pattern) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(pattern, &mut out)?;
        Ok(out)
    }

    fn encode_tracks(&self, tracks: &[Track]) -> Result<Vec<Vec<u8>>> {
        let encode = |(index, track): (usize, &Track)| {
            encode_track(track, self.registry).map_err(|err| err.at_track(index))
        };
        #[cfg(feature = "parallel")]
        {
            let event_count = tracks.iter().map(Track::len).sum::<usize>();
            if (event_count as f32 * EVENTS_TO_BYTES) > PARALLEL_ENABLE_THRESHOLD as f32 {
                use rayon::prelude::*;

                let mut chunks = Vec::new();
                tracks
                    .par_iter()
                    .enumerate()
                    .map(encode)
                    .collect_into_vec(&mut chunks);
                return chunks.into_iter().collect();
            }
        }
        tracks.iter().enumerate().map(encode).collect()
    }
}

/// Encode a whole `MTrk` chunk, with its own running status register.
fn encode_track(track: &Track, registry: &Registry) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(8 + (track.len() as f32 * EVENTS_TO_BYTES) as usize);
    out.extend_from_slice(TRACK_MAGIC);
    out.extend_from_slice(&[0; 4]);
    let mut running_status = None;
    let mut elided = 0;
    for ev in track {
        if ev
            .write(&mut out, &mut running_status, registry)
            .context("failed to encode event")?
        {
            elided += 1;
        }
    }
    let len = u32::try_from(out.len() - 8)
        .map_err(|_| ErrorKind::Oversized("track chunk size exceeds 32 bit range"))?;
    out[4..8].copy_from_slice(&len.to_be_bytes());
    trace!(events = track.len(), bytes = out.len(), elided, "encoded track");
    Ok(out)
}
