//! The owned event type, its constructors and its byte-level codec.

use crate::{
    catalog::{META_STATUS, SYSEX_END, SYSEX_STATUS},
    fields::{
        Control, KeySignature, Note, PitchBend, SequenceNumber, Tempo, TimeSignature, Value,
    },
    prelude::*,
};

/// The running status register, shared by consecutive channel messages of a single track.
pub(crate) type RunningStatus = Option<(ChannelType, u4)>;

/// A single event of a track.
///
/// An event is made of a delta time in ticks, an [`EventType`](enum.EventType.html), a channel
/// (only meaningful for channel messages) and the raw payload bytes.
/// The payload always satisfies the length rule of the event type: this is checked by every
/// constructor, and typed views can only overwrite bytes in place.
///
/// Events own their payload, so cloning an event deep-copies its bytes.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct Event {
    tick: u32,
    kind: EventType,
    channel: u4,
    payload: Vec<u8>,
}
impl Event {
    /// Create an event out of its raw parts.
    ///
    /// Fails with `InvalidPayload` if the payload does not satisfy the length rule of `kind`, or
    /// if a system exclusive payload contains the `0xF7` terminator.
    /// The channel is ignored for events that are not channel messages.
    pub fn new(tick: u32, kind: EventType, channel: u4, payload: Vec<u8>) -> Result<Event> {
        ensure!(
            kind.length().accepts(payload.len()),
            ErrorKind::InvalidPayload("payload length does not match the event type")
        );
        if kind == EventType::SysEx {
            ensure!(
                !payload.contains(&SYSEX_END),
                ErrorKind::InvalidPayload("sysex payload contains the 0xF7 terminator")
            );
        }
        Ok(Event::from_parts(tick, kind, channel, payload))
    }

    #[inline]
    fn from_parts(tick: u32, kind: EventType, channel: u4, payload: Vec<u8>) -> Event {
        let channel = match kind {
            EventType::Channel(_) => channel,
            _ => u4::new(0),
        };
        Event {
            tick,
            kind,
            channel,
            payload,
        }
    }

    #[inline]
    fn channel_msg(tick: u32, ty: ChannelType, channel: u4, payload: Vec<u8>) -> Event {
        Event::from_parts(tick, EventType::Channel(ty), channel, payload)
    }

    #[inline]
    fn meta_msg(tick: u32, ty: MetaType, payload: Vec<u8>) -> Event {
        Event::from_parts(tick, EventType::Meta(ty), u4::new(0), payload)
    }

    pub fn note_on(tick: u32, channel: u4, pitch: u7, velocity: u7) -> Event {
        Event::channel_msg(tick, ChannelType::NoteOn, channel, Note::new(pitch, velocity).into())
    }

    pub fn note_off(tick: u32, channel: u4, pitch: u7, velocity: u7) -> Event {
        Event::channel_msg(tick, ChannelType::NoteOff, channel, Note::new(pitch, velocity).into())
    }

    pub fn after_touch(tick: u32, channel: u4, pitch: u7, pressure: u7) -> Event {
        Event::channel_msg(
            tick,
            ChannelType::AfterTouch,
            channel,
            Note::new(pitch, pressure).into(),
        )
    }

    pub fn control_change(tick: u32, channel: u4, control: u7, value: u7) -> Event {
        Event::channel_msg(
            tick,
            ChannelType::ControlChange,
            channel,
            Control::new(control, value).into(),
        )
    }

    pub fn program_change(tick: u32, channel: u4, program: u7) -> Event {
        Event::channel_msg(tick, ChannelType::ProgramChange, channel, Value::new(program).into())
    }

    pub fn channel_after_touch(tick: u32, channel: u4, pressure: u7) -> Event {
        Event::channel_msg(
            tick,
            ChannelType::ChannelAfterTouch,
            channel,
            Value::new(pressure).into(),
        )
    }

    pub fn pitch_wheel(tick: u32, channel: u4, bend: PitchBend) -> Event {
        Event::channel_msg(tick, ChannelType::PitchWheel, channel, bend.into())
    }

    pub fn with_sequence_number(tick: u32, number: u16) -> Event {
        Event::meta_msg(tick, MetaType::SequenceNumber, SequenceNumber::new(number).into())
    }

    pub fn with_tempo(tick: u32, tempo: Tempo) -> Event {
        Event::meta_msg(tick, MetaType::SetTempo, tempo.into())
    }

    pub fn with_time_signature(tick: u32, sig: TimeSignature) -> Event {
        Event::meta_msg(tick, MetaType::TimeSignature, sig.into())
    }

    pub fn with_key_signature(tick: u32, sig: KeySignature) -> Event {
        Event::meta_msg(tick, MetaType::KeySignature, sig.into())
    }

    /// Create a text meta event, encoding the string as Latin-1.
    ///
    /// Fails with `InvalidPayload` if `ty` is not a text meta type or if the string contains
    /// characters beyond `U+00FF`.
    pub fn with_text(tick: u32, ty: MetaType, text: &str) -> Result<Event> {
        ensure!(ty.is_text(), ErrorKind::InvalidPayload("meta type does not carry text"));
        Ok(Event::meta_msg(tick, ty, encode_latin1(text)?))
    }

    /// Create a system exclusive event.
    ///
    /// The payload excludes both the `0xF0` status byte and the `0xF7` terminator.
    pub fn sysex(tick: u32, payload: Vec<u8>) -> Result<Event> {
        Event::new(tick, EventType::SysEx, u4::new(0), payload)
    }

    /// Create a meta event from raw payload bytes.
    pub fn meta(tick: u32, ty: MetaType, payload: Vec<u8>) -> Result<Event> {
        Event::new(tick, EventType::Meta(ty), u4::new(0), payload)
    }

    pub fn end_of_track(tick: u32) -> Event {
        Event::meta_msg(tick, MetaType::EndOfTrack, Vec::new())
    }

    /// Delta time in ticks since the previous event of the same track.
    #[inline]
    pub fn tick(&self) -> u32 {
        self.tick
    }

    #[inline]
    pub fn kind(&self) -> EventType {
        self.kind
    }

    /// The channel of a channel message, or `None` for meta and sysex events.
    #[inline]
    pub fn channel(&self) -> Option<u4> {
        match self.kind {
            EventType::Channel(_) => Some(self.channel),
            _ => None,
        }
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[inline]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// The human-readable name of the event type.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Decode the payload of a text meta event as Latin-1.
    pub fn text(&self) -> Option<String> {
        match self.kind {
            EventType::Meta(ty) if ty.is_text() => {
                Some(self.payload.iter().map(|&b| b as char).collect())
            }
            _ => None,
        }
    }

    /// Replace the payload of a text meta event.
    ///
    /// Fails with `InvalidPayload` if this is not a text meta event or if the string contains
    /// characters beyond `U+00FF`, in which case the event is left untouched.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        match self.kind {
            EventType::Meta(ty) if ty.is_text() => {
                self.payload = encode_latin1(text)?;
                Ok(())
            }
            _ => bail!(ErrorKind::InvalidPayload("event does not carry text")),
        }
    }

    /// Decode a single event, advancing `raw` past it.
    pub(crate) fn read(
        raw: &mut &[u8],
        running_status: &mut RunningStatus,
        registry: &Registry,
    ) -> Result<Event> {
        let tick = read_varlen(raw).context("failed to read delta time")?;
        let status = read_u8(raw)?;
        match status {
            META_STATUS => {
                let command = read_u8(raw)?;
                let ty = match registry.lookup_meta(command) {
                    Some(ty) => ty,
                    None => bail!(ErrorKind::UnknownMetaEvent(command)),
                };
                let payload = read_varlen_slice(raw).context("failed to read meta payload")?;
                Event::new(tick, EventType::Meta(ty), u4::new(0), payload.to_vec())
            }
            SYSEX_STATUS if registry.has_sysex() => {
                let len = match raw.iter().position(|&b| b == SYSEX_END) {
                    Some(len) => len,
                    None => bail!(ErrorKind::TruncatedStream),
                };
                let payload = read_slice(raw, len)?;
                read_u8(raw)?;
                Ok(Event::from_parts(tick, EventType::SysEx, u4::new(0), payload.to_vec()))
            }
            _ if status & 0x80 != 0 => {
                let ty = match registry.lookup_channel(status) {
                    Some(ty) => ty,
                    None => bail!(ErrorKind::UnknownStatus(status)),
                };
                let channel = u4::new(status & 0x0F);
                *running_status = Some((ty, channel));
                let payload = read_data(raw, ty.data_len())?;
                Ok(Event::channel_msg(tick, ty, channel, payload.to_vec()))
            }
            _ => {
                let (ty, channel) = match *running_status {
                    Some(rs) => rs,
                    None => bail!(ErrorKind::MissingRunningStatus),
                };
                let mut payload = Vec::with_capacity(ty.data_len());
                payload.push(status);
                payload.extend_from_slice(read_data(raw, ty.data_len() - 1)?);
                Ok(Event::channel_msg(tick, ty, channel, payload))
            }
        }
    }

    /// Encode this event at the end of `out`.
    ///
    /// Returns whether the status byte was elided through running status.
    pub(crate) fn write(
        &self,
        out: &mut Vec<u8>,
        running_status: &mut RunningStatus,
        registry: &Registry,
    ) -> Result<bool> {
        ensure!(
            registry.contains(self.kind),
            ErrorKind::UnencodableEvent("event type is not registered")
        );
        write_varlen(out, self.tick).context("failed to write delta time")?;
        match self.kind {
            EventType::Meta(ty) => {
                out.push(META_STATUS);
                out.push(ty.command());
                write_varlen_slice(out, &self.payload)?;
                Ok(false)
            }
            EventType::SysEx => {
                out.push(SYSEX_STATUS);
                out.extend_from_slice(&self.payload);
                out.push(SYSEX_END);
                Ok(false)
            }
            EventType::Channel(ty) => {
                ensure!(
                    self.payload.iter().all(|&b| b & 0x80 == 0),
                    ErrorKind::UnencodableEvent("channel data byte has its top bit set")
                );
                let status = Some((ty, self.channel));
                let elided = *running_status == status;
                if !elided {
                    out.push(ty.status() | self.channel.as_int());
                    *running_status = status;
                }
                out.extend_from_slice(&self.payload);
                Ok(elided)
            }
        }
    }
}

/// Define a pair of shared and mutable typed views over the payload of some event types.
macro_rules! payload_views {
    {$( $(#[$attr:meta])* $get:ident, $get_mut:ident: $pat:pat => $field:ident; )*} => {
        impl Event {
            $(
                $(#[$attr])*
                #[inline]
                pub fn $get(&self) -> Option<&$field> {
                    match self.kind {
                        $pat => $field::from_slice(&self.payload),
                        _ => None,
                    }
                }

                #[inline]
                pub fn $get_mut(&mut self) -> Option<&mut $field> {
                    match self.kind {
                        $pat => $field::from_slice_mut(&mut self.payload),
                        _ => None,
                    }
                }
            )*
        }
    };
}
payload_views! {
    /// Pitch and velocity of `NoteOn`, `NoteOff` and `AfterTouch` messages.
    note, note_mut:
        EventType::Channel(ChannelType::NoteOn | ChannelType::NoteOff | ChannelType::AfterTouch)
        => Note;
    control, control_mut: EventType::Channel(ChannelType::ControlChange) => Control;
    /// The single value of `ProgramChange`, `ChannelAfterTouch` and `ChannelPrefix` events.
    value, value_mut:
        EventType::Channel(ChannelType::ProgramChange | ChannelType::ChannelAfterTouch)
            | EventType::Meta(MetaType::ChannelPrefix)
        => Value;
    pitch_bend, pitch_bend_mut: EventType::Channel(ChannelType::PitchWheel) => PitchBend;
    sequence_number, sequence_number_mut:
        EventType::Meta(MetaType::SequenceNumber) => SequenceNumber;
    tempo, tempo_mut: EventType::Meta(MetaType::SetTempo) => Tempo;
    time_signature, time_signature_mut: EventType::Meta(MetaType::TimeSignature) => TimeSignature;
    key_signature, key_signature_mut: EventType::Meta(MetaType::KeySignature) => KeySignature;
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(tick={}", self.name(), self.tick)?;
        if let Some(channel) = self.channel() {
            write!(f, ", channel={}", channel)?;
        }
        write!(f, ", data={:?})", self.payload)
    }
}

/// Read `len` channel data bytes, all of which must have their top bit clear.
fn read_data<'a>(raw: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    let data = read_slice(raw, len)?;
    ensure!(
        data.iter().all(|&b| b & 0x80 == 0),
        ErrorKind::InvalidPayload("channel data byte has its top bit set")
    );
    Ok(data)
}

fn encode_latin1(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(c)
                .map_err(|_| Error::from(ErrorKind::InvalidPayload("text is not latin-1")))
        })
        .collect()
}
