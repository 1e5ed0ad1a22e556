//! Resolution of status bytes and metacommands to event types.

use crate::prelude::*;
use once_cell::sync::OnceCell;
use tracing::trace;

/// A validated set of event types, indexed by their identity keys.
///
/// Lookups are direct table accesses: channel messages are indexed by the top nibble of their
/// status byte and meta events by their metacommand.
/// A registry is immutable once built, so it can be shared freely between threads.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Registry {
    channel: [Option<ChannelType>; 16],
    meta: [Option<MetaType>; 128],
    sysex: bool,
}
impl Registry {
    /// Build a registry out of a list of event types.
    ///
    /// Fails with `DuplicateRegistration` if two entries share the same family and identity key.
    pub fn new<I: IntoIterator<Item = EventType>>(types: I) -> Result<Registry> {
        let mut registry = Registry {
            channel: [None; 16],
            meta: [None; 128],
            sysex: false,
        };
        for ty in types {
            let taken = match ty {
                EventType::Channel(ch) => {
                    let slot = &mut registry.channel[(ch.status() >> 4) as usize];
                    slot.replace(ch).is_some()
                }
                EventType::Meta(meta) => {
                    let slot = &mut registry.meta[(meta.command() & 0x7F) as usize];
                    slot.replace(meta).is_some()
                }
                EventType::SysEx => std::mem::replace(&mut registry.sysex, true),
            };
            ensure!(!taken, ErrorKind::DuplicateRegistration(ty.name()));
            trace!(event_type = ty.name(), key = ty.key(), "registered event type");
        }
        Ok(registry)
    }

    /// The registry holding the whole built-in catalogue.
    ///
    /// Built and validated on first use.
    pub fn standard() -> &'static Registry {
        static STANDARD: OnceCell<Registry> = OnceCell::new();
        STANDARD.get_or_init(|| match Registry::new(EventType::catalog()) {
            Ok(registry) => registry,
            Err(err) => panic!("built-in event catalogue is inconsistent: {}", err),
        })
    }

    /// Resolve a channel status byte to its message type, ignoring the channel nibble.
    #[inline]
    pub fn lookup_channel(&self, status: u8) -> Option<ChannelType> {
        self.channel[(status >> 4) as usize]
    }

    /// Resolve a metacommand to its meta event type.
    #[inline]
    pub fn lookup_meta(&self, command: u8) -> Option<MetaType> {
        self.meta.get(command as usize).copied().flatten()
    }

    /// Whether system exclusive dumps are registered.
    #[inline]
    pub fn has_sysex(&self) -> bool {
        self.sysex
    }

    /// Whether the given event type is part of this registry.
    pub fn contains(&self, ty: EventType) -> bool {
        match ty {
            EventType::Channel(ch) => self.lookup_channel(ch.status()) == Some(ch),
            EventType::Meta(meta) => self.lookup_meta(meta.command()) == Some(meta),
            EventType::SysEx => self.sysex,
        }
    }

    /// Iterate over the registered event types, channel messages first, then meta events, then
    /// system exclusive.
    pub fn iter(&self) -> impl Iterator<Item = EventType> + '_ {
        self.channel
            .iter()
            .flatten()
            .map(|&ch| EventType::Channel(ch))
            .chain(self.meta.iter().flatten().map(|&meta| EventType::Meta(meta)))
            .chain(if self.sysex { Some(EventType::SysEx) } else { None })
    }
}
impl Default for Registry {
    #[inline]
    fn default() -> Registry {
        Registry::standard().clone()
    }
}
