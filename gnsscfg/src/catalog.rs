use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use crate::{
    error::Error,
    nmea::{Frame, SentenceBody},
    pubx,
    ubx::{self, UbxFrame},
};

/// What a command does. The transport only looks at this to decide whether
/// the local baud rate follows the transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CommandKind {
    PubxEnable,
    PubxDisable,
    PubxBaud,
    UbxBinary,
    UbxPersist,
}

impl CommandKind {
    pub const fn is_nmea(self) -> bool {
        matches!(
            self,
            CommandKind::PubxEnable | CommandKind::PubxDisable | CommandKind::PubxBaud
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandKind::PubxEnable => "PUBX_ENABLE",
            CommandKind::PubxDisable => "PUBX_DISABLE",
            CommandKind::PubxBaud => "PUBX_BAUD",
            CommandKind::UbxBinary => "UBX_BINARY",
            CommandKind::UbxPersist => "UBX_PERSIST",
        })
    }
}

/// The raw content of a command, before compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandBody {
    Sentence(SentenceBody),
    Ubx(UbxFrame),
}

/// A named configuration command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    kind: CommandKind,
    body: CommandBody,
}

impl Command {
    /// Pair a body with its kind; PUBX kinds need a sentence, UBX kinds a
    /// binary frame
    pub fn new(name: impl Into<String>, kind: CommandKind, body: CommandBody) -> Result<Self, Error> {
        let consistent = match body {
            CommandBody::Sentence(_) => kind.is_nmea(),
            CommandBody::Ubx(_) => !kind.is_nmea(),
        };
        if !consistent {
            return Err(Error::MalformedCommand {
                reason: "command kind does not match its body",
            });
        }
        let name = name.into();
        if name.is_empty() {
            return Err(Error::MalformedCommand {
                reason: "command name is empty",
            });
        }
        Ok(Self { name, kind, body })
    }

    /// `enable-<id>`: output `identifier` on USART1 only
    pub fn enable(identifier: &str) -> Result<Self, Error> {
        Self::new(
            format!("enable-{}", identifier.to_ascii_lowercase()),
            CommandKind::PubxEnable,
            CommandBody::Sentence(pubx::enable_on_uart1(identifier)?),
        )
    }

    /// `disable-<id>`: silence `identifier` on all ports
    pub fn disable(identifier: &str) -> Result<Self, Error> {
        Self::new(
            format!("disable-{}", identifier.to_ascii_lowercase()),
            CommandKind::PubxDisable,
            CommandBody::Sentence(pubx::disable_everywhere(identifier)?),
        )
    }

    /// `baud-<rate>`: PUBX,41 baud change on USART1
    pub fn baud(baud_rate: u32) -> Result<Self, Error> {
        Self::new(
            format!("baud-{}", baud_rate),
            CommandKind::PubxBaud,
            CommandBody::Sentence(pubx::baud_change(baud_rate)?),
        )
    }

    /// `ubx-baud-<rate>`: UBX-CFG-PRT baud change on USART1
    pub fn ubx_baud(baud_rate: u32) -> Result<Self, Error> {
        Self::new(
            format!("ubx-baud-{}", baud_rate),
            CommandKind::UbxBinary,
            CommandBody::Ubx(ubx::cfg_prt_uart(baud_rate)?),
        )
    }

    /// `save-all`: persist the current configuration
    pub fn save_all() -> Result<Self, Error> {
        Self::new(
            "save-all",
            CommandKind::UbxPersist,
            CommandBody::Ubx(ubx::cfg_cfg_save_all()?),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn body(&self) -> &CommandBody {
        &self.body
    }

    /// Turn the body into wire bytes
    pub fn compile(&self) -> CompiledCommand {
        let payload = match &self.body {
            CommandBody::Sentence(body) => Payload::Nmea(Frame::from_body(body)),
            CommandBody::Ubx(frame) => Payload::Ubx(frame.clone()),
        };
        CompiledCommand {
            name: self.name.clone(),
            kind: self.kind,
            payload,
        }
    }
}

/// Wire bytes of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Nmea(Frame),
    Ubx(UbxFrame),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Nmea(frame) => frame.as_bytes(),
            Payload::Ubx(frame) => frame.as_bytes(),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Nmea(frame) => frame.fmt(f),
            Payload::Ubx(frame) => frame.fmt(f),
        }
    }
}

/// A command ready for the transport driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCommand {
    pub name: String,
    pub kind: CommandKind,
    pub payload: Payload,
}

impl CompiledCommand {
    pub fn as_bytes(&self) -> &[u8] {
        self.payload.as_bytes()
    }
}

/// Name and kind of a catalog entry, as listed to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CommandSummary<'a> {
    pub name: &'a str,
    pub kind: CommandKind,
    pub body: &'a str,
}

/// An ordered set of named commands
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    commands: Vec<Command>,
    // Rendered bodies kept for listings
    rendered: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sentences the standard set turns on for USART1
    pub const STANDARD_ENABLED: [&str; 2] = ["ZDA", "GGA"];
    /// Sentences the standard set turns off everywhere
    pub const STANDARD_DISABLED: [&str; 5] = ["GSV", "VTG", "RMC", "GSA", "GLL"];
    /// Baud rate the standard set switches the receiver to
    pub const STANDARD_BAUD: u32 = 115200;

    /// The usual receiver setup: ZDA and GGA on
    /// USART1, GSV, VTG, RMC, GSA and GLL off, a 115200 baud switch (PUBX and
    /// UBX flavours) and save-all.
    pub fn standard() -> Result<Self, Error> {
        let mut catalog = Self::new();
        for id in Self::STANDARD_ENABLED {
            catalog.insert(Command::enable(id)?);
        }
        for id in Self::STANDARD_DISABLED {
            catalog.insert(Command::disable(id)?);
        }
        catalog.insert(Command::baud(Self::STANDARD_BAUD)?);
        catalog.insert(Command::ubx_baud(Self::STANDARD_BAUD)?);
        catalog.insert(Command::save_all()?);
        Ok(catalog)
    }

    /// Add a command, replacing any command with the same name in place
    pub fn insert(&mut self, command: Command) {
        let rendered = match command.body() {
            CommandBody::Sentence(body) => body.to_string(),
            CommandBody::Ubx(frame) => frame.to_string(),
        };
        match self.commands.iter().position(|c| c.name == command.name) {
            Some(idx) => {
                self.commands[idx] = command;
                self.rendered[idx] = rendered;
            },
            None => {
                self.commands.push(command);
                self.rendered.push(rendered);
            },
        }
    }

    /// `(name, kind)` of every command, in insertion order
    pub fn list_commands(&self) -> impl Iterator<Item = (&str, CommandKind)> {
        self.commands.iter().map(|c| (c.name(), c.kind()))
    }

    pub fn summaries(&self) -> impl Iterator<Item = CommandSummary<'_>> {
        self.commands
            .iter()
            .zip(self.rendered.iter())
            .map(|(c, body)| CommandSummary {
                name: c.name(),
                kind: c.kind(),
                body,
            })
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn get_body(&self, name: &str) -> Option<&CommandBody> {
        self.get(name).map(Command::body)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
