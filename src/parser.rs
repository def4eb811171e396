
use {
    crate::ast::{
        Arg, ArgType, Description, Entry, Enum, Interface, Message, MessageKind, Protocol,
    },
    quick_xml::{
        Reader,
        events::{
            BytesStart, Event,
            attributes::{AttrError, Attribute, Attributes},
        },
    },
    std::{borrow::Cow, mem, num::ParseIntError, str::Utf8Error},
    thiserror::Error,
};

#[derive(Debug, Error)]
#[error("Error on line {line}")]
pub struct ParseError {
    pub line: usize,
    #[source]
    pub error: ParserError,
}

impl ParseError {
    fn new(input: &[u8], offset: usize, error: ParserError) -> Self {
        let offset = offset.min(input.len());
        let line = 1 + input[..offset].iter().filter(|&&b| b == b'\n').count();
        Self { line, error }
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Could not read the next event")]
    ReadEvent(#[source] quick_xml::Error),
    #[error("Could not decode character data as UTF-8")]
    DecodeUtf8(#[source] Utf8Error),
    #[error("Unknown entity reference &{0};")]
    UnknownReference(String),
    #[error("The document ends with {0} unclosed elements")]
    UnclosedElements(usize),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Could not parse an attribute")]
    Attribute(#[from] AttributeError),
    #[error("no protocol name given")]
    MissingProtocolName,
    #[error("The document contains more than one protocol element")]
    DuplicateProtocol,
    #[error("The document contains no protocol element")]
    NoProtocol,
    #[error("no {0} name given")]
    MissingName(&'static str),
    #[error("no interface version given for interface {0}")]
    MissingVersion(String),
    #[error("invalid version `{1}` for interface {0}")]
    InvalidVersion(String, String, #[source] ParseIntError),
    #[error("interface {0} has version 0")]
    ZeroVersion(String),
    #[error("invalid integer `{1}` in since attribute of {0}")]
    InvalidSince(String, String, #[source] ParseIntError),
    #[error("invalid integer `{1}` in deprecated-since attribute of {0}")]
    InvalidDeprecatedSince(String, String, #[source] ParseIntError),
    #[error("{0} {1} must be of type destructor")]
    DestroyNotDestructor(&'static str, String),
    #[error("no type given for argument {0}")]
    MissingArgType(String),
    #[error("unknown type `{1}` for argument {0}")]
    UnknownArgType(String, String),
    #[error("interface attribute not allowed for argument {0} of type {1}")]
    InterfaceNotAllowed(String, &'static str),
    #[error("allow-null is only valid for objects, strings, and arrays, not for argument {0} of type {1}")]
    AllowNullNotAllowed(String, &'static str),
    #[error("invalid value `{1}` for allow-null attribute of argument {0}")]
    InvalidAllowNull(String, String),
    #[error("invalid value `{1}` for bitfield attribute of enum {0}")]
    InvalidBitfield(String, String),
    #[error("description without summary")]
    MissingSummary,
    #[error("<{0}> element outside of <{1}>")]
    Misplaced(&'static str, &'static str),
    #[error("<{0}> element inside <{1}>")]
    Nested(&'static str, &'static str),
}

#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("quick_xml returned an error")]
    QuickXml(#[from] AttrError),
    #[error("Could not decode the value")]
    Decode(#[from] quick_xml::Error),
}

/// Parses a protocol description and builds its document tree.
pub fn parse(input: &[u8]) -> Result<Protocol, ParseError> {
    let mut reader = Reader::from_reader(input);
    let mut builder = Builder::default();
    let mut depth = 0usize;
    loop {
        let offset = reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(e) => e,
            Err(e) => {
                let offset = reader.buffer_position() as usize;
                return Err(ParseError::new(input, offset, ParserError::ReadEvent(e)));
            }
        };
        let res = match event {
            Event::Start(s) => {
                depth += 1;
                builder.start(&s)
            }
            Event::Empty(s) => builder
                .start(&s)
                .and_then(|_| builder.end(s.local_name().as_ref())),
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                builder.end(e.local_name().as_ref())
            }
            Event::Text(t) => decode(&t).map(|t| builder.text(t)),
            Event::CData(t) => decode(&t).map(|t| builder.text(t)),
            Event::GeneralRef(r) => {
                decode(&r).and_then(|name| resolve_reference(name).map(|t| builder.text(&t)))
            }
            Event::Eof if depth > 0 => {
                let e = ParserError::UnclosedElements(depth);
                return Err(ParseError::new(input, input.len(), e));
            }
            Event::Eof => break,
            _ => Ok(()),
        };
        res.map_err(|e| ParseError::new(input, offset, e))?;
    }
    builder
        .finish()
        .map_err(|e| ParseError::new(input, input.len(), e.into()))
}

fn decode(bytes: &[u8]) -> Result<&str, ParserError> {
    std::str::from_utf8(bytes).map_err(ParserError::DecodeUtf8)
}

fn resolve_reference(name: &str) -> Result<Cow<'static, str>, ParserError> {
    let unknown = || ParserError::UnknownReference(name.to_string());
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => num.parse(),
        };
        let c = code.ok().and_then(char::from_u32).ok_or_else(unknown)?;
        return Ok(Cow::Owned(c.to_string()));
    }
    let s = match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        _ => return Err(unknown()),
    };
    Ok(Cow::Borrowed(s))
}

macro_rules! parse_attr {
    ($attr:expr) => {
        match $attr {
            Ok(ref attr) => parse_attr(attr),
            Err(e) => return Err(AttributeError::QuickXml(e).into()),
        }
    };
}

fn parse_attr<'a>(attr: &'a Attribute) -> Result<(&'a [u8], Cow<'a, str>), AttributeError> {
    let name = attr.key.local_name().into_inner();
    let value = attr.unescape_value().map_err(AttributeError::Decode)?;
    Ok((name, value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[derive(Copy, Clone, Debug)]
enum DescriptionTarget {
    Protocol,
    Interface {
        interface: usize,
    },
    Message {
        interface: usize,
        kind: MessageKind,
        message: usize,
    },
    Arg {
        interface: usize,
        kind: MessageKind,
        message: usize,
        arg: usize,
    },
    Enum {
        interface: usize,
        enum_: usize,
    },
    Entry {
        interface: usize,
        enum_: usize,
        entry: usize,
    },
}

#[derive(Debug)]
enum Collect {
    Copyright,
    Description {
        target: DescriptionTarget,
        summary: String,
    },
}

/// Receives one call per element boundary and per chunk of character data.
///
/// The cursors are indices into the tree under construction. Children are
/// only ever appended, so an index stays valid for the whole parse.
#[derive(Default)]
struct Builder {
    protocol: Option<Protocol>,
    interface: Option<usize>,
    message: Option<(MessageKind, usize)>,
    arg: Option<usize>,
    enum_: Option<usize>,
    entry: Option<usize>,
    collect: Option<Collect>,
    character_data: String,
}

impl Builder {
    fn start(&mut self, element: &BytesStart) -> Result<(), ParserError> {
        let attributes = element.attributes();
        match element.local_name().as_ref() {
            b"protocol" => self.start_protocol(attributes)?,
            b"copyright" => self.start_copyright()?,
            b"interface" => self.start_interface(attributes)?,
            b"request" => self.start_message(attributes, MessageKind::Request)?,
            b"event" => self.start_message(attributes, MessageKind::Event)?,
            b"arg" => self.start_arg(attributes)?,
            b"enum" => self.start_enum(attributes)?,
            b"entry" => self.start_entry(attributes)?,
            b"description" => self.start_description(attributes)?,
            name => log::info!(
                "Ignoring unknown element <{}>",
                String::from_utf8_lossy(name)
            ),
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) -> Result<(), ParserError> {
        match name {
            b"copyright" | b"description" => self.finish_text()?,
            b"request" | b"event" => {
                self.message = None;
                self.arg = None;
            }
            b"arg" => self.arg = None,
            b"enum" => {
                self.enum_ = None;
                self.entry = None;
            }
            b"entry" => self.entry = None,
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if self.collect.is_some() {
            self.character_data.push_str(text);
        }
    }

    fn finish(self) -> Result<Protocol, SchemaError> {
        self.protocol.ok_or(SchemaError::NoProtocol)
    }

    fn protocol_mut(&mut self, element: &'static str) -> Result<&mut Protocol, SchemaError> {
        self.protocol
            .as_mut()
            .ok_or(SchemaError::Misplaced(element, "protocol"))
    }

    fn interface_mut(&mut self, element: &'static str) -> Result<&mut Interface, SchemaError> {
        let idx = self
            .interface
            .ok_or(SchemaError::Misplaced(element, "interface"))?;
        Ok(&mut self.protocol_mut(element)?.interfaces[idx])
    }

    fn message_mut(&mut self, element: &'static str) -> Result<&mut Message, SchemaError> {
        let (kind, idx) = self
            .message
            .ok_or(SchemaError::Misplaced(element, "request or event"))?;
        Ok(&mut self.interface_mut(element)?.messages_mut(kind)[idx])
    }

    fn enum_mut(&mut self, element: &'static str) -> Result<&mut Enum, SchemaError> {
        let idx = self.enum_.ok_or(SchemaError::Misplaced(element, "enum"))?;
        Ok(&mut self.interface_mut(element)?.enums[idx])
    }

    fn start_protocol(&mut self, attributes: Attributes) -> Result<(), SchemaError> {
        if self.protocol.is_some() {
            return Err(SchemaError::DuplicateProtocol);
        }
        let mut name = None;
        for attr in attributes {
            let (n, value) = parse_attr!(attr)?;
            match n {
                b"name" => name = Some(value.into_owned()),
                _ => continue,
            }
        }
        let name = name.ok_or(SchemaError::MissingProtocolName)?;
        log::trace!("Parsing protocol {}", name);
        self.protocol = Some(Protocol {
            uppercase_name: name.to_ascii_uppercase(),
            name,
            ..Default::default()
        });
        Ok(())
    }

    fn start_copyright(&mut self) -> Result<(), SchemaError> {
        self.protocol_mut("copyright")?;
        self.check_not_collecting("copyright")?;
        self.character_data.clear();
        self.collect = Some(Collect::Copyright);
        Ok(())
    }

    fn start_interface(&mut self, attributes: Attributes) -> Result<(), SchemaError> {
        let mut name = None;
        let mut version = None;
        for attr in attributes {
            let (n, value) = parse_attr!(attr)?;
            match n {
                b"name" => name = Some(value.into_owned()),
                b"version" => version = Some(value.into_owned()),
                _ => continue,
            }
        }
        let name = name.ok_or(SchemaError::MissingName("interface"))?;
        let version = match version {
            None => return Err(SchemaError::MissingVersion(name)),
            Some(v) => match v.parse::<u32>() {
                Ok(0) => return Err(SchemaError::ZeroVersion(name)),
                Ok(v) => v,
                Err(e) => return Err(SchemaError::InvalidVersion(name, v, e)),
            },
        };
        log::trace!("Parsing interface {} version {}", name, version);
        let protocol = self.protocol_mut("interface")?;
        protocol.interfaces.push(Interface {
            uppercase_name: name.to_ascii_uppercase(),
            name,
            version,
            since: 1,
            description: None,
            requests: vec![],
            events: vec![],
            enums: vec![],
        });
        self.interface = Some(protocol.interfaces.len() - 1);
        self.message = None;
        self.arg = None;
        self.enum_ = None;
        self.entry = None;
        Ok(())
    }

    fn start_message(
        &mut self,
        attributes: Attributes,
        kind: MessageKind,
    ) -> Result<(), SchemaError> {
        let element = match kind {
            MessageKind::Request => "request",
            MessageKind::Event => "event",
        };
        let mut name = None;
        let mut ty = None;
        let mut since = None;
        let mut deprecated_since = None;
        for attr in attributes {
            let (n, value) = parse_attr!(attr)?;
            match n {
                b"name" => name = Some(value.into_owned()),
                b"type" => ty = Some(value.into_owned()),
                b"since" => since = Some(value.into_owned()),
                b"deprecated-since" => deprecated_since = Some(value.into_owned()),
                _ => continue,
            }
        }
        let name = name.ok_or(SchemaError::MissingName(element))?;
        let destructor = match ty.as_deref() {
            Some("destructor") => true,
            Some(ty) => {
                log::warn!("Unknown type `{}` of {} {}", ty, element, name);
                false
            }
            None => false,
        };
        if name == "destroy" && !destructor {
            return Err(SchemaError::DestroyNotDestructor(element, name));
        }
        let since = match since {
            Some(s) => match s.parse() {
                Ok(v) => v,
                Err(e) => return Err(SchemaError::InvalidSince(name, s, e)),
            },
            None => 1,
        };
        let deprecated_since = match deprecated_since {
            Some(s) => match s.parse() {
                Ok(v) => Some(v),
                Err(e) => return Err(SchemaError::InvalidDeprecatedSince(name, s, e)),
            },
            None => None,
        };
        let interface = self.interface_mut(element)?;
        if since < interface.since {
            log::warn!(
                "since version not increasing: {} {}.{} has since {} after {}",
                element,
                interface.name,
                name,
                since,
                interface.since,
            );
        }
        interface.since = since;
        log::trace!("Parsing {} {}.{}", element, interface.name, name);
        let messages = interface.messages_mut(kind);
        messages.push(Message {
            uppercase_name: name.to_ascii_uppercase(),
            name,
            args: vec![],
            new_id_count: 0,
            since,
            deprecated_since,
            destructor,
            description: None,
        });
        self.message = Some((kind, messages.len() - 1));
        self.arg = None;
        Ok(())
    }

    fn start_arg(&mut self, attributes: Attributes) -> Result<(), SchemaError> {
        let mut name = None;
        let mut ty = None;
        let mut summary = None;
        let mut interface = None;
        let mut allow_null = None;
        let mut enum_ = None;
        for attr in attributes {
            let (n, value) = parse_attr!(attr)?;
            match n {
                b"name" => name = Some(value.into_owned()),
                b"type" => ty = Some(value.into_owned()),
                b"summary" => summary = Some(value.into_owned()),
                b"interface" => interface = Some(value.into_owned()),
                b"allow-null" => allow_null = Some(value.into_owned()),
                b"enum" => enum_ = Some(value.into_owned()),
                _ => continue,
            }
        }
        let name = name.ok_or(SchemaError::MissingName("arg"))?;
        let ty = match ty {
            None => return Err(SchemaError::MissingArgType(name)),
            Some(ty) => match ArgType::from_name(&ty) {
                Some(ty) => ty,
                None => return Err(SchemaError::UnknownArgType(name, ty)),
            },
        };
        if interface.is_some() && !ty.has_interface() {
            return Err(SchemaError::InterfaceNotAllowed(name, ty.name()));
        }
        let nullable = match allow_null {
            None => false,
            Some(_) if !ty.is_nullable() => {
                return Err(SchemaError::AllowNullNotAllowed(name, ty.name()));
            }
            Some(v) => match parse_bool(&v) {
                Some(b) => b,
                None => return Err(SchemaError::InvalidAllowNull(name, v)),
            },
        };
        let message = self.message_mut("arg")?;
        if ty == ArgType::NewId {
            message.new_id_count += 1;
        }
        message.args.push(Arg {
            name,
            ty,
            nullable,
            interface,
            enum_,
            summary,
            description: None,
        });
        self.arg = Some(message.args.len() - 1);
        Ok(())
    }

    fn start_enum(&mut self, attributes: Attributes) -> Result<(), SchemaError> {
        let mut name = None;
        let mut since = None;
        let mut bitfield = None;
        for attr in attributes {
            let (n, value) = parse_attr!(attr)?;
            match n {
                b"name" => name = Some(value.into_owned()),
                b"since" => since = Some(value.into_owned()),
                b"bitfield" => bitfield = Some(value.into_owned()),
                _ => continue,
            }
        }
        let name = name.ok_or(SchemaError::MissingName("enum"))?;
        let since = match since {
            Some(s) => match s.parse() {
                Ok(v) => Some(v),
                Err(e) => return Err(SchemaError::InvalidSince(name, s, e)),
            },
            None => None,
        };
        let bitfield = match bitfield {
            Some(b) => match parse_bool(&b) {
                Some(b) => b,
                None => return Err(SchemaError::InvalidBitfield(name, b)),
            },
            None => false,
        };
        let interface = self.interface_mut("enum")?;
        interface.enums.push(Enum {
            uppercase_name: name.to_ascii_uppercase(),
            name,
            since,
            bitfield,
            description: None,
            entries: vec![],
        });
        self.enum_ = Some(interface.enums.len() - 1);
        self.entry = None;
        Ok(())
    }

    fn start_entry(&mut self, attributes: Attributes) -> Result<(), SchemaError> {
        let mut name = None;
        let mut value = None;
        let mut summary = None;
        let mut since = None;
        for attr in attributes {
            let (n, v) = parse_attr!(attr)?;
            match n {
                b"name" => name = Some(v.into_owned()),
                b"value" => value = Some(v.into_owned()),
                b"summary" => summary = Some(v.into_owned()),
                b"since" => since = Some(v.into_owned()),
                _ => continue,
            }
        }
        let name = name.ok_or(SchemaError::MissingName("entry"))?;
        let since = match since {
            Some(s) => match s.parse() {
                Ok(v) => Some(v),
                Err(e) => return Err(SchemaError::InvalidSince(name, s, e)),
            },
            None => None,
        };
        let enum_ = self.enum_mut("entry")?;
        enum_.entries.push(Entry {
            uppercase_name: name.to_ascii_uppercase(),
            name,
            value: value.unwrap_or_default(),
            summary,
            since,
            description: None,
        });
        self.entry = Some(enum_.entries.len() - 1);
        Ok(())
    }

    fn start_description(&mut self, attributes: Attributes) -> Result<(), SchemaError> {
        let mut summary = None;
        for attr in attributes {
            let (n, value) = parse_attr!(attr)?;
            match n {
                b"summary" => summary = Some(value.into_owned()),
                _ => continue,
            }
        }
        let summary = summary.ok_or(SchemaError::MissingSummary)?;
        self.check_not_collecting("description")?;
        let target = self.description_target()?;
        self.character_data.clear();
        self.collect = Some(Collect::Description { target, summary });
        Ok(())
    }

    fn check_not_collecting(&self, element: &'static str) -> Result<(), SchemaError> {
        match self.collect {
            Some(Collect::Copyright) => Err(SchemaError::Nested(element, "copyright")),
            Some(Collect::Description { .. }) => Err(SchemaError::Nested(element, "description")),
            None => Ok(()),
        }
    }

    fn description_target(&self) -> Result<DescriptionTarget, SchemaError> {
        if self.protocol.is_none() {
            return Err(SchemaError::Misplaced("description", "protocol"));
        }
        let Some(interface) = self.interface else {
            return Ok(DescriptionTarget::Protocol);
        };
        let target = if let (Some(enum_), Some(entry)) = (self.enum_, self.entry) {
            DescriptionTarget::Entry {
                interface,
                enum_,
                entry,
            }
        } else if let (Some((kind, message)), Some(arg)) = (self.message, self.arg) {
            DescriptionTarget::Arg {
                interface,
                kind,
                message,
                arg,
            }
        } else if let Some((kind, message)) = self.message {
            DescriptionTarget::Message {
                interface,
                kind,
                message,
            }
        } else if let Some(enum_) = self.enum_ {
            DescriptionTarget::Enum { interface, enum_ }
        } else {
            DescriptionTarget::Interface { interface }
        };
        Ok(target)
    }

    fn finish_text(&mut self) -> Result<(), SchemaError> {
        let Some(collect) = self.collect.take() else {
            return Ok(());
        };
        let body = mem::take(&mut self.character_data);
        match collect {
            Collect::Copyright => self.protocol_mut("copyright")?.copyright = Some(body),
            Collect::Description { target, summary } => {
                *self.description_slot(target)? = Some(Description { summary, body });
            }
        }
        Ok(())
    }

    fn description_slot(
        &mut self,
        target: DescriptionTarget,
    ) -> Result<&mut Option<Description>, SchemaError> {
        let protocol = self.protocol_mut("description")?;
        let slot = match target {
            DescriptionTarget::Protocol => &mut protocol.description,
            DescriptionTarget::Interface { interface } => {
                &mut protocol.interfaces[interface].description
            }
            DescriptionTarget::Message {
                interface,
                kind,
                message,
            } => &mut protocol.interfaces[interface].messages_mut(kind)[message].description,
            DescriptionTarget::Arg {
                interface,
                kind,
                message,
                arg,
            } => {
                &mut protocol.interfaces[interface].messages_mut(kind)[message].args[arg]
                    .description
            }
            DescriptionTarget::Enum { interface, enum_ } => {
                &mut protocol.interfaces[interface].enums[enum_].description
            }
            DescriptionTarget::Entry {
                interface,
                enum_,
                entry,
            } => &mut protocol.interfaces[interface].enums[enum_].entries[entry].description,
        };
        Ok(slot)
    }
}
