#[derive(Debug, Default)]
pub struct Protocol {
    pub name: String,
    pub uppercase_name: String,
    pub copyright: Option<String>,
    pub description: Option<Description>,
    pub interfaces: Vec<Interface>,
}

#[derive(Debug)]
pub struct Description {
    pub summary: String,
    pub body: String,
}

#[derive(Debug)]
pub struct Interface {
    pub name: String,
    pub uppercase_name: String,
    pub version: u32,
    /// The since version of the most recently parsed message.
    pub since: u32,
    pub description: Option<Description>,
    pub requests: Vec<Message>,
    pub events: Vec<Message>,
    pub enums: Vec<Enum>,
}

#[derive(Debug)]
pub struct Message {
    pub name: String,
    pub uppercase_name: String,
    pub args: Vec<Arg>,
    pub new_id_count: u32,
    pub since: u32,
    pub deprecated_since: Option<u32>,
    pub destructor: bool,
    pub description: Option<Description>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Event,
}

#[derive(Debug)]
pub struct Arg {
    pub name: String,
    pub ty: ArgType,
    pub nullable: bool,
    pub interface: Option<String>,
    pub enum_: Option<String>,
    pub summary: Option<String>,
    pub description: Option<Description>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgType {
    NewId,
    Int,
    Uint,
    Fixed,
    String,
    Object,
    Array,
    Fd,
}

impl ArgType {
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "int" => Self::Int,
            "uint" => Self::Uint,
            "fixed" => Self::Fixed,
            "string" => Self::String,
            "array" => Self::Array,
            "fd" => Self::Fd,
            "new_id" => Self::NewId,
            "object" => Self::Object,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NewId => "new_id",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Fixed => "fixed",
            Self::String => "string",
            Self::Object => "object",
            Self::Array => "array",
            Self::Fd => "fd",
        }
    }

    /// The C type used for arguments of this type in generated bindings.
    pub fn c_type(self) -> &'static str {
        match self {
            Self::Int | Self::Fd => "int32_t",
            Self::Uint | Self::NewId => "uint32_t",
            Self::Fixed => "wl_fixed_t",
            Self::String => "const char *",
            Self::Array => "struct wl_array *",
            Self::Object => "object",
        }
    }

    pub fn is_nullable(self) -> bool {
        matches!(self, Self::String | Self::Object | Self::NewId | Self::Array)
    }

    pub fn has_interface(self) -> bool {
        matches!(self, Self::Object | Self::NewId)
    }
}

#[derive(Debug)]
pub struct Enum {
    pub name: String,
    pub uppercase_name: String,
    pub since: Option<u32>,
    pub bitfield: bool,
    pub description: Option<Description>,
    pub entries: Vec<Entry>,
}

#[derive(Debug)]
pub struct Entry {
    pub name: String,
    pub uppercase_name: String,
    pub value: String,
    pub summary: Option<String>,
    pub since: Option<u32>,
    pub description: Option<Description>,
}

impl Interface {
    pub fn messages(&self, kind: MessageKind) -> &[Message] {
        match kind {
            MessageKind::Request => &self.requests,
            MessageKind::Event => &self.events,
        }
    }

    pub fn messages_mut(&mut self, kind: MessageKind) -> &mut Vec<Message> {
        match kind {
            MessageKind::Request => &mut self.requests,
            MessageKind::Event => &mut self.events,
        }
    }
}
