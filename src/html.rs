
use {
    crate::ast::{Arg, Description, Entry, Enum, Interface, Message, MessageKind, Protocol},
    quick_xml::escape::escape,
    std::io::{self, Write},
};

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; }
h1 { border-bottom: 2px solid #444; }
h2 { background: #dde4ee; padding: 0.3em; }
table { border-collapse: collapse; margin-bottom: 1em; width: 100%; }
th, td { border: 1px solid #999; padding: 0.2em 0.5em; text-align: left; vertical-align: top; }
th { background: #eee; }
td.label { font-weight: bold; width: 10em; }
tr.arg-summary td { font-style: italic; }
pre { background: #f6f6f6; padding: 0.5em; white-space: pre-wrap; }
";

/// Writes the HTML documentation of `protocol` to `out`.
///
/// The output only depends on the tree. Child lists are emitted in document order.
pub fn write_html<W: Write>(out: &mut W, protocol: &Protocol) -> io::Result<()> {
    let name = escape(&protocol.name);
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>{name} protocol</title>")?;
    writeln!(out, "<style>")?;
    write!(out, "{STYLE}")?;
    writeln!(out, "</style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>Protocol: {name}</h1>")?;
    if let Some(desc) = &protocol.description {
        writeln!(out, "<table class=\"description\">")?;
        write_description_rows(out, desc)?;
        writeln!(out, "</table>")?;
    }
    if let Some(copyright) = &protocol.copyright {
        writeln!(out, "<h3>Copyright</h3>")?;
        writeln!(out, "<pre>{}</pre>", escape(copyright.trim()))?;
    }
    for interface in &protocol.interfaces {
        write_interface(out, interface)?;
    }
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(())
}

fn write_interface<W: Write>(out: &mut W, interface: &Interface) -> io::Result<()> {
    writeln!(out, "<div class=\"interface\">")?;
    writeln!(
        out,
        "<h2>Interface Name:{} Version {}</h2>",
        escape(&interface.name),
        interface.version,
    )?;
    writeln!(out, "<table class=\"description\">")?;
    match &interface.description {
        Some(desc) => write_description_rows(out, desc)?,
        None => {
            writeln!(out, "<tr><td class=\"label\">Summary</td><td>NONE</td></tr>")?;
            writeln!(out, "<tr><td class=\"label\">Description</td><td>NONE</td></tr>")?;
        }
    }
    writeln!(out, "</table>")?;
    if interface.enums.len() > 0 {
        writeln!(out, "<h3>Enumerations</h3>")?;
        for e in &interface.enums {
            write_enum(out, e)?;
        }
    }
    for kind in [MessageKind::Request, MessageKind::Event] {
        let messages = interface.messages(kind);
        if messages.is_empty() {
            continue;
        }
        let heading = match kind {
            MessageKind::Request => "Requests",
            MessageKind::Event => "Events",
        };
        writeln!(out, "<h3>{heading}</h3>")?;
        for message in messages {
            write_message(out, message, kind)?;
        }
    }
    writeln!(out, "</div>")?;
    Ok(())
}

fn write_description_rows<W: Write>(out: &mut W, desc: &Description) -> io::Result<()> {
    writeln!(
        out,
        "<tr><td class=\"label\">Summary</td><td>{}</td></tr>",
        escape(&desc.summary),
    )?;
    writeln!(
        out,
        "<tr><td class=\"label\">Description</td><td>{}</td></tr>",
        escape(desc.body.trim()),
    )?;
    Ok(())
}

fn write_enum<W: Write>(out: &mut W, e: &Enum) -> io::Result<()> {
    writeln!(out, "<table class=\"enum\">")?;
    let bitfield = match e.bitfield {
        true => " (bitfield)",
        false => "",
    };
    writeln!(
        out,
        "<tr><th colspan=\"2\">Enum: {}{bitfield}</th></tr>",
        escape(&e.name),
    )?;
    if let Some(since) = e.since {
        writeln!(
            out,
            "<tr><td class=\"label\">Since</td><td>{since}</td></tr>"
        )?;
    }
    if let Some(desc) = &e.description {
        write_description_rows(out, desc)?;
    }
    if e.entries.len() > 0 {
        writeln!(out, "<tr><td colspan=\"2\">")?;
        writeln!(out, "<table class=\"entries\">")?;
        writeln!(out, "<tr><th>Name</th><th>Value</th><th>Summary</th></tr>")?;
        for entry in &e.entries {
            write_entry(out, entry)?;
        }
        writeln!(out, "</table>")?;
        writeln!(out, "</td></tr>")?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

fn write_entry<W: Write>(out: &mut W, entry: &Entry) -> io::Result<()> {
    let summary = entry
        .summary
        .as_deref()
        .or(entry.description.as_ref().map(|d| d.summary.as_str()))
        .unwrap_or_default();
    write!(
        out,
        "<tr class=\"entry\"><td>{}</td><td>{}</td><td>{}",
        escape(&entry.name),
        escape(&entry.value),
        escape(summary),
    )?;
    if let Some(since) = entry.since
        && since != 1
    {
        write!(out, " (since {since})")?;
    }
    writeln!(out, "</td></tr>")?;
    Ok(())
}

fn write_message<W: Write>(out: &mut W, message: &Message, kind: MessageKind) -> io::Result<()> {
    let label = match kind {
        MessageKind::Request => "Request",
        MessageKind::Event => "Event",
    };
    writeln!(out, "<table class=\"message\">")?;
    writeln!(
        out,
        "<tr><th colspan=\"2\">{label}: {}</th></tr>",
        escape(&message.name),
    )?;
    if message.destructor {
        writeln!(
            out,
            "<tr><td class=\"label\">Type</td><td>destructor</td></tr>"
        )?;
    }
    if message.since != 1 {
        writeln!(
            out,
            "<tr><td class=\"label\">Since</td><td>{}</td></tr>",
            message.since,
        )?;
    }
    if let Some(deprecated_since) = message.deprecated_since {
        writeln!(
            out,
            "<tr><td class=\"label\">Deprecated Since</td><td>{deprecated_since}</td></tr>"
        )?;
    }
    if let Some(desc) = &message.description {
        write_description_rows(out, desc)?;
    }
    if message.args.len() > 0 {
        writeln!(out, "<tr><td colspan=\"2\">")?;
        writeln!(out, "<table class=\"args\">")?;
        writeln!(
            out,
            "<tr><th>Name</th><th>Type</th><th>Nullable</th><th>Interface</th></tr>"
        )?;
        for arg in &message.args {
            write_arg(out, arg)?;
        }
        writeln!(out, "</table>")?;
        writeln!(out, "</td></tr>")?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

fn write_arg<W: Write>(out: &mut W, arg: &Arg) -> io::Result<()> {
    write!(
        out,
        "<tr class=\"arg\"><td>{}</td><td>{}",
        escape(&arg.name),
        arg.ty.c_type(),
    )?;
    if let Some(enum_) = &arg.enum_ {
        write!(out, " (enum {})", escape(enum_))?;
    }
    let nullable = match (arg.ty.is_nullable(), arg.nullable) {
        (false, _) => "Not Supported",
        (true, true) => "TRUE",
        (true, false) => "FALSE",
    };
    writeln!(
        out,
        "</td><td>{nullable}</td><td>{}</td></tr>",
        escape(arg.interface.as_deref().unwrap_or_default()),
    )?;
    let summary = arg
        .summary
        .as_deref()
        .or(arg.description.as_ref().map(|d| d.summary.as_str()));
    if let Some(summary) = summary {
        writeln!(
            out,
            "<tr class=\"arg-summary\"><td></td><td colspan=\"3\">{}</td></tr>",
            escape(summary),
        )?;
    }
    Ok(())
}
