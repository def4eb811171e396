use std::{
    io::Write,
    process::{Command, Output},
};

fn run(xml: &str) -> Output {
    let mut file = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
    file.write_all(xml.as_bytes()).unwrap();
    file.flush().unwrap();
    Command::new(env!("CARGO_BIN_EXE_wl-protocol-html"))
        .arg(file.path())
        .output()
        .unwrap()
}

fn in_interface(body: &str) -> String {
    format!(r#"<protocol name="demo"><interface name="foo" version="1">{body}</interface></protocol>"#)
}

#[test]
fn renders_minimal_protocol() {
    let out = run(&in_interface(""));
    assert!(out.status.success());
    let html = String::from_utf8(out.stdout).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Interface Name:foo Version 1"));
    assert_eq!(html.matches("<td>NONE</td>").count(), 2);
}

#[test]
fn destructor_request() {
    let out = run(&in_interface(r#"<request name="destroy" type="destructor"/>"#));
    assert!(out.status.success());
    let html = String::from_utf8(out.stdout).unwrap();
    assert!(html.contains("Request: destroy"));
    assert!(!html.contains(">Since<"));
}

#[test]
fn destroy_without_destructor_fails() {
    let out = run(&in_interface(r#"<request name="destroy"/>"#));
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains(".xml:1: request destroy must be of type destructor"));
}

#[test]
fn allow_null_on_int_fails() {
    let out = run(&in_interface(
        r#"<request name="r"><arg name="x" type="int" allow-null="true"/></request>"#,
    ));
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("allow-null"));
}

#[test]
fn reports_line_numbers() {
    let out = run("<protocol name=\"demo\">\n<interface name=\"foo\" version=\"0\">\n</interface>\n</protocol>\n");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains(".xml:2: interface foo has version 0"));
}

#[test]
fn missing_file() {
    let out = Command::new(env!("CARGO_BIN_EXE_wl-protocol-html"))
        .arg("/nonexistent/protocol.xml")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Could not read /nonexistent/protocol.xml"));
}

#[test]
fn wrong_argument_count() {
    let bin = env!("CARGO_BIN_EXE_wl-protocol-html");
    let out = Command::new(bin).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage"));
    let out = Command::new(bin).args(["a.xml", "b.xml"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
}
