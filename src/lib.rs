// Library root
// -----------
// This crate exposes the SOAP user-directory client as a library; the binary
// (`main.rs`) wires it to an interactive menu.
//
// Module responsibilities:
// - `envelope`: builds SOAP request documents and flattens responses.
// - `api`: one operation per remote method, gated on the session tokens.
// - `session`: login token and administrative token.
// - `transport`: HTTP plumbing behind the `Transport` trait.
// - `user`: directory data model.
// - `config`, `telemetry`: environment settings and logging setup.
// - `ui`: terminal prompts, delegating every request to `api`.
pub mod api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod ui;
pub mod user;
