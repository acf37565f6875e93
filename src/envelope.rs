// SOAP 1.1 envelope codec.
//
// `encode` turns a method name plus named scalar parameters into a request
// document. `decode` pulls the `<method>Response` element out of a response
// document and flattens its children into a `CallResult`.

use std::collections::BTreeMap;
use std::fmt;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::error::{DecodeError, UNKNOWN_ERROR};

/// Namespace of the `Envelope`, `Header`, `Body` and `Fault` elements.
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// Namespace of the service's method elements.
pub const SERVICE_NS: &str = "http://newschronicle.com/soap";

/// A scalar parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

/// Ordered call parameters. Absent optional values are dropped on insert, so
/// everything held here gets serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallParams {
    entries: Vec<(&'static str, ParamValue)>,
}

impl CallParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: impl Into<ParamValue>) -> Self {
        self.entries.push((name, value.into()));
        self
    }

    pub fn with_opt<V: Into<ParamValue>>(self, name: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

}

/// Flat field mapping extracted from a response element. Keys are whatever
/// the server sent; nothing is checked against an expected schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallResult {
    fields: BTreeMap<String, String>,
}

impl CallResult {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// `true` only when the server answered `<success>true</success>`.
    pub fn is_success(&self) -> bool {
        self.get("success") == Some("true")
    }

    /// Server-provided message, or a generic one when absent or empty.
    pub fn message(&self) -> &str {
        match self.get("message") {
            Some(m) if !m.is_empty() => m,
            _ => UNKNOWN_ERROR,
        }
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

impl From<BTreeMap<String, String>> for CallResult {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }
}

/// Build the request document for `method`. Parameter text is escaped.
pub fn encode(method: &str, params: &CallParams) -> String {
    let mut doc = String::with_capacity(256);
    doc.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    doc.push_str(&format!(
        r#"<soapenv:Envelope xmlns:soapenv="{}" xmlns:soap="{}">"#,
        SOAP_ENV_NS, SERVICE_NS
    ));
    doc.push_str("<soapenv:Header/><soapenv:Body>");
    doc.push_str(&format!("<soap:{}>", method));
    for (name, value) in params.iter() {
        let text = value.to_string();
        doc.push_str(&format!("<{0}>{1}</{0}>", name, escape(text.as_str())));
    }
    doc.push_str(&format!("</soap:{}>", method));
    doc.push_str("</soapenv:Body></soapenv:Envelope>");
    doc
}

/// Direct children of one element, collected as `local name -> text`.
struct Capture {
    depth: usize,
    closed: bool,
    fields: BTreeMap<String, String>,
    open: Option<(String, String)>,
    // Set once the open field has a child element; later text is ignored.
    sealed: bool,
}

impl Capture {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            closed: false,
            fields: BTreeMap::new(),
            open: None,
            sealed: false,
        }
    }

    fn empty(depth: usize) -> Self {
        Self {
            closed: true,
            ..Self::new(depth)
        }
    }

    fn is_open(&self) -> bool {
        !self.closed
    }

    fn start(&mut self, depth: usize, name: String) {
        if depth == self.depth + 1 {
            self.open = Some((name, String::new()));
            self.sealed = false;
        } else if depth > self.depth + 1 {
            self.sealed = true;
        }
    }

    fn empty_child(&mut self, depth: usize, name: String) {
        if depth == self.depth {
            self.fields.insert(name, String::new());
        } else if depth > self.depth {
            self.sealed = true;
        }
    }

    fn text(&mut self, depth: usize, text: &str) {
        if depth == self.depth + 1 && !self.sealed {
            if let Some((_, value)) = self.open.as_mut() {
                value.push_str(text);
            }
        }
    }

    fn end(&mut self, depth: usize) {
        if depth == self.depth {
            self.closed = true;
        } else if depth == self.depth + 1 {
            if let Some((name, value)) = self.open.take() {
                self.fields.insert(name, value.trim().to_owned());
            }
        }
    }
}

/// Where we are in the response document.
struct Scan {
    expected: String,
    body: Option<usize>,
    body_seen: bool,
    response: Option<Capture>,
    fault: Option<Capture>,
}

impl Scan {
    fn new(method: &str) -> Self {
        Self {
            expected: format!("{}Response", method),
            body: None,
            body_seen: false,
            response: None,
            fault: None,
        }
    }

    fn open_capture(&mut self) -> Option<&mut Capture> {
        if let Some(c) = self.response.as_mut().filter(|c| c.is_open()) {
            return Some(c);
        }
        self.fault.as_mut().filter(|c| c.is_open())
    }

    fn start(&mut self, depth: usize, name: String, in_envelope_ns: bool) {
        if let Some(capture) = self.open_capture() {
            capture.start(depth, name);
        } else if !self.body_seen && in_envelope_ns && name == "Body" {
            self.body = Some(depth);
            self.body_seen = true;
        } else if self.body.is_some() && self.response.is_none() && name == self.expected {
            self.response = Some(Capture::new(depth));
        } else if self.body.is_some() && self.fault.is_none() && in_envelope_ns && name == "Fault" {
            self.fault = Some(Capture::new(depth));
        }
    }

    fn empty(&mut self, depth: usize, name: String, in_envelope_ns: bool) {
        if let Some(capture) = self.open_capture() {
            capture.empty_child(depth, name);
        } else if !self.body_seen && in_envelope_ns && name == "Body" {
            self.body_seen = true;
        } else if self.body.is_some() && self.response.is_none() && name == self.expected {
            self.response = Some(Capture::empty(depth));
        } else if self.body.is_some() && self.fault.is_none() && in_envelope_ns && name == "Fault" {
            self.fault = Some(Capture::empty(depth));
        }
    }

    fn text(&mut self, depth: usize, text: &str) {
        if let Some(capture) = self.open_capture() {
            capture.text(depth, text);
        }
    }

    fn end(&mut self, depth: usize) {
        if let Some(capture) = self.open_capture() {
            capture.end(depth);
        } else if self.body == Some(depth) {
            self.body = None;
        }
    }

    fn finish(self, method: &str) -> Result<CallResult, DecodeError> {
        if !self.body_seen {
            return Err(DecodeError::MissingBody);
        }
        if let Some(response) = self.response {
            return Ok(CallResult::from(response.fields));
        }
        match self.fault {
            Some(fault) => Err(DecodeError::Fault(
                fault
                    .fields
                    .get("faultstring")
                    .filter(|s| !s.is_empty())
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_owned()),
            )),
            None => Err(DecodeError::ResponseNotFound(method.to_owned())),
        }
    }
}

fn is_envelope_ns(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == SOAP_ENV_NS.as_bytes())
}

fn parse_error(err: impl fmt::Display) -> DecodeError {
    DecodeError::Parse(err.to_string())
}

/// Parse a response document and return the children of `<method>Response`.
///
/// The whole document is read, so malformed markup anywhere is reported as
/// `DecodeError::Parse` even if the response element came earlier.
pub fn decode(document: &str, method: &str) -> Result<CallResult, DecodeError> {
    let mut reader = NsReader::from_str(document);
    let mut scan = Scan::new(method);
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(parse_error)?;
        let in_envelope_ns = is_envelope_ns(&ns);
        match event {
            Event::Start(e) => {
                if depth == 0 && seen_root {
                    return Err(parse_error("more than one root element"));
                }
                depth += 1;
                seen_root = true;
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                scan.start(depth, name, in_envelope_ns);
            }
            Event::Empty(e) => {
                if depth == 0 && seen_root {
                    return Err(parse_error("more than one root element"));
                }
                seen_root = true;
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                scan.empty(depth, name, in_envelope_ns);
            }
            Event::End(_) => {
                if depth == 0 {
                    return Err(parse_error("closing tag without a matching opening tag"));
                }
                scan.end(depth);
                depth -= 1;
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(parse_error)?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return Err(parse_error("text outside of the root element"));
                    }
                } else {
                    scan.text(depth, &text);
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                scan.text(depth, &text);
            }
            Event::Eof => {
                if depth != 0 {
                    return Err(parse_error("unexpected end of document"));
                }
                if !seen_root {
                    return Err(parse_error("no root element"));
                }
                break;
            }
            _ => {}
        }
    }

    scan.finish(method)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(method: &str, children: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="{}" xmlns:tns="{}">
  <soap:Body>
    <tns:{m}Response>{}</tns:{m}Response>
  </soap:Body>
</soap:Envelope>"#,
            SOAP_ENV_NS,
            SERVICE_NS,
            children,
            m = method
        )
    }

    #[test]
    fn encode_wraps_params_in_namespaced_method_element() {
        let params = CallParams::new()
            .with("username", "alice")
            .with("password", "s3cret");
        let doc = encode("authenticateUser", &params);

        assert!(doc.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(doc.contains(&format!(r#"xmlns:soapenv="{}""#, SOAP_ENV_NS)));
        assert!(doc.contains(&format!(r#"xmlns:soap="{}""#, SERVICE_NS)));
        assert!(doc.contains(
            "<soap:authenticateUser><username>alice</username><password>s3cret</password></soap:authenticateUser>"
        ));
    }

    #[test]
    fn encode_escapes_markup_in_values() {
        let params = CallParams::new().with("username", "<b>&co</b>");
        let doc = encode("addUser", &params);

        assert!(doc.contains("<username>&lt;b&gt;&amp;co&lt;/b&gt;</username>"));
        assert!(!doc.contains("<b>"));
    }

    #[test]
    fn with_opt_drops_absent_values() {
        let params = CallParams::new()
            .with("token", "t")
            .with("userId", 7i64)
            .with_opt("username", None::<String>)
            .with_opt("role", Some("ADMIN"));

        assert_eq!(params.names().collect::<Vec<_>>(), ["token", "userId", "role"]);
        assert_eq!(params.get("userId"), Some(&ParamValue::Int(7)));
    }

    #[test]
    fn decode_reads_echoed_request_values() {
        let params = CallParams::new()
            .with("token", "abc")
            .with("userId", 42i64)
            .with("username", "Tom & Jerry <3");
        let doc = encode("deleteUserResponse", &params);

        let result = decode(&doc, "deleteUser").unwrap();
        assert_eq!(result.get("token"), Some("abc"));
        assert_eq!(result.get("userId"), Some("42"));
        assert_eq!(result.get("username"), Some("Tom & Jerry <3"));
    }

    #[test]
    fn decode_strips_namespaces_and_keeps_server_keys() {
        let doc = response(
            "authenticateUser",
            "<tns:success>true</tns:success><tns:token>jwt</tns:token><role>ADMIN</role><extra/>",
        );
        let result = decode(&doc, "authenticateUser").unwrap();

        assert!(result.is_success());
        assert_eq!(result.get("token"), Some("jwt"));
        assert_eq!(result.get("role"), Some("ADMIN"));
        assert_eq!(result.get("extra"), Some(""));
        assert_eq!(result.fields().len(), 4);
    }

    #[test]
    fn field_text_stops_at_first_nested_element() {
        let doc = response(
            "addUser",
            "<success>true</success><message>a<b>zz</b>c</message><note>x<br/>y</note><userId>3</userId>",
        );
        let result = decode(&doc, "addUser").unwrap();

        assert_eq!(result.get("message"), Some("a"));
        assert_eq!(result.get("note"), Some("x"));
        assert_eq!(result.get("userId"), Some("3"));
        assert!(result.get("b").is_none());
    }

    #[test]
    fn decode_reads_cdata_and_trims_whitespace() {
        let doc = response(
            "listUsers",
            "\n      <success> true </success>\n      <users><![CDATA[[{\"id\":1}]]]></users>\n    ",
        );
        let result = decode(&doc, "listUsers").unwrap();

        assert!(result.is_success());
        assert_eq!(result.get("users"), Some(r#"[{"id":1}]"#));
    }

    #[test]
    fn message_falls_back_when_missing_or_empty() {
        let missing = decode(&response("deleteUser", "<success>false</success>"), "deleteUser").unwrap();
        let empty = decode(
            &response("deleteUser", "<success>false</success><message/>"),
            "deleteUser",
        )
        .unwrap();
        let given = decode(
            &response("deleteUser", "<success>false</success><message>nope</message>"),
            "deleteUser",
        )
        .unwrap();

        assert!(!missing.is_success());
        assert_eq!(missing.message(), UNKNOWN_ERROR);
        assert_eq!(empty.message(), UNKNOWN_ERROR);
        assert_eq!(given.message(), "nope");
    }

    #[test]
    fn decode_reports_missing_response_element() {
        let doc = response("addUser", "<success>true</success>");
        let err = decode(&doc, "listUsers").unwrap_err();

        assert!(matches!(err, DecodeError::ResponseNotFound(ref m) if m == "listUsers"));
        assert_eq!(err.to_string(), "listUsersResponse not found");
    }

    #[test]
    fn decode_reports_missing_body() {
        let doc = format!(
            r#"<soap:Envelope xmlns:soap="{}"><soap:Header/></soap:Envelope>"#,
            SOAP_ENV_NS
        );
        assert!(matches!(decode(&doc, "listUsers"), Err(DecodeError::MissingBody)));
    }

    #[test]
    fn body_outside_envelope_namespace_is_not_a_body() {
        let doc = "<Envelope><Body><listUsersResponse><success>true</success></listUsersResponse></Body></Envelope>";
        assert!(matches!(decode(doc, "listUsers"), Err(DecodeError::MissingBody)));
    }

    #[test]
    fn decode_reports_soap_fault() {
        let doc = format!(
            r#"<soap:Envelope xmlns:soap="{}"><soap:Body><soap:Fault><faultcode>soap:Server</faultcode><faultstring>Token expired</faultstring></soap:Fault></soap:Body></soap:Envelope>"#,
            SOAP_ENV_NS
        );
        let err = decode(&doc, "listUsers").unwrap_err();
        assert!(matches!(err, DecodeError::Fault(ref m) if m == "Token expired"));
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        let cases = [
            ("", "empty document"),
            ("this is not xml", "plain text"),
            ("<a><b></a>", "mismatched closing tag"),
            ("<a><b>", "unclosed elements"),
            ("</a>", "stray closing tag"),
            ("<a/><b/>", "two roots"),
            ("<a>&bogus;</a>", "unknown entity"),
        ];
        for (doc, case) in cases {
            assert!(
                matches!(decode(doc, "listUsers"), Err(DecodeError::Parse(_))),
                "expected a parse error for {}",
                case
            );
        }
    }

    #[test]
    fn malformed_tail_is_reported_even_after_response() {
        let mut doc = response("listUsers", "<success>true</success>");
        doc.push_str("<trailing>");
        assert!(matches!(decode(&doc, "listUsers"), Err(DecodeError::Parse(_))));
    }
}
