// ABOUTME: Minimal XML-RPC codec for the OpenNebula API.
// ABOUTME: Encodes method calls and decodes method responses and faults.

use super::error::RpcError;
use xmltree::{Element, EmitterConfig, XMLNode};

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    String(String),
    Double(f64),
    Array(Vec<Value>),
    Struct(Vec<(String, Value)>),
    Nil,
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// Serialize a `methodCall` document.
pub fn encode_call(method: &str, params: &[Value]) -> Result<String, RpcError> {
    let params = params
        .iter()
        .map(|param| element("param", vec![encode_value(param)]))
        .collect();
    let call = element(
        "methodCall",
        vec![
            text_element("methodName", method),
            element("params", params),
        ],
    );

    let mut buf = Vec::new();
    call.write_with_config(&mut buf, EmitterConfig::new().perform_indent(false))
        .map_err(|e| RpcError::Encode(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| RpcError::Encode(e.to_string()))
}

fn element(name: &str, children: Vec<Element>) -> Element {
    let mut element = Element::new(name);
    element.children = children.into_iter().map(XMLNode::Element).collect();
    element
}

fn text_element(name: &str, text: impl Into<String>) -> Element {
    let mut element = Element::new(name);
    element.children.push(XMLNode::Text(text.into()));
    element
}

fn encode_value(value: &Value) -> Element {
    let typed = match value {
        Value::Int(i) => text_element("int", i.to_string()),
        Value::Bool(b) => text_element("boolean", u8::from(*b).to_string()),
        Value::String(s) => text_element("string", s.as_str()),
        Value::Double(d) => text_element("double", d.to_string()),
        Value::Array(items) => element(
            "array",
            vec![element("data", items.iter().map(encode_value).collect())],
        ),
        Value::Struct(members) => element(
            "struct",
            members
                .iter()
                .map(|(name, member)| {
                    element(
                        "member",
                        vec![text_element("name", name.as_str()), encode_value(member)],
                    )
                })
                .collect(),
        ),
        Value::Nil => Element::new("nil"),
    };
    element("value", vec![typed])
}

/// Parse a `methodResponse` document into its single return value.
///
/// A `<fault>` response becomes [`RpcError::Fault`].
pub fn decode_response(xml: &str) -> Result<Value, RpcError> {
    let root = Element::parse(xml.as_bytes())
        .map_err(|e| RpcError::malformed(format!("invalid XML: {e}")))?;
    if root.name != "methodResponse" {
        return Err(RpcError::malformed(format!(
            "expected <methodResponse>, found <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.get_child("fault") {
        let value = decode_value(required(fault, "value")?)?;
        let code = value
            .member("faultCode")
            .and_then(Value::as_i64)
            .unwrap_or_default();
        let message = value
            .member("faultString")
            .and_then(Value::as_str)
            .unwrap_or("unknown fault")
            .to_string();
        return Err(RpcError::Fault { code, message });
    }

    let params = required(&root, "params")?;
    let param = required(params, "param")?;
    decode_value(required(param, "value")?)
}

fn required<'a>(parent: &'a Element, name: &str) -> Result<&'a Element, RpcError> {
    parent.get_child(name).ok_or_else(|| {
        RpcError::malformed(format!("<{}> is missing <{}>", parent.name, name))
    })
}

fn text_of(element: &Element) -> String {
    element
        .get_text()
        .map(|text| text.into_owned())
        .unwrap_or_default()
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    parent
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |child| child.name == name)
}

fn decode_value(value: &Element) -> Result<Value, RpcError> {
    // An untyped <value> holds a string.
    let Some(typed) = value.children.iter().find_map(XMLNode::as_element) else {
        return Ok(Value::String(text_of(value)));
    };

    let raw = text_of(typed);
    let text = raw.trim();
    match typed.name.as_str() {
        "i4" | "int" | "i8" => text
            .parse()
            .map(Value::Int)
            .map_err(|_| RpcError::malformed(format!("invalid integer: {text:?}"))),
        "boolean" => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(RpcError::malformed(format!("invalid boolean: {other:?}"))),
        },
        "string" => Ok(Value::String(raw)),
        "double" => text
            .parse()
            .map(Value::Double)
            .map_err(|_| RpcError::malformed(format!("invalid double: {text:?}"))),
        "dateTime.iso8601" | "base64" => Ok(Value::String(text.to_string())),
        "nil" => Ok(Value::Nil),
        "array" => child_elements(required(typed, "data")?, "value")
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "struct" => child_elements(typed, "member")
            .map(|member| {
                let name = text_of(required(member, "name")?).trim().to_string();
                let value = decode_value(required(member, "value")?)?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>, RpcError>>()
            .map(Value::Struct),
        other => Err(RpcError::malformed(format!("unsupported value type <{other}>"))),
    }
}
