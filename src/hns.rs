//! Legacy HNS requests
//!
//! The older HNS protocol is addressed by an HTTP-like verb and path, e.g.
//! `GET /networks/`. Responses come wrapped in an envelope:
//! `{ "Success": bool, "Error": string, "Output": any }`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::hcn::Gateway;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "DELETE" => Ok(Method::Delete),
            other => Err(Error::Hns(format!("unsupported method {}", other))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
}

/// Send a request and return the envelope's `Output`, if there is one.
pub fn request_raw(
    gateway: &Gateway,
    method: Method,
    path: &str,
    body: &str,
) -> Result<Option<serde_json::Value>> {
    let response = gateway.hns_call(method.as_str(), path, body)?;
    let envelope: Envelope = serde_json::from_str(&response)?;
    if !envelope.success {
        return Err(Error::Hns(envelope.error));
    }
    Ok(envelope.output.filter(|output| !output.is_null()))
}

/// Send a request and deserialize the envelope's `Output` into `T`.
pub fn request<T: DeserializeOwned>(
    gateway: &Gateway,
    method: Method,
    path: &str,
    body: &str,
) -> Result<Option<T>> {
    match request_raw(gateway, method, path, body)? {
        Some(output) => Ok(Some(serde_json::from_value(output)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
        assert!("PATCH".parse::<Method>().is_err());
        assert_eq!(Method::Post.to_string(), "POST");
    }

    #[test]
    fn test_envelope_defaults() {
        let envelope: Envelope = serde_json::from_str("{}").unwrap();
        assert!(!envelope.success);
        assert!(envelope.error.is_empty());
        assert!(envelope.output.is_none());
    }
}
