//! Result documents returned alongside native calls

use serde::Deserialize;

/// Outcome of a gateway call: the value plus any diagnostic text the service
/// returned, which may be present even when the call succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    pub value: T,
    pub result: Option<String>,
}

impl<T> Response<T> {
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            value: f(self.value),
            result: self.result,
        }
    }

    /// The result text parsed as a [`ResultDocument`], when it is one
    pub fn document(&self) -> Option<ResultDocument> {
        self.result.as_deref().and_then(ResultDocument::parse)
    }
}

/// The `{ "Success": .., "Error": .., "ErrorCode": .. }` shape HCN uses for
/// result text. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultDocument {
    pub success: Option<bool>,
    pub error: Option<String>,
    pub error_code: Option<u32>,
}

impl ResultDocument {
    /// Lenient parse; text that is not a JSON object yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let doc = ResultDocument::parse(
            r#"{"Success":false,"Error":"The network was not found.","ErrorCode":2151350273}"#,
        )
        .unwrap();
        assert_eq!(doc.success, Some(false));
        assert_eq!(doc.error.as_deref(), Some("The network was not found."));
        assert_eq!(doc.error_code, Some(0x803B_0001));
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(ResultDocument::parse("{}"), Some(ResultDocument::default()));
        assert!(ResultDocument::parse(r#"{"Success":true,"Extra":[1]}"#).is_some());
        assert!(ResultDocument::parse("plain text").is_none());
    }

    #[test]
    fn test_response_map() {
        let response = Response {
            value: 2,
            result: Some(r#"{"Success":true}"#.to_string()),
        };
        let mapped = response.map(|v| v * 10);
        assert_eq!(mapped.value, 20);
        assert_eq!(mapped.document().unwrap().success, Some(true));
    }
}
