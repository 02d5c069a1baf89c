//! Toggle/status wire protocol
//!
//! Requests carry an `action` field; replies carry an optional `status`.
//! Requests with an unknown action get no reply at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::session::Status;

/// Request from the privileged side to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    /// Flip dissect mode and report the resulting status
    #[serde(rename = "toggleUI")]
    ToggleUi,
    /// Report the current status
    #[serde(rename = "getStatus")]
    GetStatus,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::ToggleUi => "toggleUI",
            Request::GetStatus => "getStatus",
        }
    }
}

/// Reply from the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl Response {
    pub fn with_status(status: Status) -> Self {
        Self {
            status: Some(status),
        }
    }
}

/// Decode a request, returning `None` for well-formed JSON with an
/// unknown or missing action
///
/// # Errors
/// `Serialization` when the text is not JSON.
pub fn decode_request(json: &str) -> Result<Option<Request>> {
    let value: Value = serde_json::from_str(json)?;
    Ok(serde_json::from_value(value).ok())
}

/// The page side of the protocol
pub trait ContentEndpoint {
    fn handle_request(&mut self, request: Request) -> Response;

    /// Handle a JSON request, returning the JSON reply if there is one
    fn handle_json(&mut self, json: &str) -> Result<Option<String>> {
        match decode_request(json)? {
            Some(request) => {
                let response = self.handle_request(request);
                Ok(Some(serde_json::to_string(&response)?))
            }
            None => {
                log::debug!("[MSG] No handler for {}", json);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixed(bool);

    impl ContentEndpoint for Fixed {
        fn handle_request(&mut self, request: Request) -> Response {
            if request == Request::ToggleUi {
                self.0 = !self.0;
            }
            Response::with_status(Status::from(self.0))
        }
    }

    #[test]
    fn test_request_wire_format() {
        assert_eq!(
            serde_json::to_string(&Request::ToggleUi).unwrap(),
            r#"{"action":"toggleUI"}"#
        );
        assert_eq!(
            decode_request(r#"{"action":"getStatus"}"#).unwrap(),
            Some(Request::GetStatus)
        );
    }

    #[test]
    fn test_unknown_action_decodes_to_none() {
        assert_eq!(decode_request(r#"{"action":"explode"}"#).unwrap(), None);
        assert_eq!(decode_request(r#"{"foo":1}"#).unwrap(), None);
        assert!(decode_request("not json").is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let active = Response::with_status(Status::Active);
        assert_eq!(serde_json::to_string(&active).unwrap(), r#"{"status":"active"}"#);
        assert_eq!(serde_json::to_string(&Response::default()).unwrap(), "{}");

        let empty: Response = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.status, None);
    }

    #[test]
    fn test_endpoint_json_round() {
        let mut endpoint = Fixed(false);
        assert_eq!(
            endpoint.handle_json(r#"{"action":"toggleUI"}"#).unwrap().as_deref(),
            Some(r#"{"status":"active"}"#)
        );
        assert_eq!(endpoint.handle_json(r#"{"action":"nope"}"#).unwrap(), None);
    }
}
