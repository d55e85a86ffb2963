//! Shared HTTP plumbing for the SaaS gateway adapters.
//!
//! Each adapter owns its endpoint shapes; transport failures, HTTP status
//! mapping, and body previews are identical across them and live here.

use reqwest::StatusCode;

use crate::domain::ports::GatewayError;

const PREVIEW_CHAR_LIMIT: usize = 160;

/// Map reqwest transport failures onto the gateway error taxonomy.
pub(crate) fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::timeout(error.to_string())
    } else {
        GatewayError::transport(error.to_string())
    }
}

/// Map a non-success HTTP status onto the gateway error taxonomy, carrying a
/// truncated body preview for diagnostics.
pub(crate) fn map_status_error(status: StatusCode, body: &[u8]) -> GatewayError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::timeout(message),
        _ if status.is_client_error() => GatewayError::rejected(message),
        _ => GatewayError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT)]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT)]
    fn timeout_statuses_map_to_timeout(#[case] status: StatusCode) {
        assert!(matches!(
            map_status_error(status, b""),
            GatewayError::Timeout { .. }
        ));
    }

    #[test]
    fn client_errors_map_to_rejected_with_a_preview() {
        let error = map_status_error(StatusCode::PAYMENT_REQUIRED, b"{\"error\":\"card_declined\"}");
        let GatewayError::Rejected { message } = error else {
            panic!("expected rejection, got {error:?}");
        };
        assert!(message.contains("402"));
        assert!(message.contains("card_declined"));
    }

    #[test]
    fn server_errors_map_to_transport() {
        assert!(matches!(
            map_status_error(StatusCode::BAD_GATEWAY, b"upstream down"),
            GatewayError::Transport { .. }
        ));
    }

    #[test]
    fn long_bodies_are_truncated_and_whitespace_collapsed() {
        let body = format!("a  b\n{}", "x".repeat(400));
        let preview = body_preview(body.as_bytes());
        assert!(preview.starts_with("a b"));
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() <= PREVIEW_CHAR_LIMIT + 3);
    }
}
