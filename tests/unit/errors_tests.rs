/*!
 * Tests for error types and conversions
 */

use extractsubs::errors::{ProviderError, SubtitleError, ToolError};
use std::io;
use std::path::PathBuf;

#[test]
fn test_subtitleError_notFound_shouldDisplayPath() {
    let error = SubtitleError::NotFound(PathBuf::from("/media/missing.srt"));
    let display = format!("{}", error);
    assert!(display.contains("not found"));
    assert!(display.contains("/media/missing.srt"));
    assert!(!error.is_parse_error());
}

#[test]
fn test_subtitleError_io_shouldKeepSource() {
    let error = SubtitleError::io("/media/out.ass", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
    let display = format!("{}", error);
    assert!(display.contains("/media/out.ass"));
    assert!(display.contains("denied"));
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_toolError_failed_shouldDisplayCodeAndOutput() {
    let error = ToolError::Failed {
        tool: "mkvextract".to_string(),
        code: Some(2),
        output: "Error: no such track".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("mkvextract"));
    assert!(display.contains("2"));
    assert!(display.contains("no such track"));
}

#[test]
fn test_providerError_api_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 406,
        message: "download quota reached".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("406"));
    assert!(display.contains("download quota reached"));
    assert!(!error.is_retryable());
    assert!(ProviderError::RateLimitExceeded("slow down".to_string()).is_retryable());
}
