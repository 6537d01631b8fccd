use thiserror::Error;

/// Failure talking to the report service.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("server returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("unexpected response: {0}")]
  ShapeMismatch(String),

  #[error("invalid service URL: {0}")]
  Url(#[from] url::ParseError),
}

impl ApiError {
  /// Failures the query layer recovers from with a fallback and a notice.
  ///
  /// A response of the wrong shape is handled like a failed request.
  pub fn is_transport(&self) -> bool {
    matches!(
      self,
      ApiError::Transport(_) | ApiError::Status { .. } | ApiError::ShapeMismatch(_)
    )
  }

  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Status { status, .. } => Some(*status),
      ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_transport_classification() {
    let status = ApiError::Status {
      status: 503,
      body: "down".into(),
    };
    assert!(status.is_transport());
    assert_eq!(status.status(), Some(503));
    assert_eq!(status.to_string(), "server returned 503: down");

    assert!(ApiError::ShapeMismatch("null".into()).is_transport());

    let url = ApiError::from(url::Url::parse("not a url").unwrap_err());
    assert!(!url.is_transport());
  }
}
