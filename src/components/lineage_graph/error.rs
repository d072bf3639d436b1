use std::fmt;

/// Result type for loading and building the lineage graph.
pub type GraphResult<T> = Result<T, GraphError>;

/// Failures that stop the graph view from rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
	/// `nodes` or `links` was not an array, or its records did not decode.
	MalformedPayload { field: &'static str, reason: String },
	/// A server-injected global was absent from the page.
	MissingInjectedData { name: &'static str },
	/// The request never produced a response.
	Network { url: String, message: String },
	/// The server answered with a non-2xx status.
	HttpStatus { url: String, status: u16 },
	/// The server answered `success: false`.
	Api { url: String },
}

impl GraphError {
	/// Text shown in place of the graph.
	pub fn user_message(&self) -> String {
		let lead = match self {
			GraphError::MalformedPayload { .. } | GraphError::MissingInjectedData { .. } => {
				"The lineage data could not be read."
			}
			GraphError::Network { .. } | GraphError::HttpStatus { .. } | GraphError::Api { .. } => {
				"The lineage data could not be loaded."
			}
		};
		format!("{lead} Please refresh the page to try again.")
	}
}

impl fmt::Display for GraphError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			GraphError::MalformedPayload { field, reason } => {
				write!(f, "malformed {field} payload: {reason}")
			}
			GraphError::MissingInjectedData { name } => {
				write!(f, "injected data window.{name} is missing")
			}
			GraphError::Network { url, message } => write!(f, "request to {url} failed: {message}"),
			GraphError::HttpStatus { url, status } => {
				write!(f, "request to {url} returned HTTP {status}")
			}
			GraphError::Api { url } => write!(f, "{url} reported success: false"),
		}
	}
}

impl std::error::Error for GraphError {}
