//! Per-node comments and deployment statuses.

use std::collections::HashMap;
use std::fmt;

use super::types::{AnnotationDocument, NodeId};

/// Deployment stage of a destination, in pipeline order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
	/// Being built (`reception-0`).
	Development,
	/// In integration testing.
	Test,
	/// In user acceptance testing.
	Acceptance,
	/// Signed off, waiting for rollout.
	Ready,
	/// Live.
	Production,
}

impl Status {
	/// Every stage, in pipeline order.
	pub const ALL: [Status; 5] = [
		Status::Development,
		Status::Test,
		Status::Acceptance,
		Status::Ready,
		Status::Production,
	];

	/// Persisted code, `reception-0` through `reception-4`.
	pub fn code(self) -> String {
		format!("reception-{}", self as u8)
	}

	/// Parses a persisted code. Anything unrecognised means "no status".
	pub fn from_code(code: &str) -> Option<Self> {
		let stage: usize = code.strip_prefix("reception-")?.parse().ok()?;
		Self::ALL.get(stage).copied()
	}

	/// Short badge label.
	pub fn label(self) -> &'static str {
		match self {
			Status::Development => "Dev",
			Status::Test => "Test",
			Status::Acceptance => "UAT",
			Status::Ready => "Ready",
			Status::Production => "Prod",
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Id-keyed comments and status codes.
///
/// Status codes are stored raw so an unknown code written by someone else
/// survives a load/save cycle; it only reads back as `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationStore {
	comments: HashMap<NodeId, String>,
	statuses: HashMap<NodeId, String>,
}

impl AnnotationStore {
	/// An empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Store over raw maps as found in a graph document.
	pub fn from_maps(comments: HashMap<NodeId, String>, statuses: HashMap<NodeId, String>) -> Self {
		Self { comments, statuses }
	}

	/// Store over a separately saved annotation document.
	pub fn from_document(doc: &AnnotationDocument) -> Self {
		Self::from_maps(doc.comments.clone(), doc.statuses.clone())
	}

	/// Comments by node id.
	pub fn comments(&self) -> &HashMap<NodeId, String> {
		&self.comments
	}

	/// Raw status codes by node id, unknown codes included.
	pub fn statuses(&self) -> &HashMap<NodeId, String> {
		&self.statuses
	}

	/// The comment on `id`, if any.
	pub fn comment(&self, id: &str) -> Option<&str> {
		self.comments.get(id).map(String::as_str)
	}

	/// Whether `id` carries a non-empty comment.
	pub fn has_comment(&self, id: &str) -> bool {
		self.comments.contains_key(id)
	}

	/// Sets the comment for `id`. A blank comment removes it.
	pub fn set_comment(&mut self, id: &str, text: &str) {
		let text = text.trim();
		if text.is_empty() {
			self.comments.remove(id);
		} else {
			self.comments.insert(id.to_string(), text.to_string());
		}
	}

	/// The parsed status of `id`. Unknown codes read as `None`.
	pub fn status(&self, id: &str) -> Option<Status> {
		self.statuses.get(id).and_then(|code| Status::from_code(code))
	}

	/// Sets or, with `None`, removes the status of `id`.
	pub fn set_status(&mut self, id: &str, status: Option<Status>) {
		match status {
			Some(s) => {
				self.statuses.insert(id.to_string(), s.code());
			}
			None => {
				self.statuses.remove(id);
			}
		}
	}

	/// Drops annotations whose node no longer exists.
	pub fn retain_nodes(&mut self, exists: impl Fn(&str) -> bool) {
		self.comments.retain(|id, _| exists(id));
		self.statuses.retain(|id, _| exists(id));
	}

	/// Drops every comment and status.
	pub fn clear(&mut self) {
		self.comments.clear();
		self.statuses.clear();
	}

	/// Annotation document holding the comments, statuses and `collapsed_nodes`.
	pub fn to_document(&self, collapsed_nodes: Vec<NodeId>) -> AnnotationDocument {
		AnnotationDocument {
			comments: self.comments.clone(),
			statuses: self.statuses.clone(),
			collapsed_nodes,
		}
	}
}
