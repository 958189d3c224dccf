//! Persistence collaborators for graph and annotation documents.
//!
//! The coordinator only talks to [`GraphStorage`]. Failures are reported to the
//! caller and never touch in-memory state; there is no retry.

use log::debug;

use super::error::StorageError;
use super::types::{AnnotationDocument, GraphDocument};

/// Persistence backend for graph and annotation documents.
pub trait GraphStorage {
	/// The stored graph, or `None` when nothing was saved yet.
	fn load(&self) -> Result<Option<GraphDocument>, StorageError>;
	/// Replaces the stored graph.
	fn save(&mut self, doc: &GraphDocument) -> Result<(), StorageError>;
	/// Forgets the stored graph and annotations.
	fn reset(&mut self) -> Result<(), StorageError>;
	/// The stored annotation document, or `None` when nothing was saved yet.
	fn load_annotations(&self) -> Result<Option<AnnotationDocument>, StorageError>;
	/// Replaces the stored annotation document.
	fn save_annotations(&mut self, doc: &AnnotationDocument) -> Result<(), StorageError>;
}

/// Keeps serialized documents in memory. `fail` makes every call report
/// [`StorageError::Unavailable`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
	graph: Option<String>,
	annotations: Option<String>,
	/// Makes every call fail, for exercising error paths.
	pub fail: bool,
}

impl MemoryStorage {
	/// Empty storage that works.
	pub fn new() -> Self {
		Self::default()
	}

	fn check(&self) -> Result<(), StorageError> {
		if self.fail {
			Err(StorageError::Unavailable("memory storage offline".to_string()))
		} else {
			Ok(())
		}
	}
}

impl GraphStorage for MemoryStorage {
	fn load(&self) -> Result<Option<GraphDocument>, StorageError> {
		self.check()?;
		Ok(self
			.graph
			.as_deref()
			.map(GraphDocument::from_json)
			.transpose()?)
	}

	fn save(&mut self, doc: &GraphDocument) -> Result<(), StorageError> {
		self.check()?;
		self.graph = Some(doc.to_json()?);
		Ok(())
	}

	fn reset(&mut self) -> Result<(), StorageError> {
		self.check()?;
		self.graph = None;
		self.annotations = None;
		Ok(())
	}

	fn load_annotations(&self) -> Result<Option<AnnotationDocument>, StorageError> {
		self.check()?;
		Ok(self
			.annotations
			.as_deref()
			.map(serde_json::from_str)
			.transpose()?)
	}

	fn save_annotations(&mut self, doc: &AnnotationDocument) -> Result<(), StorageError> {
		self.check()?;
		self.annotations = Some(serde_json::to_string(doc)?);
		Ok(())
	}
}

/// Documents kept in the browser's `localStorage`.
#[derive(Clone, Debug)]
pub struct BrowserStorage {
	prefix: String,
}

impl Default for BrowserStorage {
	fn default() -> Self {
		Self::new("channel-graph")
	}
}

impl BrowserStorage {
	/// Storage under keys `{prefix}.graph` and `{prefix}.annotations`.
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}

	fn key(&self, name: &str) -> String {
		format!("{}.{}", self.prefix, name)
	}

	fn storage() -> Result<web_sys::Storage, StorageError> {
		web_sys::window()
			.and_then(|w| w.local_storage().ok().flatten())
			.ok_or_else(|| StorageError::Unavailable("localStorage".to_string()))
	}

	fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
		Self::storage()?
			.get_item(&self.key(name))
			.map_err(|e| StorageError::Unavailable(format!("{e:?}")))
	}

	fn write(&self, name: &str, text: &str) -> Result<(), StorageError> {
		debug!("channel-graph: writing {} ({} bytes)", self.key(name), text.len());
		Self::storage()?
			.set_item(&self.key(name), text)
			.map_err(|e| StorageError::Unavailable(format!("{e:?}")))
	}

	fn remove(&self, name: &str) -> Result<(), StorageError> {
		Self::storage()?
			.remove_item(&self.key(name))
			.map_err(|e| StorageError::Unavailable(format!("{e:?}")))
	}
}

impl GraphStorage for BrowserStorage {
	fn load(&self) -> Result<Option<GraphDocument>, StorageError> {
		Ok(self
			.read("graph")?
			.as_deref()
			.map(GraphDocument::from_json)
			.transpose()?)
	}

	fn save(&mut self, doc: &GraphDocument) -> Result<(), StorageError> {
		self.write("graph", &doc.to_json()?)
	}

	fn reset(&mut self) -> Result<(), StorageError> {
		self.remove("graph")?;
		self.remove("annotations")
	}

	fn load_annotations(&self) -> Result<Option<AnnotationDocument>, StorageError> {
		Ok(self
			.read("annotations")?
			.as_deref()
			.map(serde_json::from_str)
			.transpose()?)
	}

	fn save_annotations(&mut self, doc: &AnnotationDocument) -> Result<(), StorageError> {
		self.write("annotations", &serde_json::to_string(doc)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::types::{Link, Node, NodeKind};

	#[test]
	fn memory_storage_keeps_documents() {
		let mut storage = MemoryStorage::new();
		assert!(storage.load().unwrap().is_none());

		let doc = GraphDocument {
			nodes: vec![Node::new("C1", "ADT", NodeKind::Channel)],
			links: vec![Link::new("C1", "C1")],
			..Default::default()
		};
		storage.save(&doc).unwrap();
		assert_eq!(storage.load().unwrap(), Some(doc));

		storage.reset().unwrap();
		assert!(storage.load().unwrap().is_none());
	}

	#[test]
	fn offline_storage_reports_unavailable() {
		let mut storage = MemoryStorage {
			fail: true,
			..Default::default()
		};
		assert!(matches!(
			storage.save(&GraphDocument::default()),
			Err(StorageError::Unavailable(_))
		));
		assert!(storage.load_annotations().is_err());
	}
}
