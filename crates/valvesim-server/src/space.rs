//! The live address space: one node per mapping entry with a wire address.
//!
//! Nodes are created once at startup and live until shutdown; only their
//! values change. The map entry lock of the [`dashmap::DashMap`] is the
//! mutual-exclusion boundary between the update scheduler (the regular
//! writer) and external writes to writable points.

use std::path::Path;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use valvesim_mapping::{read_mapping_file, DataKind, MappingDocument, MappingEntry};

use crate::address::NodeAddress;

/// Errors raised by address-space operations.
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("node not found: {0}")]
    NotFound(NodeAddress),

    #[error("node {0} is transiently unavailable")]
    NodeFaulted(NodeAddress),

    #[error("node {0} does not accept external writes")]
    NotWritable(NodeAddress),

    #[error("value kind mismatch for node {address}: node is {kind}")]
    KindMismatch { address: NodeAddress, kind: DataKind },
}

/// Current value of a live node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    Byte(u8),
    Double(f64),
}

impl Value {
    /// Seed value for a freshly created node of the given kind.
    pub fn default_for(kind: &DataKind) -> Self {
        match kind {
            DataKind::Boolean => Value::Bool(false),
            DataKind::Int32 => Value::Int32(0),
            DataKind::Byte => Value::Byte(0),
            DataKind::Double => Value::Double(0.0),
            DataKind::Unknown(_) => Value::Int32(0),
        }
    }

    /// Whether this value is acceptable for a node of the given kind.
    /// Unknown kinds were seeded as integers and stay integers.
    pub fn matches_kind(&self, kind: &DataKind) -> bool {
        matches!(
            (self, kind),
            (Value::Bool(_), DataKind::Boolean)
                | (Value::Int32(_), DataKind::Int32)
                | (Value::Byte(_), DataKind::Byte)
                | (Value::Double(_), DataKind::Double)
                | (Value::Int32(_), DataKind::Unknown(_))
        )
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
        }
    }
}

/// One addressable point of the simulated device.
#[derive(Debug, Clone)]
pub struct LiveNode {
    pub address: NodeAddress,
    /// Display name: last label segment, or `Var_{ns}_{id}` when the
    /// mapping entry carried no label.
    pub name: String,
    pub kind: DataKind,
    pub value: Value,
    /// Whether the node accepts external writes. Simulated points start
    /// writable; the scheduler bypasses this flag.
    pub writable: bool,
    /// Transient-unavailability flag; a faulted node rejects updates until
    /// the fault clears.
    pub faulted: bool,
    pub last_update: Option<DateTime<Utc>>,
}

/// Read-only view of a node for status output.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub address: String,
    pub name: String,
    pub kind: String,
    pub value: Value,
    pub last_update: Option<DateTime<Utc>>,
}

/// The root container of all live nodes.
#[derive(Debug, Default)]
pub struct AddressSpace {
    nodes: DashMap<NodeAddress, LiveNode>,
}

impl AddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the node set from a mapping document. Entries without a wire
    /// address are document-only and skipped silently; entries with a
    /// malformed address are skipped with a diagnostic. Never fatal.
    pub fn from_document(doc: &MappingDocument) -> Self {
        let space = Self::new();
        let mut skipped = 0usize;
        for entry in &doc.entries {
            if entry.node_id.is_empty() {
                continue;
            }
            match entry.node_id.parse::<NodeAddress>() {
                Ok(address) => space.insert(address, entry),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(
                        label = %entry.label,
                        node_id = %entry.node_id,
                        %err,
                        "skipping entry with malformed wire address"
                    );
                }
            }
        }
        tracing::info!(
            nodes = space.len(),
            skipped,
            "address space constructed"
        );
        space
    }

    /// Build the node set from a mapping file. A missing or malformed file
    /// logs the condition and yields an empty space; the process keeps
    /// running.
    pub fn from_mapping_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match read_mapping_file(path) {
            Ok(doc) => Self::from_document(&doc),
            Err(err) => {
                tracing::error!(
                    path = %path.display(),
                    %err,
                    "mapping file unusable, starting with an empty address space"
                );
                Self::new()
            }
        }
    }

    fn insert(&self, address: NodeAddress, entry: &MappingEntry) {
        let name = match entry.display_name() {
            Some(name) => name.to_string(),
            None => format!("Var_{}_{}", address.namespace, address.identifier.raw()),
        };
        let node = LiveNode {
            address: address.clone(),
            name,
            kind: entry.data_kind.clone(),
            value: Value::default_for(&entry.data_kind),
            writable: true,
            faulted: false,
            last_update: None,
        };
        self.nodes.insert(address, node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current value of a node, if it exists.
    pub fn read(&self, address: &NodeAddress) -> Option<Value> {
        self.nodes.get(address).map(|node| node.value)
    }

    /// External write to a writable point, routed through the per-node
    /// entry lock.
    pub fn write(&self, address: &NodeAddress, value: Value) -> Result<(), SpaceError> {
        let mut node = self
            .nodes
            .get_mut(address)
            .ok_or_else(|| SpaceError::NotFound(address.clone()))?;
        if !node.writable {
            return Err(SpaceError::NotWritable(address.clone()));
        }
        if node.faulted {
            return Err(SpaceError::NodeFaulted(address.clone()));
        }
        if !value.matches_kind(&node.kind) {
            return Err(SpaceError::KindMismatch {
                address: address.clone(),
                kind: node.kind.clone(),
            });
        }
        node.value = value;
        node.last_update = Some(Utc::now());
        Ok(())
    }

    /// Allow or deny external writes to a node. The scheduler keeps
    /// updating read-only nodes.
    pub fn set_writable(&self, address: &NodeAddress, writable: bool) -> Result<(), SpaceError> {
        let mut node = self
            .nodes
            .get_mut(address)
            .ok_or_else(|| SpaceError::NotFound(address.clone()))?;
        node.writable = writable;
        Ok(())
    }

    /// Mark a node transiently unavailable (or available again). Updates
    /// against a faulted node fail and are retried on the next tick.
    pub fn set_fault(&self, address: &NodeAddress, faulted: bool) -> Result<(), SpaceError> {
        let mut node = self
            .nodes
            .get_mut(address)
            .ok_or_else(|| SpaceError::NotFound(address.clone()))?;
        node.faulted = faulted;
        Ok(())
    }

    /// Addresses of all nodes, in map order (unspecified).
    pub fn addresses(&self) -> Vec<NodeAddress> {
        self.nodes.iter().map(|node| node.key().clone()).collect()
    }

    /// Apply a value mutation to one node under its entry lock. Fails when
    /// the node is missing or faulted; the caller decides whether that is
    /// fatal (the scheduler treats it as retry-next-tick).
    pub fn apply<F>(&self, address: &NodeAddress, mutate: F) -> Result<(), SpaceError>
    where
        F: FnOnce(&Value, &DataKind) -> Value,
    {
        let mut node = self
            .nodes
            .get_mut(address)
            .ok_or_else(|| SpaceError::NotFound(address.clone()))?;
        if node.faulted {
            return Err(SpaceError::NodeFaulted(address.clone()));
        }
        node.value = mutate(&node.value, &node.kind);
        node.last_update = Some(Utc::now());
        Ok(())
    }

    /// Snapshot of every node for status output, sorted by address text so
    /// the listing is stable.
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        let mut nodes: Vec<NodeSnapshot> = self
            .nodes
            .iter()
            .map(|node| NodeSnapshot {
                address: node.address.to_string(),
                name: node.name.clone(),
                kind: node.kind.to_string(),
                value: node.value,
                last_update: node.last_update,
            })
            .collect();
        nodes.sort_by(|a, b| a.address.cmp(&b.address));
        nodes
    }
}
