// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph-level exposed parameters.
//!
//! A parameter is a named, typed value the graph exposes to its host. Its
//! settings decide whether the inspector lists it and whether it acts as an
//! input of the graph.

use crate::port::PortType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an exposed parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterId(pub Uuid);

impl ParameterId {
    /// Create a new random parameter ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParameterId {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-parameter flags edited from the parameter panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSettings {
    /// Left out of the inspector
    pub is_hidden: bool,
    /// Fed by the host rather than read back from the graph
    pub is_input_parameter: bool,
}

/// A parameter exposed by a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposedParameter {
    /// Parameter ID
    pub id: ParameterId,
    /// Display name
    pub name: String,
    /// Value type
    pub port_type: PortType,
    /// Visibility and role flags
    pub settings: ParameterSettings,
}

impl ExposedParameter {
    /// Create a visible, non-input parameter
    pub fn new(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            id: ParameterId::new(),
            name: name.into(),
            port_type,
            settings: ParameterSettings::default(),
        }
    }

    /// Whether the inspector shows this parameter
    pub fn is_visible(&self) -> bool {
        !self.settings.is_hidden
    }
}

/// Error when editing exposed parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    /// Parameter not found
    #[error("Parameter not found: {0:?}")]
    NotFound(ParameterId),

    /// Another parameter already uses the name
    #[error("Parameter name already in use: {0}")]
    DuplicateName(String),
}
