//! Shared FHIR data types used by both resources.
//!
//! Wire structs are lenient: resources returned by the Clinical Records API carry many more
//! fields than the booking workflow reads, so unknown keys are ignored rather than rejected.

use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// A coded value from a terminology system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Coding {
    pub system: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
}

/// A concept described by zero or more codings plus optional free text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeableConcept {
    pub codings: Vec<Coding>,
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Best human-readable descriptor: `text`, then the first coding's `display`, then the
    /// first coding's `code`.
    ///
    /// Only the first coding is consulted; later codings are alternates.
    pub fn descriptor(&self) -> Option<&str> {
        let first = self.codings.first();
        non_blank(self.text.as_deref())
            .or_else(|| first.and_then(|c| non_blank(c.display.as_deref())))
            .or_else(|| first.and_then(|c| non_blank(c.code.as_deref())))
    }
}

/// A reference to another resource, e.g. `Patient/123`, with optional display text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reference {
    pub reference: Option<String>,
    pub display: Option<String>,
}

impl Reference {
    /// Build a `Type/id` reference with display text.
    pub fn to_resource(resource_type: &str, id: &str, display: impl Into<String>) -> Self {
        Self {
            reference: Some(format!("{resource_type}/{id}")),
            display: Some(display.into()),
        }
    }

    /// The id part of a `Type/id` reference when the type matches `resource_type`.
    pub fn target_id(&self, resource_type: &str) -> Option<&str> {
        let reference = self.reference.as_deref()?;
        let (kind, rest) = reference.split_once('/')?;
        if kind != resource_type {
            return None;
        }
        rest.split('/').next().filter(|id| !id.is_empty())
    }
}

/// A business identifier (`system` + `value`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identifier {
    pub system: Option<String>,
    pub value: Option<String>,
}

impl Identifier {
    pub fn matches(&self, system: &str, value: &str) -> bool {
        self.system.as_deref() == Some(system) && self.value.as_deref() == Some(value)
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Wire types (crate-internal)
// ============================================================================

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct CodingWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct CodeableConceptWire {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<CodingWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct ReferenceWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct IdentifierWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

// ============================================================================
// Translation helpers (crate-internal)
// ============================================================================

impl From<CodingWire> for Coding {
    fn from(wire: CodingWire) -> Self {
        Self {
            system: wire.system,
            code: wire.code,
            display: wire.display,
        }
    }
}

impl From<&Coding> for CodingWire {
    fn from(coding: &Coding) -> Self {
        Self {
            system: coding.system.clone(),
            code: coding.code.clone(),
            display: coding.display.clone(),
        }
    }
}

impl From<CodeableConceptWire> for CodeableConcept {
    fn from(wire: CodeableConceptWire) -> Self {
        Self {
            codings: wire.coding.into_iter().map(Coding::from).collect(),
            text: wire.text,
        }
    }
}

impl From<&CodeableConcept> for CodeableConceptWire {
    fn from(concept: &CodeableConcept) -> Self {
        Self {
            coding: concept.codings.iter().map(CodingWire::from).collect(),
            text: concept.text.clone(),
        }
    }
}

impl From<ReferenceWire> for Reference {
    fn from(wire: ReferenceWire) -> Self {
        Self {
            reference: wire.reference,
            display: wire.display,
        }
    }
}

impl From<&Reference> for ReferenceWire {
    fn from(reference: &Reference) -> Self {
        Self {
            reference: reference.reference.clone(),
            display: reference.display.clone(),
        }
    }
}

impl From<IdentifierWire> for Identifier {
    fn from(wire: IdentifierWire) -> Self {
        Self {
            system: wire.system,
            value: wire.value,
        }
    }
}

impl From<&Identifier> for IdentifierWire {
    fn from(identifier: &Identifier) -> Self {
        Self {
            system: identifier.system.clone(),
            value: identifier.value.clone(),
        }
    }
}
