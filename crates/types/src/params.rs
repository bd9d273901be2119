//! Report parameter state as returned by the backend's parameter endpoints.
//!
//! Both the plain fetch and the validate call return the same shape; the
//! session only proceeds to rendering when every parameter has a valid value.

use serde::{Deserialize, Serialize};

/// Validity of a single report parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterStateKind {
    #[default]
    HasValidValue,
    MissingValidValue,
    HasOutstandingDependencies,
    DynamicValuesUnavailable,
}

impl ParameterStateKind {
    pub fn is_valid(self) -> bool {
        self == ParameterStateKind::HasValidValue
    }
}

/// One report parameter with its current values and validity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterState {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub state: ParameterStateKind,
    #[serde(default)]
    pub hidden: bool,
}

impl ParameterState {
    pub fn valid(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
            state: ParameterStateKind::HasValidValue,
            hidden: false,
        }
    }
}

/// True when any parameter is in a state other than `HasValidValue`.
pub fn has_invalid_parameters(parameters: &[ParameterState]) -> bool {
    !parameters.iter().all(|p| p.state.is_valid())
}

/// True when any parameter should be shown in a parameters panel.
pub fn has_visible_parameters(parameters: &[ParameterState]) -> bool {
    !parameters.iter().all(|p| p.hidden)
}
