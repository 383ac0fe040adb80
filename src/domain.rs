use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::KcatError;

/// Where a kcat value came from. Encoded on the wire as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Provenance {
    Experimental,
    ModelA,
    ModelB,
    Other(i64),
}

impl Provenance {
    pub fn code(self) -> i64 {
        match self {
            Provenance::Experimental => 0,
            Provenance::ModelA => 1,
            Provenance::ModelB => 2,
            Provenance::Other(code) => code,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Provenance::Experimental,
            1 => Provenance::ModelA,
            2 => Provenance::ModelB,
            other => Provenance::Other(other),
        }
    }

    pub fn is_predicted(self) -> bool {
        !matches!(self, Provenance::Experimental)
    }
}

impl From<i64> for Provenance {
    fn from(code: i64) -> Self {
        Provenance::from_code(code)
    }
}

impl From<Provenance> for i64 {
    fn from(provenance: Provenance) -> Self {
        provenance.code()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Experimental => write!(f, "experimental"),
            Provenance::ModelA => write!(f, "{}", SourceModel::A.label()),
            Provenance::ModelB => write!(f, "{}", SourceModel::B.label()),
            Provenance::Other(code) => write!(f, "other({code})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum SourceModel {
    A,
    B,
}

impl SourceModel {
    pub fn label(self) -> &'static str {
        match self {
            SourceModel::A => "UniKP",
            SourceModel::B => "DLTKcat",
        }
    }

    pub fn provenance(self) -> Provenance {
        match self {
            SourceModel::A => Provenance::ModelA,
            SourceModel::B => Provenance::ModelB,
        }
    }

    /// Substrate name used when the structure lookup yields nothing.
    pub fn placeholder_name(self) -> &'static str {
        match self {
            SourceModel::A => "UniKP prediction",
            SourceModel::B => "DLTKcat prediction",
        }
    }

    pub fn is_placeholder(name: &str) -> bool {
        let name = name.trim();
        name.is_empty()
            || name == SourceModel::A.placeholder_name()
            || name == SourceModel::B.placeholder_name()
    }
}

impl fmt::Display for SourceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub fn format_kcat(value: f64) -> String {
    format!("{value:.4}")
}

/// Search criteria. Empty and whitespace-only values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    pub ec_number: Option<String>,
    pub prot_id: Option<String>,
    pub substrate_name: Option<String>,
    pub substrate_smiles: Option<String>,
}

impl QueryFilter {
    pub fn by_ec_number(ec_number: impl Into<String>) -> Self {
        Self {
            ec_number: Some(ec_number.into()),
            ..Self::default()
        }
    }

    /// Query-string pairs for the populated fields, values trimmed.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("ecNumber", &self.ec_number),
            ("protId", &self.prot_id),
            ("sub", &self.substrate_name),
            ("smiles", &self.substrate_smiles),
        ]
        .into_iter()
        .filter_map(|(key, value)| populated(value).map(|value| (key, value)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    pub fn validate(&self) -> Result<(), KcatError> {
        if self.is_empty() {
            return Err(KcatError::validation(
                "enter at least one search criterion (EC number, protein id, substrate name or SMILES)",
            ));
        }
        Ok(())
    }
}

fn populated(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// A kcat row returned by the enzyme database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnzymeRecord {
    pub ec_number: Option<String>,
    pub prot_id: Option<String>,
    pub substrate_name: Option<String>,
    pub smiles: Option<String>,
    pub protein_sequence: Option<String>,
    pub temperature_celsius: Option<f64>,
    pub kcat_value: f64,
    pub formatted_kcat: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelARequest {
    pub substrate_smiles: String,
    pub protein_sequence: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelBRequest {
    pub substrate_smiles: String,
    pub protein_sequence: String,
    pub temperature_celsius: Option<f64>,
}

/// Shared view over the per-model request shapes.
pub trait PredictionInput: Send + Sync {
    fn source_model(&self) -> SourceModel;
    fn substrate_smiles(&self) -> &str;
    fn protein_sequence(&self) -> &str;
    fn temperature_celsius(&self) -> Option<f64>;
    fn missing_fields(&self) -> Vec<&'static str>;

    fn validate(&self) -> Result<(), KcatError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(KcatError::missing_fields(&missing))
        }
    }
}

fn missing_common(smiles: &str, sequence: &str) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if smiles.trim().is_empty() {
        missing.push("substrate_smiles");
    }
    if sequence.trim().is_empty() {
        missing.push("protein_sequence");
    }
    missing
}

impl PredictionInput for ModelARequest {
    fn source_model(&self) -> SourceModel {
        SourceModel::A
    }

    fn substrate_smiles(&self) -> &str {
        self.substrate_smiles.trim()
    }

    fn protein_sequence(&self) -> &str {
        self.protein_sequence.trim()
    }

    fn temperature_celsius(&self) -> Option<f64> {
        None
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        missing_common(&self.substrate_smiles, &self.protein_sequence)
    }
}

impl PredictionInput for ModelBRequest {
    fn source_model(&self) -> SourceModel {
        SourceModel::B
    }

    fn substrate_smiles(&self) -> &str {
        self.substrate_smiles.trim()
    }

    fn protein_sequence(&self) -> &str {
        self.protein_sequence.trim()
    }

    fn temperature_celsius(&self) -> Option<f64> {
        self.temperature_celsius
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = missing_common(&self.substrate_smiles, &self.protein_sequence);
        if !self.temperature_celsius.is_some_and(f64::is_finite) {
            missing.push("temperature_celsius");
        }
        missing
    }
}

/// Parses a temperature typed by the user.
pub fn parse_temperature(value: &str) -> Result<f64, KcatError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|celsius| celsius.is_finite())
        .ok_or_else(|| KcatError::Validation {
            message: format!("temperature_celsius must be numeric, got {value:?}"),
            fields: vec!["temperature_celsius".to_string()],
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub substrate_name: String,
    pub substrate_smiles: String,
    pub protein_sequence: String,
    pub temperature_celsius: Option<f64>,
    pub kcat_value: Option<f64>,
    pub formatted_kcat: Option<String>,
    pub source_model: SourceModel,
    #[serde(rename = "provenanceCode")]
    pub provenance: Provenance,
}

impl PredictionResult {
    pub fn new<I: PredictionInput + ?Sized>(
        input: &I,
        substrate_name: String,
        kcat_value: Option<f64>,
    ) -> Self {
        let source_model = input.source_model();
        Self {
            substrate_name,
            substrate_smiles: input.substrate_smiles().to_string(),
            protein_sequence: input.protein_sequence().to_string(),
            temperature_celsius: input.temperature_celsius(),
            kcat_value,
            formatted_kcat: kcat_value.map(format_kcat),
            source_model,
            provenance: source_model.provenance(),
        }
    }

    pub fn model_label(&self) -> &'static str {
        self.source_model.label()
    }
}
