use serde::Serialize;

use crate::domain::{EnzymeRecord, PredictionResult, Provenance};

/// One display row; the variant says which kind of source produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DisplayRecord {
    Measured(EnzymeRecord),
    Predicted(PredictionResult),
}

impl DisplayRecord {
    pub fn provenance(&self) -> Provenance {
        match self {
            DisplayRecord::Measured(record) => record.provenance,
            DisplayRecord::Predicted(result) => result.provenance,
        }
    }

    pub fn substrate_name(&self) -> Option<&str> {
        match self {
            DisplayRecord::Measured(record) => record.substrate_name.as_deref(),
            DisplayRecord::Predicted(result) => Some(result.substrate_name.as_str()),
        }
    }

    pub fn smiles(&self) -> Option<&str> {
        match self {
            DisplayRecord::Measured(record) => record.smiles.as_deref(),
            DisplayRecord::Predicted(result) => Some(result.substrate_smiles.as_str()),
        }
    }

    pub fn formatted_kcat(&self) -> Option<&str> {
        match self {
            DisplayRecord::Measured(record) => Some(record.formatted_kcat.as_str()),
            DisplayRecord::Predicted(result) => result.formatted_kcat.as_deref(),
        }
    }
}

/// Query rows first, then model A, then model B. No dedup, no re-tagging.
pub fn merge(
    query_results: &[EnzymeRecord],
    model_a: &[PredictionResult],
    model_b: &[PredictionResult],
) -> Vec<DisplayRecord> {
    query_results
        .iter()
        .cloned()
        .map(DisplayRecord::Measured)
        .chain(model_a.iter().cloned().map(DisplayRecord::Predicted))
        .chain(model_b.iter().cloned().map(DisplayRecord::Predicted))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelARequest, ModelBRequest};

    fn measured(provenance: Provenance) -> EnzymeRecord {
        EnzymeRecord {
            ec_number: Some("1.1.1.1".to_string()),
            prot_id: Some("P00330".to_string()),
            substrate_name: Some("ethanol".to_string()),
            smiles: Some("CCO".to_string()),
            protein_sequence: None,
            temperature_celsius: None,
            kcat_value: 12.5,
            formatted_kcat: "12.5000".to_string(),
            provenance,
        }
    }

    #[test]
    fn order_and_provenance_are_preserved() {
        let a = PredictionResult::new(
            &ModelARequest {
                substrate_smiles: "CCO".to_string(),
                protein_sequence: "MKT".to_string(),
            },
            "ethanol".to_string(),
            Some(1.0),
        );
        let b = PredictionResult::new(
            &ModelBRequest {
                substrate_smiles: "CCO".to_string(),
                protein_sequence: "MKT".to_string(),
                temperature_celsius: Some(37.0),
            },
            "ethanol".to_string(),
            Some(2.0),
        );
        let query = vec![measured(Provenance::Experimental), measured(Provenance::ModelB)];

        let merged = merge(&query, &[a.clone()], &[b.clone()]);
        let provenance: Vec<_> = merged.iter().map(DisplayRecord::provenance).collect();
        assert_eq!(
            provenance,
            vec![
                Provenance::Experimental,
                Provenance::ModelB,
                Provenance::ModelA,
                Provenance::ModelB,
            ]
        );
        assert_eq!(merged[2], DisplayRecord::Predicted(a));
        assert_eq!(merged[3], DisplayRecord::Predicted(b));
    }

    #[test]
    fn identical_rows_are_not_deduplicated() {
        let row = measured(Provenance::Experimental);
        let merged = merge(&[row.clone(), row], &[], &[]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn empty_inputs_give_empty_output() {
        assert!(merge(&[], &[], &[]).is_empty());
    }
}
