// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::{EngineError, MaterialLine, NewClientPayload, NewJobPayload, NewQuotePayload};

/// Keeps only material lines whose description is filled in. Lines with a
/// description but empty quantity or price are kept as-is; the aggregator
/// values those fields at zero.
pub fn filled_materials(lines: &[MaterialLine]) -> Vec<MaterialLine> {
    lines
        .iter()
        .filter(|line| !line.description.trim().is_empty())
        .cloned()
        .collect()
}

/// Required-field contract for a new job: client, address, work type,
/// description, and at least one filled material line. Reports every
/// missing field at once.
pub fn validate_new_job(payload: &NewJobPayload) -> Result<(), EngineError> {
    let mut missing = Vec::new();
    if payload.client_id.trim().is_empty() {
        missing.push("client");
    }
    if payload.address.trim().is_empty() {
        missing.push("address");
    }
    if payload.work_type.trim().is_empty() {
        missing.push("workType");
    }
    if payload.description.trim().is_empty() {
        missing.push("description");
    }
    if filled_materials(&payload.materials).is_empty() {
        missing.push("materials");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation { missing })
    }
}

/// Required-field contract for a new quote: client, work type,
/// description, and at least one filled material line. The validity date
/// is taken as supplied — a quote valid only in the past is legal.
pub fn validate_new_quote(payload: &NewQuotePayload) -> Result<(), EngineError> {
    let mut missing = Vec::new();
    if payload.client_id.trim().is_empty() {
        missing.push("client");
    }
    if payload.work_type.trim().is_empty() {
        missing.push("workType");
    }
    if payload.description.trim().is_empty() {
        missing.push("description");
    }
    if filled_materials(&payload.materials).is_empty() {
        missing.push("materials");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation { missing })
    }
}

/// All four client registration fields are required.
pub fn validate_new_client(payload: &NewClientPayload) -> Result<(), EngineError> {
    let mut missing = Vec::new();
    if payload.first_name.trim().is_empty() {
        missing.push("firstName");
    }
    if payload.last_name.trim().is_empty() {
        missing.push("lastName");
    }
    if payload.phone.trim().is_empty() {
        missing.push("phone");
    }
    if payload.address.trim().is_empty() {
        missing.push("address");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation { missing })
    }
}

/// A material line added to an existing quote or job must arrive fully
/// filled in, unlike the creation forms where only the description is
/// mandatory.
pub fn validate_material_line(line: &MaterialLine) -> Result<(), EngineError> {
    let mut missing = Vec::new();
    if line.description.trim().is_empty() {
        missing.push("description");
    }
    if line.quantity.trim().is_empty() {
        missing.push("quantity");
    }
    if line.unit_price.trim().is_empty() {
        missing.push("unitPrice");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation { missing })
    }
}

/// Phone numbers are stored with the country prefix; numbers typed
/// without one get +54 prepended.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("+54") {
        trimmed.to_string()
    } else {
        format!("+54{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn line(description: &str, quantity: &str, unit_price: &str) -> MaterialLine {
        MaterialLine {
            description: description.to_string(),
            quantity: quantity.to_string(),
            unit_price: unit_price.to_string(),
        }
    }

    fn job_payload() -> NewJobPayload {
        NewJobPayload {
            client_id: "1700000000000".to_string(),
            address: "Calle 1".to_string(),
            work_type: "Electricidad".to_string(),
            description: "Replace breaker panel".to_string(),
            materials: vec![line("Breaker", "1", "40")],
            labor_cost: "50".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            time: "10:00:00".parse().unwrap(),
            photos: Vec::new(),
        }
    }

    #[test]
    fn test_complete_job_payload_passes() {
        assert!(validate_new_job(&job_payload()).is_ok());
    }

    #[test]
    fn test_missing_description_is_reported_by_name() {
        let mut payload = job_payload();
        payload.description = String::new();

        let err = validate_new_job(&payload).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation {
                missing: vec!["description"]
            }
        );
    }

    #[test]
    fn test_every_missing_job_field_is_listed() {
        let payload = NewJobPayload {
            client_id: String::new(),
            address: "  ".to_string(),
            work_type: String::new(),
            description: String::new(),
            materials: Vec::new(),
            labor_cost: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            time: "10:00:00".parse().unwrap(),
            photos: Vec::new(),
        };

        let err = validate_new_job(&payload).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation {
                missing: vec!["client", "address", "workType", "description", "materials"]
            }
        );
    }

    #[test]
    fn test_materials_with_only_empty_descriptions_do_not_count() {
        let mut payload = job_payload();
        payload.materials = vec![line("", "2", "10"), line("   ", "1", "5")];

        let err = validate_new_job(&payload).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation {
                missing: vec!["materials"]
            }
        );
    }

    #[test]
    fn test_quote_does_not_require_address() {
        let payload = NewQuotePayload {
            client_id: "1".to_string(),
            work_type: "Aire".to_string(),
            description: "Install split unit".to_string(),
            materials: vec![line("Bracket", "2", "15")],
            labor_cost: String::new(),
            valid_until: "2024-04-01T00:00:00Z".parse().unwrap(),
            address: None,
            photos: Vec::new(),
        };

        assert!(validate_new_quote(&payload).is_ok());
    }

    #[test]
    fn test_filled_materials_drops_empty_lines_only() {
        let lines = vec![line("Cable", "", ""), line("", "2", "10")];

        let kept = filled_materials(&lines);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].description, "Cable");
        // Empty quantity/price survive; the aggregator values them at 0.
        assert_eq!(kept[0].quantity, "");
    }

    #[test]
    fn test_client_requires_all_fields() {
        let payload = NewClientPayload {
            first_name: "Ana".to_string(),
            last_name: String::new(),
            phone: "111".to_string(),
            address: String::new(),
        };

        let err = validate_new_client(&payload).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation {
                missing: vec!["lastName", "address"]
            }
        );
    }

    #[test]
    fn test_phone_gets_country_prefix() {
        assert_eq!(normalize_phone("1155556666"), "+541155556666");
        assert_eq!(normalize_phone(" +541155556666 "), "+541155556666");
    }
}
