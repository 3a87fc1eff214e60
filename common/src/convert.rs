// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Utc};

use crate::{EngineError, Job, PaymentStatus, Quote, QuoteStatus, schedule};

/// Applies an accept/reject decision. Only pending quotes can change
/// status; `Rejected` is terminal and `Accepted` quotes change further
/// only through conversion stamping.
pub fn set_quote_status(quote: &mut Quote, new_status: QuoteStatus) -> Result<(), EngineError> {
    if new_status == QuoteStatus::Pending {
        return Err(EngineError::InvalidStatus {
            from: quote.status,
            action: "revert to pending",
        });
    }
    if quote.status != QuoteStatus::Pending {
        return Err(EngineError::InvalidStatus {
            from: quote.status,
            action: "change status",
        });
    }

    quote.status = new_status;
    Ok(())
}

/// Builds the job an accepted quote converts into.
///
/// Preconditions checked here, in order: the quote is `Accepted`, it has
/// not been converted before, and the candidate timestamp does not
/// collide with any existing job. On success the returned job copies the
/// quote's client data, description, materials and costs as-is, starts
/// with payment pending, and records the originating quote id. The caller
/// persists the job and stamps `converted_to_job_id` on the quote in the
/// same logical operation.
pub fn convert_to_job(
    quote: &Quote,
    scheduled_at: DateTime<Utc>,
    existing_jobs: &[Job],
    id: String,
) -> Result<Job, EngineError> {
    if quote.status != QuoteStatus::Accepted {
        return Err(EngineError::InvalidStatus {
            from: quote.status,
            action: "convert to a job",
        });
    }
    if let Some(job_id) = &quote.converted_to_job_id {
        return Err(EngineError::AlreadyConverted {
            job_id: job_id.clone(),
        });
    }
    if let Some(conflict) = schedule::find_conflict(scheduled_at, existing_jobs) {
        return Err(EngineError::ScheduleConflict {
            job_id: conflict.id.clone(),
            client_name: conflict.client_name.clone(),
            scheduled_at: conflict.scheduled_at,
        });
    }

    Ok(Job {
        id,
        client_id: quote.client_id.clone(),
        client_name: quote.client_name.clone(),
        address: quote.address.clone(),
        phone: quote.phone.clone(),
        work_type: quote.work_type.clone(),
        description: quote.description.clone(),
        materials: quote.materials.clone(),
        materials_cost: quote.materials_total,
        labor_cost: quote.labor_cost,
        total: quote.total,
        scheduled_at,
        photos: quote.photos.clone(),
        payment_status: PaymentStatus::Pending,
        quote_id: Some(quote.id.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MaterialLine;

    fn accepted_quote() -> Quote {
        Quote {
            id: "1700000000000".to_string(),
            client_id: "1600000000000".to_string(),
            client_name: "Ana Perez".to_string(),
            phone: "+54111".to_string(),
            address: "Calle 1".to_string(),
            work_type: "Electricidad".to_string(),
            description: "Rewire kitchen".to_string(),
            materials: vec![MaterialLine {
                description: "Cable".to_string(),
                quantity: "2".to_string(),
                unit_price: "10".to_string(),
            }],
            labor_cost: 50.0,
            materials_total: 20.0,
            total: 70.0,
            valid_until: "2024-04-01T00:00:00Z".parse().unwrap(),
            created_at: "2024-03-01T00:00:00Z".parse().unwrap(),
            status: QuoteStatus::Accepted,
            photos: vec!["file:///p.jpg".to_string()],
            converted_to_job_id: None,
        }
    }

    #[test]
    fn test_conversion_copies_quote_data() {
        let quote = accepted_quote();
        let scheduled_at = "2024-03-05T10:00:00Z".parse().unwrap();

        let job = convert_to_job(&quote, scheduled_at, &[], "1700000099999".to_string()).unwrap();

        assert_eq!(job.payment_status, PaymentStatus::Pending);
        assert_eq!(job.quote_id.as_deref(), Some("1700000000000"));
        assert_eq!(job.materials_cost, quote.materials_total);
        assert_eq!(job.labor_cost, quote.labor_cost);
        assert_eq!(job.total, quote.total);
        assert_eq!(job.materials, quote.materials);
        assert_eq!(job.scheduled_at, scheduled_at);
        assert_eq!(job.client_name, "Ana Perez");
    }

    #[test]
    fn test_pending_quote_cannot_convert() {
        let mut quote = accepted_quote();
        quote.status = QuoteStatus::Pending;

        let err = convert_to_job(
            &quote,
            "2024-03-05T10:00:00Z".parse().unwrap(),
            &[],
            "x".to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidStatus { .. }));
    }

    #[test]
    fn test_converted_quote_cannot_convert_again() {
        let mut quote = accepted_quote();
        quote.converted_to_job_id = Some("old-job".to_string());

        let err = convert_to_job(
            &quote,
            "2024-03-05T10:00:00Z".parse().unwrap(),
            &[],
            "x".to_string(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::AlreadyConverted {
                job_id: "old-job".to_string()
            }
        );
    }

    #[test]
    fn test_conversion_aborts_on_schedule_conflict() {
        let quote = accepted_quote();
        let scheduled_at: DateTime<Utc> = "2024-03-05T10:00:00Z".parse().unwrap();

        let existing = convert_to_job(&quote, scheduled_at, &[], "job-1".to_string()).unwrap();
        let mut other = accepted_quote();
        other.id = "other".to_string();
        other.converted_to_job_id = None;

        let err = convert_to_job(
            &other,
            scheduled_at + chrono::Duration::seconds(30),
            std::slice::from_ref(&existing),
            "job-2".to_string(),
        )
        .unwrap_err();

        match err {
            EngineError::ScheduleConflict {
                job_id,
                client_name,
                ..
            } => {
                assert_eq!(job_id, "job-1");
                assert_eq!(client_name, "Ana Perez");
            }
            other => panic!("expected a schedule conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_status_changes_only_from_pending() {
        let mut quote = accepted_quote();
        quote.status = QuoteStatus::Pending;

        set_quote_status(&mut quote, QuoteStatus::Accepted).unwrap();
        assert_eq!(quote.status, QuoteStatus::Accepted);

        let err = set_quote_status(&mut quote, QuoteStatus::Rejected).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidStatus {
                from: QuoteStatus::Accepted,
                ..
            }
        ));
    }

    #[test]
    fn test_rejected_is_terminal() {
        let mut quote = accepted_quote();
        quote.status = QuoteStatus::Pending;
        set_quote_status(&mut quote, QuoteStatus::Rejected).unwrap();

        let err = set_quote_status(&mut quote, QuoteStatus::Accepted).unwrap_err();
        assert!(matches!(err, EngineError::InvalidStatus { .. }));
    }
}
