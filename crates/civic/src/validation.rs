//! Data-contract checks run before a request is sent.

use crate::domain::{Identity, Issue, IssueDraft, Role, StaffDraft};
use crate::errors::{CivicError, CivicResult};

pub const MAX_TITLE_LEN: usize = 120;
pub const MAX_PHOTOS: usize = 5;
/// Reports allowed to a non-premium citizen
pub const DEFAULT_FREE_REPORT_LIMIT: usize = 3;

fn invalid(msg: impl Into<String>) -> CivicError {
    CivicError::Validation(msg.into())
}

/// Validate a report before `create_issue`.
pub fn validate_draft(draft: &IssueDraft) -> CivicResult<()> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(invalid("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(invalid(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    if draft.description.trim().is_empty() {
        return Err(invalid("Description is required"));
    }

    let location = &draft.location;
    if location.address.trim().is_empty() {
        return Err(invalid("Address is required"));
    }
    if !location.latitude.is_finite() || !(-90.0..=90.0).contains(&location.latitude) {
        return Err(invalid(format!(
            "Latitude {} is out of range [-90, 90]",
            location.latitude
        )));
    }
    if !location.longitude.is_finite() || !(-180.0..=180.0).contains(&location.longitude) {
        return Err(invalid(format!(
            "Longitude {} is out of range [-180, 180]",
            location.longitude
        )));
    }

    if draft.photos.len() > MAX_PHOTOS {
        return Err(invalid(format!("At most {} photos may be attached", MAX_PHOTOS)));
    }
    for (index, photo) in draft.photos.iter().enumerate() {
        if !is_image_reference(photo) {
            return Err(invalid(format!(
                "Photo {} must be a data:image URL or an http(s) URL",
                index + 1
            )));
        }
    }

    Ok(())
}

/// Photos travel as data URLs or links to already hosted images.
pub fn is_image_reference(photo: &str) -> bool {
    photo.starts_with("data:image/") || photo.starts_with("https://") || photo.starts_with("http://")
}

/// Enforce the free-tier report limit against the reporter's existing issues.
pub fn check_report_quota(reporter: &Identity, existing: &[Issue], limit: usize) -> CivicResult<()> {
    if reporter.role != Role::Citizen || reporter.is_premium {
        return Ok(());
    }
    let reported = existing
        .iter()
        .filter(|issue| issue.citizen_id == reporter.id)
        .count();
    if reported >= limit {
        return Err(CivicError::QuotaExceeded { limit });
    }
    Ok(())
}

/// Minimum password length for new accounts
pub const MIN_PASSWORD_LEN: usize = 6;

/// Name, email shape and password length for a new account.
pub fn validate_credentials(name: &str, email: &str, password: &str) -> CivicResult<()> {
    if name.trim().is_empty() {
        return Err(invalid("Name is required"));
    }
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(invalid(format!("'{}' is not a valid email address", email))),
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Validate a new staff account.
pub fn validate_staff_draft(draft: &StaffDraft) -> CivicResult<()> {
    validate_credentials(&draft.name, &draft.email, &draft.password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Location};

    fn draft() -> IssueDraft {
        IssueDraft {
            title: "Broken footpath".to_string(),
            description: "Tiles are missing".to_string(),
            category: Category::Footpath,
            priority: None,
            location: Location {
                address: "Park Ave".to_string(),
                latitude: 40.7,
                longitude: -73.9,
            },
            photos: vec!["https://img.example/1.jpg".to_string()],
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate_draft(&draft()).is_ok());
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut d = draft();
        d.title = "   ".to_string();
        assert_eq!(
            validate_draft(&d),
            Err(CivicError::Validation("Title is required".to_string()))
        );
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let mut d = draft();
        d.location.latitude = 91.0;
        assert!(validate_draft(&d).is_err());

        let mut d = draft();
        d.location.longitude = f64::NAN;
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn test_photo_must_be_image_reference() {
        let mut d = draft();
        d.photos.push("file:///etc/passwd".to_string());
        let err = validate_draft(&d).unwrap_err();
        assert!(err.to_string().contains("Photo 2"));
    }

    #[test]
    fn test_too_many_photos_rejected() {
        let mut d = draft();
        d.photos = vec!["data:image/png;base64,AA".to_string(); MAX_PHOTOS + 1];
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn test_quota_applies_to_free_citizens_only() {
        let existing: Vec<Issue> = (0..3).map(|_| Issue::from_draft(draft(), "c1")).collect();

        let free = Identity::new("c1", Role::Citizen);
        assert_eq!(
            check_report_quota(&free, &existing, 3),
            Err(CivicError::QuotaExceeded { limit: 3 })
        );

        let mut premium = Identity::new("c1", Role::Citizen);
        premium.is_premium = true;
        assert!(check_report_quota(&premium, &existing, 3).is_ok());

        let other = Identity::new("c2", Role::Citizen);
        assert!(check_report_quota(&other, &existing, 3).is_ok());
    }

    #[test]
    fn test_staff_draft_validation() {
        let ok = StaffDraft {
            name: "Rafi".to_string(),
            email: "rafi@city.gov".to_string(),
            phone: None,
            password: "secret1".to_string(),
        };
        assert!(validate_staff_draft(&ok).is_ok());

        let mut bad = ok.clone();
        bad.email = "rafi".to_string();
        assert!(validate_staff_draft(&bad).is_err());

        let mut short = ok;
        short.password = "123".to_string();
        assert!(validate_staff_draft(&short).is_err());
    }
}
