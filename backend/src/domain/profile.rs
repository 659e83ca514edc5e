//! Profile snapshot and completion scoring.
//!
//! Profile completion is derived on every evaluation from the current
//! snapshot; it is never cached or persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of fields a profile needs for completeness.
pub const REQUIRED_PROFILE_FIELDS: usize = 7;

/// In-memory snapshot of the profile fields the gate inspects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Public display name.
    pub display_name: Option<String>,
    /// Profile photo URL; also the basis of the photo-verified check.
    pub avatar_url: Option<String>,
    /// Free-text introduction.
    pub bio: Option<String>,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Self-described gender.
    pub gender: Option<String>,
    /// Home city.
    pub city: Option<String>,
    /// Selected interest tags.
    pub interests: Vec<String>,
}

/// Derived completion state for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCompletion {
    /// Rounded percentage of required fields present.
    pub percent: u8,
    /// Whether every required field is present.
    pub is_complete: bool,
    /// Human labels for the absent fields, in display order.
    pub missing_fields: Vec<String>,
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

impl ProfileSnapshot {
    /// Whether the profile carries a usable photo.
    pub fn photo_verified(&self) -> bool {
        present(self.avatar_url.as_deref())
    }

    /// Score the seven required fields.
    pub fn completion(&self) -> ProfileCompletion {
        let fields: [(&str, bool); REQUIRED_PROFILE_FIELDS] = [
            ("Display name", present(self.display_name.as_deref())),
            ("Profile photo", present(self.avatar_url.as_deref())),
            ("Bio", present(self.bio.as_deref())),
            ("Date of birth", self.birth_date.is_some()),
            ("Gender", present(self.gender.as_deref())),
            ("City", present(self.city.as_deref())),
            ("Interests", !self.interests.is_empty()),
        ];

        let filled = fields.iter().filter(|(_, ok)| *ok).count();
        let missing_fields: Vec<String> = fields
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(label, _)| (*label).to_owned())
            .collect();

        let percent = ((filled as f64 / REQUIRED_PROFILE_FIELDS as f64) * 100.0).round() as u8;
        ProfileCompletion {
            percent,
            is_complete: missing_fields.is_empty(),
            missing_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> ProfileSnapshot {
        ProfileSnapshot {
            display_name: Some("Ada".to_owned()),
            avatar_url: Some("https://cdn.example/avatars/ada.jpg".to_owned()),
            bio: Some("Hill walks and board games.".to_owned()),
            birth_date: NaiveDate::from_ymd_opt(1995, 4, 2),
            gender: Some("woman".to_owned()),
            city: Some("Leith".to_owned()),
            interests: vec!["hiking".to_owned()],
        }
    }

    #[test]
    fn complete_profile_scores_one_hundred() {
        let completion = complete_profile().completion();
        assert!(completion.is_complete);
        assert_eq!(completion.percent, 100);
        assert!(completion.missing_fields.is_empty());
    }

    #[test]
    fn empty_profile_lists_every_field() {
        let completion = ProfileSnapshot::default().completion();
        assert!(!completion.is_complete);
        assert_eq!(completion.percent, 0);
        assert_eq!(completion.missing_fields.len(), REQUIRED_PROFILE_FIELDS);
    }

    #[test]
    fn whitespace_only_values_do_not_count() {
        let profile = ProfileSnapshot {
            avatar_url: Some("   ".to_owned()),
            ..complete_profile()
        };
        let completion = profile.completion();
        assert!(!completion.is_complete);
        assert_eq!(completion.missing_fields, vec!["Profile photo".to_owned()]);
        assert!(!profile.photo_verified());
    }

    #[test]
    fn percent_rounds_to_nearest_integer() {
        let profile = ProfileSnapshot {
            display_name: Some("Ada".to_owned()),
            ..ProfileSnapshot::default()
        };
        // 1/7 ≈ 14.29 rounds to 14.
        assert_eq!(profile.completion().percent, 14);
    }
}
