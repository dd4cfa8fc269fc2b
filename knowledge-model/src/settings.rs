use serde::{Deserialize, Serialize};

/// Per-source filter selection (spec.md §3/§4.2). Every field is optional;
/// an absent field means "no restriction on this dimension".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailFilter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MailFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senders: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// Top-level settings: per-source filters plus the globally disabled set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub filter: SourceFilter,
}

impl SourceFilter {
    /// Merges `self` (the request-supplied filter) over `persisted`: request
    /// fields take priority, falling back to persisted values when absent
    /// (spec.md §4.7 "Settings merge").
    pub fn merged_over(self, persisted: &SourceFilter) -> SourceFilter {
        SourceFilter {
            project_keys: self.project_keys.or_else(|| persisted.project_keys.clone()),
            channel_ids: self.channel_ids.or_else(|| persisted.channel_ids.clone()),
            space_keys: self.space_keys.or_else(|| persisted.space_keys.clone()),
            folder_ids: self.folder_ids.or_else(|| persisted.folder_ids.clone()),
            calendar_ids: self.calendar_ids.or_else(|| persisted.calendar_ids.clone()),
            mail: self.mail.or_else(|| persisted.mail.clone()),
        }
    }

    /// Deterministic fingerprint of the filter, used as the cursor's
    /// `configKey` (spec.md §4.7): sorted fields joined into one string,
    /// then SHA-256 hex.
    pub fn config_key(&self) -> String {
        use sha2::{Digest, Sha256};

        fn sorted_joined(v: &Option<Vec<String>>) -> String {
            let mut items: Vec<&str> = v
                .as_ref()
                .map(|xs| xs.iter().map(|s| s.as_str()).collect())
                .unwrap_or_default();
            items.sort_unstable();
            items.join(",")
        }

        let mail = self
            .mail
            .as_ref()
            .map(|m| {
                format!(
                    "{}|{}|{}",
                    sorted_joined(&m.domains),
                    sorted_joined(&m.senders),
                    sorted_joined(&m.labels)
                )
            })
            .unwrap_or_default();

        let fingerprint = format!(
            "project={}&channel={}&space={}&folder={}&calendar={}&mail={}",
            sorted_joined(&self.project_keys),
            sorted_joined(&self.channel_ids),
            sorted_joined(&self.space_keys),
            sorted_joined(&self.folder_ids),
            sorted_joined(&self.calendar_ids),
            mail,
        );

        let mut hasher = Sha256::new();
        hasher.update(fingerprint.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_key_is_stable_under_field_reordering() {
        let a = SourceFilter {
            project_keys: Some(vec!["B".into(), "A".into()]),
            ..Default::default()
        };
        let b = SourceFilter {
            project_keys: Some(vec!["A".into(), "B".into()]),
            ..Default::default()
        };
        assert_eq!(a.config_key(), b.config_key());
    }

    #[test]
    fn config_key_changes_when_filter_changes() {
        let a = SourceFilter {
            project_keys: Some(vec!["A".into()]),
            ..Default::default()
        };
        let b = SourceFilter {
            project_keys: Some(vec!["A".into(), "B".into()]),
            ..Default::default()
        };
        assert_ne!(a.config_key(), b.config_key());
    }

    #[test]
    fn merge_prefers_request_fields() {
        let persisted = SourceFilter {
            project_keys: Some(vec!["A".into()]),
            channel_ids: Some(vec!["C".into()]),
            ..Default::default()
        };
        let request = SourceFilter {
            project_keys: Some(vec!["B".into()]),
            ..Default::default()
        };
        let merged = request.merged_over(&persisted);
        assert_eq!(merged.project_keys, Some(vec!["B".into()]));
        assert_eq!(merged.channel_ids, Some(vec!["C".into()]));
    }
}
