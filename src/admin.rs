use crate::settings::{SettingsStore, ACCESS_LIST_KEY, ENABLED_KEY};
use crate::GateError;

/// Line separator of the access list textarea.
const FIELD_SEPARATOR: &str = "\r\n";

/// Posted values that count as blank, like an unchecked box.
pub(crate) fn is_blank(value: &str) -> bool {
    matches!(value, "" | "0")
}

/// Values posted by the administrative settings form.
///
/// Both fields are `None` when the browser didn't send them (an unchecked checkbox, for instance).
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct AdminSubmission {
    /// Value of the enabled checkbox.
    pub enabled: Option<String>,
    /// Content of the access list textarea.
    pub access_list: Option<String>,
}

impl AdminSubmission {
    pub fn new(enabled: Option<&str>, access_list: Option<&str>) -> Self {
        Self {
            enabled: enabled.map(ToOwned::to_owned),
            access_list: access_list.map(ToOwned::to_owned),
        }
    }

    /// Access list lines as they will be stored.
    ///
    /// An empty textarea, or one holding just `0`, clears the list.
    #[must_use]
    pub fn access_list_lines(&self) -> Vec<String> {
        match self.access_list.as_deref().map(str::trim) {
            Some(text) if !is_blank(text) => {
                text.split(FIELD_SEPARATOR).map(ToOwned::to_owned).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Writes the submitted values to `store`.
    ///
    /// Prefer [`AccessGate::save_settings`](crate::AccessGate::save_settings),
    /// which also drops the settings the gate has cached.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError::Storage`] if the store can't be written.
    pub fn apply<S: SettingsStore + ?Sized>(&self, store: &S) -> Result<(), GateError> {
        let enabled = self
            .enabled
            .as_deref()
            .map(str::trim)
            .filter(|value| !is_blank(value))
            .unwrap_or_default();
        store.set(ENABLED_KEY, enabled)?;
        store.set_list(ACCESS_LIST_KEY, &self.access_list_lines())
    }
}

/// Renders stored access list lines back into the textarea content.
#[must_use]
pub fn access_list_field<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(AsRef::<str>::as_ref)
        .collect::<Vec<&str>>()
        .join(FIELD_SEPARATOR)
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use crate::admin::{access_list_field, AdminSubmission};
    use crate::settings::{MemorySettings, SettingsStore, ACCESS_LIST_KEY, ENABLED_KEY};

    #[test]
    fn test_submission_lines() {
        let submission = AdminSubmission::new(
            Some("1"),
            Some("1.1.1.1\r\n1.1.1.1-1.1.1.8\r\n# office\r\n1.1.1.1/32\r\n"),
        );
        assert_eq!(
            submission.access_list_lines(),
            vec!["1.1.1.1", "1.1.1.1-1.1.1.8", "# office", "1.1.1.1/32"]
        );

        assert!(AdminSubmission::new(Some("1"), None)
            .access_list_lines()
            .is_empty());
        assert!(AdminSubmission::new(Some("1"), Some(""))
            .access_list_lines()
            .is_empty());
        assert!(AdminSubmission::new(Some("1"), Some(" \r\n "))
            .access_list_lines()
            .is_empty());
    }

    #[test]
    fn test_apply_submission() {
        let store = MemorySettings::new();

        AdminSubmission::new(Some("1"), Some("10.0.0.0/8\r\n::1"))
            .apply(&store)
            .unwrap();
        assert_eq!(store.get(ENABLED_KEY), Ok(Some("1".to_owned())));
        assert_eq!(
            store.get_list(ACCESS_LIST_KEY),
            Ok(vec!["10.0.0.0/8".to_owned(), "::1".to_owned()])
        );

        // unchecked box and empty textarea
        AdminSubmission::default().apply(&store).unwrap();
        assert_eq!(store.get(ENABLED_KEY), Ok(Some(String::new())));
        assert_eq!(store.get_list(ACCESS_LIST_KEY), Ok(vec![]));
    }

    #[test]
    fn test_zero_is_a_blank_submission() {
        let store = MemorySettings::new();
        AdminSubmission::new(Some("1"), Some("1.1.1.1"))
            .apply(&store)
            .unwrap();

        AdminSubmission::new(Some("0"), Some(" 0 \r\n"))
            .apply(&store)
            .unwrap();
        assert_eq!(store.get(ENABLED_KEY), Ok(Some(String::new())));
        assert_eq!(store.get_list(ACCESS_LIST_KEY), Ok(vec![]));

        // a zero among other entries is kept
        assert_eq!(
            AdminSubmission::new(None, Some("0\r\n1.1.1.1")).access_list_lines(),
            vec!["0", "1.1.1.1"]
        );
    }

    #[test]
    fn test_access_list_field() {
        assert_eq!(
            access_list_field(&["1.1.1.1", "# office", "10.0.0.0/8"]),
            "1.1.1.1\r\n# office\r\n10.0.0.0/8"
        );
        assert_eq!(access_list_field(&["", "1.1.1.1", ""]), "1.1.1.1");
        assert_eq!(access_list_field::<String>(&[]), "");

        let submission = AdminSubmission::new(Some("1"), Some(&access_list_field(&["a", "b"])));
        assert_eq!(submission.access_list_lines(), vec!["a", "b"]);
    }
}
