use serde::Serialize;

/// Which store operation a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageAction {
    Load,
    Save,
    Delete,
}

impl std::fmt::Display for StorageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageAction::Load => write!(f, "load"),
            StorageAction::Save => write!(f, "save"),
            StorageAction::Delete => write!(f, "delete"),
        }
    }
}

/// A visible, non-fatal message for the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    StorageFailure {
        action: StorageAction,
        subject: String,
        message: String,
    },
    DirectoryConnected {
        name: String,
    },
    CapabilityUnsupported {
        capability: String,
    },
    DirectoryDenied {
        reason: String,
    },
}

impl Notice {
    /// Alert-level notices interrupt the user (capability problems).
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            Notice::CapabilityUnsupported { .. } | Notice::DirectoryDenied { .. }
        )
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::StorageFailure {
                action,
                subject,
                message,
            } => write!(f, "Could not {action} {subject}: {message}"),
            Notice::DirectoryConnected { name } => write!(
                f,
                "Successfully connected to: {name}. Spatial organization is now synced locally."
            ),
            Notice::CapabilityUnsupported { capability } => {
                write!(f, "Your system doesn't support {capability} yet.")
            }
            Notice::DirectoryDenied { reason } => {
                write!(f, "Directory access was not granted: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_and_levels() {
        let failure = Notice::StorageFailure {
            action: StorageAction::Save,
            subject: "a.pdf".into(),
            message: "disk full".into(),
        };
        assert_eq!(failure.to_string(), "Could not save a.pdf: disk full");
        assert!(!failure.is_alert());

        let unsupported = Notice::CapabilityUnsupported {
            capability: "directory access".into(),
        };
        assert!(unsupported.is_alert());
        assert!(unsupported.to_string().contains("directory access"));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let notice = Notice::DirectoryConnected { name: "Papers".into() };
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["kind"], "directory_connected");
        assert_eq!(json["name"], "Papers");
    }
}
