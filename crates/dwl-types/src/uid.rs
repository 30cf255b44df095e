use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! uid_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a UID string. Leading and trailing whitespace is trimmed.
            pub fn new(uid: impl Into<String>) -> Self {
                let uid: String = uid.into();
                Self(uid.trim().to_string())
            }

            /// Wrap a UID string, rejecting empty values.
            pub fn parse(uid: &str) -> Result<Self, TypeError> {
                let uid = Self::new(uid);
                if uid.is_empty() {
                    return Err(TypeError::EmptyIdentifier($label));
                }
                Ok(uid)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(uid: &str) -> Self {
                Self::new(uid)
            }
        }

        impl From<String> for $name {
            fn from(uid: String) -> Self {
                Self::new(uid)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

uid_type!(
    /// Study Instance UID (0020,000D). Unique across the server.
    StudyUid,
    "StudyInstanceUID"
);
uid_type!(
    /// Series Instance UID (0020,000E). Unique within its study.
    SeriesUid,
    "SeriesInstanceUID"
);
uid_type!(
    /// SOP Instance UID (0008,0018). Unique within its series.
    SopUid,
    "SOPInstanceUID"
);

/// The full address of one instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceKey {
    pub study: StudyUid,
    pub series: SeriesUid,
    pub sop: SopUid,
}

impl InstanceKey {
    pub fn new(
        study: impl Into<StudyUid>,
        series: impl Into<SeriesUid>,
        sop: impl Into<SopUid>,
    ) -> Self {
        Self {
            study: study.into(),
            series: series.into(),
            sop: sop.into(),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.study, self.series, self.sop)
    }
}
