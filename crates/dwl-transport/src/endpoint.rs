/// URL builders for the DICOMweb resources DWL touches.
pub mod endpoints {
    use dwl_types::{SeriesUid, StudyUid};

    /// STOW-RS target and QIDO-RS study search.
    pub fn studies(root: &str) -> String {
        format!("{root}/studies")
    }

    /// `{root}/studies/{study}`
    pub fn study(root: &str, study: &StudyUid) -> String {
        format!("{root}/studies/{study}")
    }

    /// QIDO-RS series search scoped to one study.
    pub fn study_series(root: &str, study: &StudyUid) -> String {
        format!("{root}/studies/{study}/series")
    }

    /// `{root}/studies/{study}/series/{series}`
    pub fn series(root: &str, study: &StudyUid, series: &SeriesUid) -> String {
        format!("{root}/studies/{study}/series/{series}")
    }

    /// WADO-RS series metadata resource.
    pub fn series_metadata(root: &str, study: &StudyUid, series: &SeriesUid) -> String {
        format!("{root}/studies/{study}/series/{series}/metadata")
    }

    /// True when `uri` carries its own scheme.
    pub fn is_absolute(uri: &str) -> bool {
        uri.split_once("://")
            .map(|(scheme, _)| !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)))
            .unwrap_or(false)
    }

    /// Resolve a bulk data URI that arrived relative to its study.
    pub fn bulk_data(root: &str, study: &StudyUid, uri: &str) -> String {
        if is_absolute(uri) {
            uri.to_string()
        } else {
            format!("{}/{}", self::study(root, study), uri.trim_start_matches('/'))
        }
    }
}

pub mod media_types {
    pub const DICOM_JSON: &str = "application/dicom+json";
    pub const JSON: &str = "application/json";
    pub const OCTET_STREAM: &str = "application/octet-stream";
    /// Accept value for bulk data: any transfer syntax, multipart framed.
    pub const MULTIPART_OCTET_STREAM: &str =
        "multipart/related; type=\"application/octet-stream\"; transfer-syntax=*";
}

#[cfg(test)]
mod tests {
    use super::endpoints::*;
    use dwl_types::{SeriesUid, StudyUid};

    #[test]
    fn endpoint_paths() {
        let study = StudyUid::from("1.2");
        let series = SeriesUid::from("1.2.3");
        assert_eq!(studies("http://h/rs"), "http://h/rs/studies");
        assert_eq!(study_series("http://h/rs", &study), "http://h/rs/studies/1.2/series");
        assert_eq!(
            series_metadata("http://h/rs", &study, &series),
            "http://h/rs/studies/1.2/series/1.2.3/metadata"
        );
    }

    #[test]
    fn absolute_detection() {
        assert!(is_absolute("https://h/x"));
        assert!(is_absolute("dicomweb+http://h/x"));
        assert!(!is_absolute("series/1/bulk"));
        assert!(!is_absolute("://nope"));
    }

    #[test]
    fn relative_bulk_data_resolves_against_study() {
        let study = StudyUid::from("1.2");
        assert_eq!(bulk_data("http://h/rs", &study, "/bulk/7"), "http://h/rs/studies/1.2/bulk/7");
        assert_eq!(bulk_data("http://h/rs", &study, "http://o/bulk"), "http://o/bulk");
    }
}
