//! Tag and keyword constants for the attributes DWL reads directly.
//!
//! Tags use the DICOM JSON key form: eight upper-case hex digits, group then
//! element, without separators.

pub const SPECIFIC_CHARACTER_SET: &str = "00080005";
pub const SOP_CLASS_UID: &str = "00080016";
pub const SOP_INSTANCE_UID: &str = "00080018";
pub const STUDY_DATE: &str = "00080020";
pub const SERIES_DATE: &str = "00080021";
pub const SERIES_TIME: &str = "00080031";
pub const ACQUISITION_TIME: &str = "00080032";
pub const MODALITY: &str = "00080060";
pub const RETRIEVE_URL: &str = "00081190";
pub const SERIES_DESCRIPTION: &str = "0008103E";
pub const PROTOCOL_NAME: &str = "00181030";
pub const STUDY_INSTANCE_UID: &str = "0020000D";
pub const SERIES_INSTANCE_UID: &str = "0020000E";
pub const SERIES_NUMBER: &str = "00200011";
pub const INSTANCE_NUMBER: &str = "00200013";
pub const NUMBER_OF_SERIES_RELATED_INSTANCES: &str = "00201209";
pub const NUMBER_OF_FRAMES: &str = "00280008";
pub const PIXEL_DATA: &str = "7FE00010";

/// Keywords of the attributes DWL reads from naturalized records.
pub mod keywords {
    pub const SOP_CLASS_UID: &str = "SOPClassUID";
    pub const SOP_INSTANCE_UID: &str = "SOPInstanceUID";
    pub const STUDY_INSTANCE_UID: &str = "StudyInstanceUID";
    pub const SERIES_INSTANCE_UID: &str = "SeriesInstanceUID";
    pub const SERIES_DESCRIPTION: &str = "SeriesDescription";
    pub const SERIES_NUMBER: &str = "SeriesNumber";
    pub const SERIES_DATE: &str = "SeriesDate";
    pub const SERIES_TIME: &str = "SeriesTime";
    pub const ACQUISITION_TIME: &str = "AcquisitionTime";
    pub const MODALITY: &str = "Modality";
    pub const PROTOCOL_NAME: &str = "ProtocolName";
    pub const INSTANCE_NUMBER: &str = "InstanceNumber";
    pub const NUMBER_OF_FRAMES: &str = "NumberOfFrames";
    pub const NUMBER_OF_SERIES_RELATED_INSTANCES: &str = "NumberOfSeriesRelatedInstances";
}
