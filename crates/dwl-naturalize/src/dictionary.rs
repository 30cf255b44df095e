use std::collections::HashMap;
use std::sync::OnceLock;

/// One row of the tag dictionary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub tag: &'static str,
    pub keyword: &'static str,
    pub vr: &'static str,
}

macro_rules! dictionary {
    ($(($tag:literal, $keyword:literal, $vr:literal)),* $(,)?) => {
        &[$(DictionaryEntry { tag: $tag, keyword: $keyword, vr: $vr }),*]
    };
}

/// Attributes the loader and its consumers use. Anything else passes
/// through naturalization under its raw tag.
static ENTRIES: &[DictionaryEntry] = dictionary![
    ("00020010", "TransferSyntaxUID", "UI"),
    ("00080005", "SpecificCharacterSet", "CS"),
    ("00080008", "ImageType", "CS"),
    ("00080016", "SOPClassUID", "UI"),
    ("00080018", "SOPInstanceUID", "UI"),
    ("00080020", "StudyDate", "DA"),
    ("00080021", "SeriesDate", "DA"),
    ("00080022", "AcquisitionDate", "DA"),
    ("00080023", "ContentDate", "DA"),
    ("00080030", "StudyTime", "TM"),
    ("00080031", "SeriesTime", "TM"),
    ("00080032", "AcquisitionTime", "TM"),
    ("00080033", "ContentTime", "TM"),
    ("00080050", "AccessionNumber", "SH"),
    ("00080056", "InstanceAvailability", "CS"),
    ("00080060", "Modality", "CS"),
    ("00080061", "ModalitiesInStudy", "CS"),
    ("00080070", "Manufacturer", "LO"),
    ("00080090", "ReferringPhysicianName", "PN"),
    ("00081030", "StudyDescription", "LO"),
    ("0008103E", "SeriesDescription", "LO"),
    ("00081115", "ReferencedSeriesSequence", "SQ"),
    ("00081140", "ReferencedImageSequence", "SQ"),
    ("00081150", "ReferencedSOPClassUID", "UI"),
    ("00081155", "ReferencedSOPInstanceUID", "UI"),
    ("00081160", "ReferencedFrameNumber", "IS"),
    ("00081190", "RetrieveURL", "UR"),
    ("00100010", "PatientName", "PN"),
    ("00100020", "PatientID", "LO"),
    ("00100030", "PatientBirthDate", "DA"),
    ("00100040", "PatientSex", "CS"),
    ("00101010", "PatientAge", "AS"),
    ("00180015", "BodyPartExamined", "CS"),
    ("00180050", "SliceThickness", "DS"),
    ("00180088", "SpacingBetweenSlices", "DS"),
    ("00181030", "ProtocolName", "LO"),
    ("0020000D", "StudyInstanceUID", "UI"),
    ("0020000E", "SeriesInstanceUID", "UI"),
    ("00200010", "StudyID", "SH"),
    ("00200011", "SeriesNumber", "IS"),
    ("00200013", "InstanceNumber", "IS"),
    ("00200032", "ImagePositionPatient", "DS"),
    ("00200037", "ImageOrientationPatient", "DS"),
    ("00200052", "FrameOfReferenceUID", "UI"),
    ("00201041", "SliceLocation", "DS"),
    ("00201206", "NumberOfStudyRelatedSeries", "IS"),
    ("00201208", "NumberOfStudyRelatedInstances", "IS"),
    ("00201209", "NumberOfSeriesRelatedInstances", "IS"),
    ("00280002", "SamplesPerPixel", "US"),
    ("00280004", "PhotometricInterpretation", "CS"),
    ("00280008", "NumberOfFrames", "IS"),
    ("00280009", "FrameIncrementPointer", "AT"),
    ("00280010", "Rows", "US"),
    ("00280011", "Columns", "US"),
    ("00280030", "PixelSpacing", "DS"),
    ("00280100", "BitsAllocated", "US"),
    ("00280101", "BitsStored", "US"),
    ("00280102", "HighBit", "US"),
    ("00280103", "PixelRepresentation", "US"),
    ("00281050", "WindowCenter", "DS"),
    ("00281051", "WindowWidth", "DS"),
    ("00281052", "RescaleIntercept", "DS"),
    ("00281053", "RescaleSlope", "DS"),
    ("00281054", "RescaleType", "LO"),
    ("00281101", "RedPaletteColorLookupTableDescriptor", "US"),
    ("00281201", "RedPaletteColorLookupTableData", "OW"),
    ("00281202", "GreenPaletteColorLookupTableData", "OW"),
    ("00281203", "BluePaletteColorLookupTableData", "OW"),
    ("00420011", "EncapsulatedDocument", "OB"),
    ("00420012", "MIMETypeOfEncapsulatedDocument", "LO"),
    ("00540081", "NumberOfSlices", "US"),
    ("00880200", "IconImageSequence", "SQ"),
    ("52009229", "SharedFunctionalGroupsSequence", "SQ"),
    ("52009230", "PerFrameFunctionalGroupsSequence", "SQ"),
    ("60003000", "OverlayData", "OW"),
    ("7FE00010", "PixelData", "OW"),
];

struct Index {
    by_tag: HashMap<&'static str, &'static DictionaryEntry>,
    by_keyword: HashMap<&'static str, &'static DictionaryEntry>,
}

fn index() -> &'static Index {
    static INDEX: OnceLock<Index> = OnceLock::new();
    INDEX.get_or_init(|| Index {
        by_tag: ENTRIES.iter().map(|e| (e.tag, e)).collect(),
        by_keyword: ENTRIES.iter().map(|e| (e.keyword, e)).collect(),
    })
}

fn lookup_tag(tag: &str) -> Option<&'static DictionaryEntry> {
    let index = index();
    index
        .by_tag
        .get(tag)
        .or_else(|| index.by_tag.get(tag.to_ascii_uppercase().as_str()))
        .copied()
}

/// Keyword for a tag. Tag lookup is case-insensitive.
pub fn keyword_for(tag: &str) -> Option<&'static str> {
    lookup_tag(tag).map(|e| e.keyword)
}

/// Tag for a keyword, if the dictionary knows it.
pub fn tag_for(keyword: &str) -> Option<&'static str> {
    index().by_keyword.get(keyword).map(|e| e.tag)
}

/// Value representation registered for a tag.
pub fn vr_for(tag: &str) -> Option<&'static str> {
    lookup_tag(tag).map(|e| e.vr)
}
