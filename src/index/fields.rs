//! Index field names the core relies on.

pub const IDDOC: &str = "IDDOC";
pub const IDDOC_OWNER: &str = "IDDOC_OWNER";
pub const IDDOC_PARENT: &str = "IDDOC_PARENT";
pub const IDDOC_TOPSTRUCT: &str = "IDDOC_TOPSTRUCT";
pub const PI: &str = "PI";
pub const PI_TOPSTRUCT: &str = "PI_TOPSTRUCT";
pub const DOCTYPE: &str = "DOCTYPE";
pub const DOCSTRCT: &str = "DOCSTRCT";
pub const DOCSTRCT_SUB: &str = "DOCSTRCT_SUB";
pub const DOCSTRCT_TOP: &str = "DOCSTRCT_TOP";
pub const DC: &str = "DC";
pub const LABEL: &str = "LABEL";
pub const TITLE: &str = "MD_TITLE";
pub const LOGID: &str = "LOGID";
pub const ORDER: &str = "ORDER";
pub const THUMBNAIL: &str = "THUMBNAIL";
pub const THUMBPAGENO: &str = "THUMBPAGENO";
pub const FILENAME: &str = "FILENAME";
pub const FULLTEXT: &str = "FULLTEXT";
pub const FULLTEXTAVAILABLE: &str = "FULLTEXTAVAILABLE";
pub const ISWORK: &str = "ISWORK";
pub const ISANCHOR: &str = "ISANCHOR";
pub const ACCESSCONDITION: &str = "ACCESSCONDITION";
pub const GROUPFIELD: &str = "GROUPFIELD";
pub const METADATATYPE: &str = "METADATATYPE";
pub const UGCTYPE: &str = "UGCTYPE";
pub const UGCTERMS: &str = "UGCTERMS";
pub const EVENTTYPE: &str = "EVENTTYPE";
pub const DATECREATED: &str = "DATECREATED";
pub const DEFAULT: &str = "DEFAULT";
pub const SUPERDEFAULT: &str = "SUPERDEFAULT";
pub const SUPERFULLTEXT: &str = "SUPERFULLTEXT";
pub const SUPERUGCTERMS: &str = "SUPERUGCTERMS";

pub const CALENDAR_YEAR: &str = "YEAR";
pub const CALENDAR_MONTH: &str = "YEARMONTH";
pub const CALENDAR_DAY: &str = "YEARMONTHDAY";
pub const CALENDAR_MONTHDAY: &str = "MONTHDAY";
pub const CENTURY: &str = "CENTURY";

/// Value of [`ACCESSCONDITION`] for records without restrictions.
pub const OPEN_ACCESS_VALUE: &str = "OPENACCESS";

/// Suffix of untokenized copies of metadata fields.
pub const SUFFIX_UNTOKENIZED: &str = "_UNTOKENIZED";

/// Whether `field` is one of the calendar fields.
pub fn is_calendar_field(field: &str) -> bool {
    matches!(
        field,
        CALENDAR_YEAR | CALENDAR_MONTH | CALENDAR_DAY | CALENDAR_MONTHDAY | CENTURY
    )
}
