//! Source code -> organization display name

use crate::PublishError;

/// Organization names as the catalog displays them, keyed by `sources[0].name`
pub const SOURCE_NAMES: &[(&str, &str)] = &[
    ("uscensus", "US Census"),
    ("ctsde", "Connecticut State Department of Education"),
    ("ctdph", "Connecticut Department of Public Health"),
    ("ctopm", "Connecticut Office of Policy and Management"),
    ("samhsa", "Substance Abuse and Mental Health Services Administration"),
    ("ctdmhas", "Connecituct Department of Mental Health and Addiction Services"),
    ("municipalities", "Municipalities"),
    ("ctdss", "Connecticut Department of Social Services"),
    ("ctdol", "Connecticut Department of Labor"),
    ("ctdecd", "Connecticut Department of Economic and Community Development"),
    ("ctdcf", "Connecticut Department of Children and Families"),
    ("ctocme", "Connecticut Office of the Chief Medical Examiner"),
    ("ctoec", "Connecticut Office of Early Childhood"),
    ("ctdespp", "Connecticut Department of Emergency Services and Public Protections"),
    ("seda", "Stanford Education Data Archive"),
    ("ctlib", "Connecticut State Library"),
    ("cthfa", "Connecticut Housing Finance Authority"),
    ("ctdot", "Connecticut Department of Transportation"),
    ("ctdoh", "Connecticut Department of Housing"),
];

/// Look up the display name for a source code
pub fn lookup_source(code: &str) -> Result<&'static str, PublishError> {
    SOURCE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .ok_or_else(|| PublishError::UnknownSource(code.to_string()))
}
