//! Geographic eligibility for the Israeli market.
//!
//! Maps a free-text location to (eligible, region, normalized city). The city
//! table is a closed enumeration; unmatched cities are never guessed. A miss
//! is ineligible, with the normalized string kept for diagnostics.

/// Coarse region label used when nothing matches.
pub const REGION_DEFAULT: &str = "other";

/// City → region table. Extend as needed per target market.
const CITY_TO_REGION: &[(&str, &str)] = &[
    ("tel aviv", "center"),
    ("tel-aviv", "center"),
    ("tel aviv-yafo", "center"),
    ("ramat gan", "center"),
    ("givatayim", "center"),
    ("bnei brak", "center"),
    ("petah tikva", "center"),
    ("kfar saba", "center"),
    ("netanya", "center"),
    ("herzliya", "center"),
    ("hod hasharon", "center"),
    ("rishon lezion", "center"),
    ("holon", "center"),
    ("bat yam", "center"),
    ("hadera", "center"),
    ("raanana", "center"),
    ("ra'anana", "center"),
    ("ariel", "center"),
    ("lod", "center"),
    ("ramla", "center"),
    ("yavne", "center"),
    ("shoam", "center"),
    ("airport city", "center"),
    ("rehovot", "shfela"),
    ("modiin", "shfela"),
    ("modiin-maccabim-reut", "shfela"),
    ("jerusalem", "jerusalem"),
    ("haifa", "north"),
    ("kiryat ata", "north"),
    ("kiryat motzkin", "north"),
    ("kiryat yam", "north"),
    ("nahariya", "north"),
    ("zichron yaakov", "north"),
    ("yokneam", "north"),
    ("nazareth", "north"),
    ("afula", "north"),
    ("tiberias", "north"),
    ("metula", "north"),
    ("karmiel", "north"),
    ("ashdod", "south"),
    ("ashkelon", "south"),
    ("beer sheva", "south"),
    ("beersheba", "south"),
    ("eilat", "south"),
    ("sderot", "south"),
    ("ofakim", "south"),
    ("kiryat gat", "south"),
    ("kiryat malachi", "south"),
    ("israel", "center"),
];

/// Region assigned to remote roles.
const REMOTE_REGION: &str = "center";

/// Outcome of resolving a raw location string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoResolution {
    pub eligible: bool,
    pub region: String,
    pub city: Option<String>,
}

fn normalize(raw: Option<&str>) -> String {
    raw.unwrap_or_default().trim().to_lowercase()
}

fn lookup(city: &str) -> Option<&'static str> {
    CITY_TO_REGION
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, region)| *region)
}

/// Resolve a raw location to eligibility, region, and normalized city.
///
/// Empty input is ineligible (strict default-deny), "remote" anywhere in the
/// string is eligible with the remote region, and anything else must hit the
/// city table: first the whole string verbatim, then each comma-separated
/// segment, with hyphens collapsed to spaces on the retry. Country suffixes
/// like "Tel Aviv, Israel" resolve through the segment pass.
pub fn resolve(raw_location: Option<&str>) -> GeoResolution {
    let loc = normalize(raw_location);
    if loc.is_empty() {
        return GeoResolution {
            eligible: false,
            region: REGION_DEFAULT.to_string(),
            city: None,
        };
    }

    if loc.contains("remote") {
        return GeoResolution {
            eligible: true,
            region: REMOTE_REGION.to_string(),
            city: Some("remote".to_string()),
        };
    }

    if let Some(region) = lookup(&loc) {
        return GeoResolution {
            eligible: true,
            region: region.to_string(),
            city: Some(loc),
        };
    }

    for segment in loc.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let collapsed = segment
            .replace('-', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(region) = lookup(segment).or_else(|| lookup(&collapsed)) {
            return GeoResolution {
                eligible: true,
                region: region.to_string(),
                city: Some(segment.to_string()),
            };
        }
    }

    GeoResolution {
        eligible: false,
        region: REGION_DEFAULT.to_string(),
        city: Some(loc),
    }
}
