//! Speaker headshot lookup.
//!
//! Maps speaker names (and common variations) to a headshot slug. The full
//! URL is `{assets_base_url}/headshots/{slug}-square.webp`. Lookup order:
//! exact match, case-insensitive match, then substring match restricted to
//! long keys so short honorifics never match inside unrelated names.

use std::collections::HashMap;
use std::sync::LazyLock;

// ═══════════════════════════════════════════════════════════
// Name → slug table
// ═══════════════════════════════════════════════════════════

const HEADSHOT_SLUGS: &[(&str, &str)] = &[
    // First Presidency
    ("Russell M. Nelson", "russell-nelson"),
    ("President Russell M. Nelson", "russell-nelson"),
    ("President Nelson", "russell-nelson"),
    ("Dallin H. Oaks", "dallin-oaks"),
    ("President Dallin H. Oaks", "dallin-oaks"),
    ("President Oaks", "dallin-oaks"),
    ("Henry B. Eyring", "henry-eyring"),
    ("President Henry B. Eyring", "henry-eyring"),
    ("President Eyring", "henry-eyring"),
    // Quorum of the Twelve Apostles
    ("Jeffrey R. Holland", "jeffrey-holland"),
    ("Elder Jeffrey R. Holland", "jeffrey-holland"),
    ("Elder Holland", "jeffrey-holland"),
    ("Dieter F. Uchtdorf", "dieter-uchtdorf"),
    ("Elder Dieter F. Uchtdorf", "dieter-uchtdorf"),
    ("Elder Uchtdorf", "dieter-uchtdorf"),
    ("David A. Bednar", "david-bednar"),
    ("Elder David A. Bednar", "david-bednar"),
    ("Elder Bednar", "david-bednar"),
    ("Quentin L. Cook", "quentin-cook"),
    ("Elder Quentin L. Cook", "quentin-cook"),
    ("Elder Cook", "quentin-cook"),
    ("D. Todd Christofferson", "todd-christofferson"),
    ("Elder D. Todd Christofferson", "todd-christofferson"),
    ("Elder Christofferson", "todd-christofferson"),
    ("Neil L. Andersen", "neil-andersen"),
    ("Elder Neil L. Andersen", "neil-andersen"),
    ("Elder Andersen", "neil-andersen"),
    ("Ronald A. Rasband", "ronald-rasband"),
    ("Elder Ronald A. Rasband", "ronald-rasband"),
    ("Elder Rasband", "ronald-rasband"),
    ("Gary E. Stevenson", "gary-stevenson"),
    ("Elder Gary E. Stevenson", "gary-stevenson"),
    ("Elder Stevenson", "gary-stevenson"),
    ("Dale G. Renlund", "dale-renlund"),
    ("Elder Dale G. Renlund", "dale-renlund"),
    ("Elder Renlund", "dale-renlund"),
    ("Gerrit W. Gong", "gerrit-gong"),
    ("Elder Gerrit W. Gong", "gerrit-gong"),
    ("Elder Gong", "gerrit-gong"),
    ("Ulisses Soares", "ulisses-soares"),
    ("Elder Ulisses Soares", "ulisses-soares"),
    ("Elder Soares", "ulisses-soares"),
    ("Patrick Kearon", "patrick-kearon"),
    ("Elder Patrick Kearon", "patrick-kearon"),
    ("Elder Kearon", "patrick-kearon"),
    // Past Church Presidents (commonly quoted)
    ("Gordon B. Hinckley", "gordon-hinckley"),
    ("President Gordon B. Hinckley", "gordon-hinckley"),
    ("President Hinckley", "gordon-hinckley"),
    ("Thomas S. Monson", "thomas-monson"),
    ("President Thomas S. Monson", "thomas-monson"),
    ("President Monson", "thomas-monson"),
    ("Howard W. Hunter", "howard-hunter"),
    ("President Howard W. Hunter", "howard-hunter"),
    ("President Hunter", "howard-hunter"),
    ("Ezra Taft Benson", "ezra-benson"),
    ("President Ezra Taft Benson", "ezra-benson"),
    ("President Benson", "ezra-benson"),
    ("Spencer W. Kimball", "spencer-kimball"),
    ("President Spencer W. Kimball", "spencer-kimball"),
    ("President Kimball", "spencer-kimball"),
    ("Joseph Smith", "joseph-smith"),
    ("Prophet Joseph Smith", "joseph-smith"),
    ("Joseph Smith Jr.", "joseph-smith"),
    // Relief Society General Presidents
    ("Camille N. Johnson", "camille-johnson"),
    ("Sister Camille N. Johnson", "camille-johnson"),
    ("Jean B. Bingham", "jean-bingham"),
    ("Sister Jean B. Bingham", "jean-bingham"),
    // Young Women General Presidents
    ("Emily Belle Freeman", "emily-freeman"),
    ("Sister Emily Belle Freeman", "emily-freeman"),
    // Primary General Presidents
    ("Susan H. Porter", "susan-porter"),
    ("Sister Susan H. Porter", "susan-porter"),
    // Presiding Bishopric
    ("Gerald Causse", "gerald-causse"),
    ("Bishop Gerald Causse", "gerald-causse"),
    ("W. Christopher Waddell", "christopher-waddell"),
    ("Bishop W. Christopher Waddell", "christopher-waddell"),
    ("L. Todd Budge", "todd-budge"),
    ("Bishop L. Todd Budge", "todd-budge"),
];

static EXACT: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| HEADSHOT_SLUGS.iter().copied().collect());

// ═══════════════════════════════════════════════════════════
// Lookup
// ═══════════════════════════════════════════════════════════

/// Resolve a speaker name to a headshot URL, or None when unknown.
pub fn lookup_headshot(assets_base_url: &str, name: &str) -> Option<String> {
    let name = name.trim();

    if let Some(slug) = EXACT.get(name) {
        return Some(headshot_url(assets_base_url, slug));
    }

    let name_lower = name.to_lowercase();
    for (key, slug) in HEADSHOT_SLUGS {
        if key.to_lowercase() == name_lower {
            return Some(headshot_url(assets_base_url, slug));
        }
    }

    // Contains matching only for long keys; "Elder Cook" inside an unrelated
    // phrase must not resolve.
    for (key, slug) in HEADSHOT_SLUGS {
        if key.len() > 15 && name_lower.contains(&key.to_lowercase()) {
            return Some(headshot_url(assets_base_url, slug));
        }
    }

    None
}

/// Whether a model-supplied headshot URL is usable as-is. It must come from
/// the assets host and be free of characters that could break out of an
/// attribute value.
pub fn is_valid_headshot_url(url: &str, allowed_prefix: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    if !url.starts_with(allowed_prefix) {
        return false;
    }
    if !url.ends_with(".webp") {
        return false;
    }
    !url.contains([' ', '\t', '\r', '\n', '"', '\'', '<', '>'])
}

fn headshot_url(assets_base_url: &str, slug: &str) -> String {
    format!("{assets_base_url}/headshots/{slug}-square.webp")
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
