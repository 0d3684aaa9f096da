//! Legacy weapon identifiers.
//!
//! The first paint-kit generation keyed weapons by numeric item-definition
//! index rather than by name. This table maps those indexes back to weapon
//! names so both vintages resolve the same way.
use std::borrow::Cow;

/// Weapon name for a legacy item-definition index.
pub fn legacy_weapon_name(defindex: u32) -> Option<&'static str> {
    let name = match defindex {
        7 => "flamethrower",
        8 => "grenadelauncher",
        9 => "knife",
        10 => "medigun",
        11 => "minigun",
        12 => "pistol",
        13 => "revolver",
        14 => "rocketlauncher",
        15 => "scattergun",
        16 => "shotgun",
        17 => "smg",
        18 => "sniperrifle",
        19 => "stickybomb_launcher",
        20 => "ubersaw",
        21 => "wrench",
        22 => "amputator",
        23 => "atom_launcher",
        24 => "back_scratcher",
        25 => "battleaxe",
        26 => "bazaar_sniper",
        27 => "blackbox",
        28 => "claidheamohmor",
        29 => "crusaders_crossbow",
        30 => "degreaser",
        31 => "demo_cannon",
        32 => "demo_sultan_sword",
        33 => "detonator",
        34 => "gatling_gun",
        35 => "holymackerel",
        36 => "jag",
        37 => "lochnload",
        38 => "powerjack",
        39 => "quadball",
        40 => "reserve_shooter",
        41 => "riding_crop",
        42 => "russian_riot",
        43 => "scimitar",
        44 => "scorch_shot",
        45 => "shortstop",
        46 => "soda_popper",
        47 => "tele_shotgun",
        48 => "tomislav",
        49 => "trenchgun",
        50 => "winger_pistol",
        _ => return None,
    };
    Some(name)
}

/// Translates a numeric legacy item index to its weapon name; any other
/// index passes through unchanged.
pub fn translate_item_index(index: &str) -> &str {
    index
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(legacy_weapon_name)
        .unwrap_or(index)
}

/// Removes the first `~<digits>` variant marker from an item id.
pub fn strip_variant_suffix(id: &str) -> Cow<'_, str> {
    let bytes = id.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'~' {
            let digits = bytes[i + 1..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            if digits > 0 {
                let mut out = String::with_capacity(id.len() - 1 - digits);
                out.push_str(&id[..i]);
                out.push_str(&id[i + 1 + digits..]);
                return Cow::Owned(out);
            }
        }
        i += 1;
    }
    Cow::Borrowed(id)
}
